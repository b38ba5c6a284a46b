//! Ring-buffer allocation of per-draw uniform data.
//!
//! Every draw needs its own copy of the vertex- and pixel-stage constant
//! blocks. Instead of one buffer per draw, the renderer suballocates from a
//! single large uniform buffer and binds each block with a dynamic offset.
//! The buffer is partitioned into one fixed sub-range per frame slot: a frame
//! bump-allocates only inside its own slot's range, and the frame pacer
//! guarantees the GPU has finished with a slot before a new frame begins
//! recording into it. A frame that outgrows its slot's budget fails the
//! allocation instead of wrapping onto constants it wrote earlier the same
//! frame.

use crate::gpu::GpuContext;

/// wgpu's required alignment for dynamic uniform offsets.
pub const UNIFORM_ALIGN: u64 = 256;

/// Pure offset arithmetic for a slot-partitioned bump allocator.
///
/// Knows nothing about GPUs; the renderer pairs it with a real buffer and
/// tests drive it directly.
#[derive(Clone, Copy, Debug)]
pub struct RingCursor {
    slot_capacity: u64,
    slots: u64,
    base: u64,
    head: u64,
}

impl RingCursor {
    /// Creates a cursor with `slots` sub-ranges of `slot_capacity` bytes
    /// each. The per-slot capacity is rounded up to the alignment so every
    /// slot base lands on a valid offset.
    pub fn new(slot_capacity: u64, slots: usize) -> Self {
        Self {
            slot_capacity: align_up(slot_capacity),
            slots: slots.max(1) as u64,
            base: 0,
            head: 0,
        }
    }

    /// Per-slot budget in bytes.
    pub fn slot_capacity(&self) -> u64 {
        self.slot_capacity
    }

    /// Size of the whole backing region.
    pub fn total_capacity(&self) -> u64 {
        self.slot_capacity * self.slots
    }

    /// Rewinds to the start of `slot`'s sub-range. Called once per frame,
    /// after the pacer has waited out the slot's previous submission.
    pub fn begin_frame(&mut self, slot: usize) {
        debug_assert!((slot as u64) < self.slots, "slot out of range");
        self.base = (slot as u64 % self.slots) * self.slot_capacity;
        self.head = 0;
    }

    /// Reserves `size` bytes in the current slot and returns the aligned
    /// offset into the backing region.
    ///
    /// Returns `None` when the frame's budget is spent; handing back an
    /// already-used offset would alias constants still referenced by this
    /// frame's earlier draws.
    pub fn allocate(&mut self, size: u64) -> Option<u64> {
        let size = align_up(size);
        if self.head + size > self.slot_capacity {
            return None;
        }
        let offset = self.base + self.head;
        self.head += size;
        Some(offset)
    }
}

fn align_up(value: u64) -> u64 {
    value.div_ceil(UNIFORM_ALIGN) * UNIFORM_ALIGN
}

/// A GPU uniform buffer fronted by a [`RingCursor`].
pub struct UniformRing {
    buffer: wgpu::Buffer,
    cursor: RingCursor,
}

impl UniformRing {
    /// Creates a ring with `slots` per-frame sub-ranges of `slot_capacity`
    /// bytes each.
    pub fn new(gpu: &GpuContext, slot_capacity: u64, slots: usize, label: &str) -> Self {
        let cursor = RingCursor::new(slot_capacity, slots);
        let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: cursor.total_capacity(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self { buffer, cursor }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Starts a new frame in `slot`'s sub-range.
    pub fn begin_frame(&mut self, slot: usize) {
        self.cursor.begin_frame(slot);
    }

    /// Copies `data` into the next free region of the current slot and
    /// returns the dynamic offset to bind it with.
    pub fn push(&mut self, gpu: &GpuContext, data: &[u8]) -> Option<u32> {
        let offset = self.cursor.allocate(data.len() as u64)?;
        gpu.queue.write_buffer(&self.buffer, offset, data);
        Some(offset as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_aligned_and_sequential() {
        let mut cursor = RingCursor::new(4096, 2);
        cursor.begin_frame(0);
        assert_eq!(cursor.allocate(100), Some(0));
        assert_eq!(cursor.allocate(256), Some(256));
        assert_eq!(cursor.allocate(1), Some(512));
    }

    #[test]
    fn slots_partition_the_buffer() {
        let mut cursor = RingCursor::new(1024, 2);
        assert_eq!(cursor.total_capacity(), 2048);

        cursor.begin_frame(0);
        assert_eq!(cursor.allocate(256), Some(0));
        cursor.begin_frame(1);
        assert_eq!(cursor.allocate(256), Some(1024));
        // Slot 0 comes around again and reuses its own range only.
        cursor.begin_frame(0);
        assert_eq!(cursor.allocate(256), Some(0));
    }

    #[test]
    fn over_budget_frame_fails_instead_of_aliasing() {
        let mut cursor = RingCursor::new(1024, 2);
        cursor.begin_frame(0);
        assert_eq!(cursor.allocate(512), Some(0));
        assert_eq!(cursor.allocate(256), Some(512));
        // 512 more bytes exceed the slot budget; the allocation must fail
        // rather than hand offset 0 back mid-frame.
        assert_eq!(cursor.allocate(512), None);
        // The failed request must not move the cursor.
        assert_eq!(cursor.allocate(256), Some(768));
    }

    #[test]
    fn oversized_request_is_refused() {
        let mut cursor = RingCursor::new(1024, 2);
        cursor.begin_frame(0);
        assert_eq!(cursor.allocate(2048), None);
        assert_eq!(cursor.allocate(128), Some(0));
    }

    #[test]
    fn slot_capacity_rounds_up_to_alignment() {
        let cursor = RingCursor::new(1000, 2);
        assert_eq!(cursor.slot_capacity(), 1024);
        assert_eq!(cursor.total_capacity(), 2048);
    }
}
