//! CPU/GPU frame pacing.
//!
//! The renderer keeps a small number of frames in flight: the CPU may record
//! frame N while the GPU still executes frame N-1. Per-frame resources (the
//! uniform ring regions, command allocator state) are recycled slot by slot,
//! so before reusing slot `N % FRAMES_IN_FLIGHT` the CPU must wait for the
//! submission that last used that slot.
//!
//! [`FramePacer`] owns that bookkeeping and is generic over a [`GpuFence`] so
//! the wait discipline is testable without a device: production code plugs in
//! [`DeviceFence`] (wgpu submission indices), tests plug in a mock.

use crate::gpu::GpuContext;

/// Number of frames the CPU may record ahead of the GPU.
pub const FRAMES_IN_FLIGHT: usize = 2;

/// A waitable completion token source.
///
/// `Token` identifies one submission; [`wait`](Self::wait) blocks until that
/// submission has fully executed.
pub trait GpuFence {
    type Token;

    fn wait(&mut self, token: &Self::Token);
}

/// [`GpuFence`] over a wgpu device, using submission indices as tokens.
pub struct DeviceFence<'a> {
    device: &'a wgpu::Device,
}

impl<'a> DeviceFence<'a> {
    pub fn new(gpu: &'a GpuContext) -> Self {
        Self {
            device: &gpu.device,
        }
    }
}

impl GpuFence for DeviceFence<'_> {
    type Token = wgpu::SubmissionIndex;

    fn wait(&mut self, token: &Self::Token) {
        let poll = wgpu::PollType::Wait {
            submission_index: Some(token.clone()),
            timeout: None,
        };
        if let Err(err) = self.device.poll(poll) {
            log::warn!("frame fence wait failed: {err}");
        }
    }
}

/// Slot-cycling frame pacer.
///
/// Frame N uses slot `N % slots`. [`begin_frame`](Self::begin_frame) waits
/// for the token previously parked in the frame's slot (a no-op for the
/// first `slots` frames), [`end_frame`](Self::end_frame) parks the new
/// submission's token there and advances. [`drain`](Self::drain) waits out
/// every outstanding token for shutdown.
pub struct FramePacer<T> {
    pending: Vec<Option<T>>,
    frame_index: u64,
}

impl<T> FramePacer<T> {
    pub fn new(slots: usize) -> Self {
        assert!(slots > 0, "pacer needs at least one slot");
        Self {
            pending: (0..slots).map(|_| None).collect(),
            frame_index: 0,
        }
    }

    /// Monotonic count of frames begun.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// The slot the current frame records into.
    pub fn current_slot(&self) -> usize {
        (self.frame_index % self.pending.len() as u64) as usize
    }

    /// Blocks until the current frame's slot is free, then returns it.
    ///
    /// Resources tagged with the returned slot may be overwritten after this
    /// call and not before.
    pub fn begin_frame<F: GpuFence<Token = T>>(&mut self, fence: &mut F) -> usize {
        let slot = self.current_slot();
        if let Some(token) = self.pending[slot].take() {
            fence.wait(&token);
        }
        slot
    }

    /// Records the submission that closed this frame and advances to the
    /// next. The token is waited on when its slot next comes around.
    pub fn end_frame(&mut self, token: T) {
        let slot = self.current_slot();
        debug_assert!(self.pending[slot].is_none(), "end_frame without begin_frame");
        self.pending[slot] = Some(token);
        self.frame_index += 1;
    }

    /// Waits out every in-flight frame. Call before tearing down resources
    /// the GPU may still read.
    pub fn drain<F: GpuFence<Token = T>>(&mut self, fence: &mut F) {
        for slot in &mut self.pending {
            if let Some(token) = slot.take() {
                fence.wait(&token);
            }
        }
    }
}

impl<T> Default for FramePacer<T> {
    fn default() -> Self {
        Self::new(FRAMES_IN_FLIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every wait; tokens are frame numbers.
    #[derive(Default)]
    struct MockFence {
        waited: Vec<u64>,
    }

    impl GpuFence for MockFence {
        type Token = u64;

        fn wait(&mut self, token: &u64) {
            self.waited.push(*token);
        }
    }

    #[test]
    fn slots_cycle_modulo_frame_count() {
        let mut pacer: FramePacer<u64> = FramePacer::new(2);
        let mut fence = MockFence::default();

        for frame in 0..6u64 {
            let slot = pacer.begin_frame(&mut fence);
            assert_eq!(slot, (frame % 2) as usize);
            pacer.end_frame(frame);
        }
        assert_eq!(pacer.frame_index(), 6);
    }

    #[test]
    fn first_frames_do_not_wait() {
        let mut pacer: FramePacer<u64> = FramePacer::new(2);
        let mut fence = MockFence::default();

        pacer.begin_frame(&mut fence);
        pacer.end_frame(0);
        pacer.begin_frame(&mut fence);
        pacer.end_frame(1);
        assert!(fence.waited.is_empty(), "no prior submission to wait for");

        // Frame 2 reuses slot 0 and must wait for frame 0's token.
        pacer.begin_frame(&mut fence);
        assert_eq!(fence.waited, vec![0]);
    }

    #[test]
    fn every_token_is_waited_exactly_once() {
        let mut pacer: FramePacer<u64> = FramePacer::new(2);
        let mut fence = MockFence::default();

        for frame in 0..5u64 {
            pacer.begin_frame(&mut fence);
            pacer.end_frame(frame);
        }
        pacer.drain(&mut fence);

        let mut waited = fence.waited.clone();
        waited.sort_unstable();
        assert_eq!(waited, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn drain_is_idempotent() {
        let mut pacer: FramePacer<u64> = FramePacer::new(2);
        let mut fence = MockFence::default();

        pacer.begin_frame(&mut fence);
        pacer.end_frame(0);
        pacer.drain(&mut fence);
        pacer.drain(&mut fence);
        assert_eq!(fence.waited, vec![0]);
    }

    #[test]
    fn waits_target_the_reused_slot_only() {
        let mut pacer: FramePacer<u64> = FramePacer::new(3);
        let mut fence = MockFence::default();

        for frame in 0..4u64 {
            pacer.begin_frame(&mut fence);
            pacer.end_frame(frame);
        }
        // Only frame 3 wrapped onto slot 0, so only token 0 was waited.
        assert_eq!(fence.waited, vec![0]);
    }
}
