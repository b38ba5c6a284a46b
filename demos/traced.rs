//! Ray-traced demo: the same entity layout rendered through the TLAS path.
//!
//! Requires an adapter exposing wgpu's experimental ray-tracing features.

use std::sync::Arc;
use std::time::Instant;

use aspis::{
    Camera, GpuContext, GpuOptions, Material, Mesh, PipelineId, RayTracer, Scene, Vec3,
};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

struct State {
    window: Arc<Window>,
    gpu: GpuContext,
    tracer: RayTracer,
    scene: Scene,
    camera: Camera,
    started: Instant,
}

impl State {
    fn new(event_loop: &ActiveEventLoop) -> State {
        let window = Arc::new(
            event_loop
                .create_window(Window::default_attributes().with_title("aspis — traced"))
                .expect("failed to create window"),
        );
        let gpu = GpuContext::with_options(
            window.clone(),
            GpuOptions {
                raytracing: true,
                ..Default::default()
            },
        );
        let tracer = RayTracer::new(&gpu).expect("adapter lacks ray-tracing support");

        let mut scene = Scene::new();
        let sphere = scene.add_mesh(Mesh::sphere(&gpu, 48, 24));
        let cube = scene.add_mesh(Mesh::cube(&gpu));

        let red = scene.add_material(
            Material::new(PipelineId::DEFAULT).with_color_tint(Vec3::new(0.9, 0.2, 0.2)),
        );
        let green = scene.add_material(
            Material::new(PipelineId::DEFAULT)
                .with_color_tint(Vec3::new(0.2, 0.8, 0.3))
                .with_roughness(0.4),
        );
        let blue = scene.add_material(
            Material::new(PipelineId::DEFAULT).with_color_tint(Vec3::new(0.25, 0.4, 0.95)),
        );

        scene.spawn_at(sphere, red, Vec3::new(-2.5, 0.0, 0.0));
        scene.spawn(cube, green);
        scene.spawn_at(sphere, blue, Vec3::new(2.5, 0.0, 0.0));

        let camera = Camera::demo(gpu.aspect());

        State {
            window,
            gpu,
            tracer,
            scene,
            camera,
            started: Instant::now(),
        }
    }

    fn update(&mut self) {
        let t = self.started.elapsed().as_secs_f32();
        for (i, (_, entity)) in self.scene.entities_mut().enumerate() {
            let phase = t * 0.5 + i as f32 * std::f32::consts::TAU / 3.0;
            let transform = entity.transform_mut();
            transform.set_position(Vec3::new(phase.cos() * 3.0, 0.0, phase.sin() * 3.0));
            transform.set_rotation(Vec3::new(0.0, t, 0.0));
        }
    }
}

#[derive(Default)]
struct App {
    state: Option<State>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_none() {
            self.state = Some(State::new(event_loop));
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                state.tracer.wait_idle(&state.gpu);
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                state.gpu.resize(size.width, size.height);
                state.camera.update_projection_matrix(state.gpu.aspect());
            }
            WindowEvent::RedrawRequested => {
                state.update();
                if let Err(err) = state
                    .tracer
                    .render(&state.gpu, &mut state.scene, &state.camera)
                {
                    log::error!("trace failed: {err}");
                    event_loop.exit();
                    return;
                }
                state.window.request_redraw();
            }
            _ => {}
        }
    }
}

fn main() {
    env_logger::init();
    let event_loop = EventLoop::new().expect("failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);
    event_loop
        .run_app(&mut App::default())
        .expect("event loop error");
}
