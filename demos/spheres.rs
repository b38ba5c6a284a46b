//! Forward-rendered demo: three shapes in a row under the stock light rig.

use std::sync::Arc;
use std::time::Instant;

use aspis::{Camera, GpuContext, LightRig, Material, Mesh, PipelineId, Renderer, Scene, Vec2, Vec3};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

struct State {
    window: Arc<Window>,
    gpu: GpuContext,
    renderer: Renderer,
    scene: Scene,
    camera: Camera,
    started: Instant,
    last_frame: Instant,
}

impl State {
    fn new(event_loop: &ActiveEventLoop) -> State {
        let window = Arc::new(
            event_loop
                .create_window(Window::default_attributes().with_title("aspis — spheres"))
                .expect("failed to create window"),
        );
        let gpu = GpuContext::new(window.clone());
        let renderer = Renderer::new(&gpu);

        let mut scene = Scene::new();
        let sphere = scene.add_mesh(Mesh::sphere(&gpu, 48, 24));
        let cube = scene.add_mesh(Mesh::cube(&gpu));
        let checker = scene.add_texture(aspis::Texture::checkerboard(&gpu, 256, 32));

        let plain = scene.add_material(Material::new(PipelineId::DEFAULT));
        let tiled = scene.add_material({
            let mut m = Material::new(PipelineId::DEFAULT)
                .with_uv_transform(Vec2::splat(2.0), Vec2::ZERO);
            m.add_texture(checker, 0);
            m
        });

        scene.spawn_at(sphere, tiled, Vec3::new(-2.5, 0.0, 0.0));
        scene.spawn(cube, tiled);
        scene.spawn_at(sphere, plain, Vec3::new(2.5, 0.0, 0.0));
        *scene.lights_mut() = LightRig::demo_rig();

        let camera = Camera::demo(gpu.aspect());
        let now = Instant::now();

        State {
            window,
            gpu,
            renderer,
            scene,
            camera,
            started: now,
            last_frame: now,
        }
    }

    fn update(&mut self) {
        let dt = self.last_frame.elapsed().as_secs_f32();
        self.last_frame = Instant::now();
        let t = self.started.elapsed().as_secs_f32();

        for (i, (_, entity)) in self.scene.entities_mut().enumerate() {
            let transform = entity.transform_mut();
            transform.rotate(Vec3::new(0.0, dt * 0.6, 0.0));
            let x = (i as f32 - 1.0) * 2.5;
            let y = (t + i as f32).sin() * 0.4;
            transform.set_position(Vec3::new(x, y, 0.0));
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
                state.renderer.wait_idle(&state.gpu);
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                state.gpu.resize(size.width, size.height);
                state.camera.update_projection_matrix(state.gpu.aspect());
            }
            WindowEvent::RedrawRequested => {
                state.update();
                if let Err(err) = state
                    .renderer
                    .render(&state.gpu, &mut state.scene, &state.camera)
                {
                    log::error!("render failed: {err}");
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
