// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
use std::f32::consts::TAU;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use ember_core::init_tracing;
use ember_render::{
    DrawPass, DrawableObject, FrameController, GeometryBuffer, GpuDevice, Scene, Vertex,
};
use ember_render_vk::{create_draw_pipeline, VulkanDevice};
use glam::{Vec2, Vec3};
use tracing::{error, info};

use ember_platform::winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};
use ember_platform::WinitSurface;

mod config;

use config::{load_cfg, AppCfg, PresentModeCfg};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path of the TOML config file
    #[arg(long, default_value = "ember.toml")]
    config: PathBuf,
    /// Override the configured present mode
    #[arg(long, value_enum)]
    present_mode: Option<PresentModeCfg>,
    /// Exit after this many presented frames
    #[arg(long)]
    frames: Option<u64>,
}

const TRIANGLE: [Vertex; 3] = [
    Vertex::new([0.0, -0.5], [1.0, 0.0, 0.0]),
    Vertex::new([0.5, 0.5], [0.0, 1.0, 0.0]),
    Vertex::new([-0.5, 0.5], [0.0, 0.0, 1.0]),
];

type Frames = FrameController<VulkanDevice, WinitSurface>;

// Fields drop in declaration order: scene objects and the pass before the
// frame controller, all of them before the device, the window last.
struct Session {
    objects: Vec<DrawableObject<VulkanDevice>>,
    draw_pass: DrawPass<VulkanDevice>,
    frames: Frames,
    device: Arc<VulkanDevice>,
    window: Arc<Window>,
}

impl Session {
    fn new(window: Arc<Window>, cfg: &AppCfg) -> Result<Self> {
        let device = Arc::new(
            VulkanDevice::new(window.as_ref(), window.as_ref()).context("Vulkan init")?,
        );
        let frames = FrameController::new(
            Arc::clone(&device),
            WinitSurface::new(Arc::clone(&window)),
            cfg.frame_controller_config(),
        )?;

        let pipeline = create_draw_pipeline(&device, frames.render_pass())?;
        let draw_pass =
            DrawPass::new(Arc::clone(&device), pipeline).with_rotation_step(cfg.render.rotation_step);

        let mut scene = Scene::new();
        let triangle = Arc::new(GeometryBuffer::new(Arc::clone(&device), &TRIANGLE)?);
        let mut object = scene.create_object(triangle);
        object.color = Vec3::new(0.1, 0.8, 0.1);
        object.transform.translation.x = 0.2;
        object.transform.scale = Vec2::new(2.0, 0.5);
        object.transform.rotation = 0.25 * TAU;

        let target = frames.render_target_description();
        info!(
            "render target: {:?} + {:?}, {}x{}, {} images",
            target.color_format,
            target.depth_format,
            target.extent.width,
            target.extent.height,
            target.image_count
        );

        Ok(Session {
            objects: vec![object],
            draw_pass,
            frames,
            device,
            window,
        })
    }

    /// Returns whether a frame was presented; `false` when it was skipped
    /// for a surface rebuild.
    fn draw(&mut self) -> Result<bool> {
        let Some(mut frame) = self.frames.begin_frame()? else {
            return Ok(false);
        };
        self.frames.begin_render_pass(&mut frame)?;
        self.draw_pass.execute(&mut frame, &mut self.objects)?;
        self.frames.end_render_pass(&mut frame)?;
        self.frames.end_frame(frame)?;
        Ok(true)
    }
}

struct App {
    cfg: AppCfg,
    frame_limit: Option<u64>,
    session: Option<Session>,
    failure: Option<anyhow::Error>,

    exiting: bool,
    paused: bool,
    presented: u64,
    frames: u32,
    last_fps_instant: Instant,
}

impl App {
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.exiting = true;
        if let Some(session) = self.session.take() {
            // Idle before anything is destroyed.
            if let Err(e) = session.device.wait_idle() {
                error!("wait_idle at shutdown: {e}");
            }
            drop(session);
            info!("renderer torn down after {} frames", self.presented);
        }
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{err:#}");
        self.failure = Some(err);
        self.shutdown(event_loop);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_none() && !self.exiting {
            let attrs = Window::default_attributes()
                .with_title(self.cfg.window.title.clone())
                .with_inner_size(PhysicalSize::new(
                    self.cfg.window.width,
                    self.cfg.window.height,
                ));
            let window = match event_loop.create_window(attrs) {
                Ok(w) => Arc::new(w),
                Err(e) => return self.fail(event_loop, anyhow::anyhow!("create_window: {e}")),
            };

            match Session::new(window, &self.cfg) {
                Ok(session) => self.session = Some(session),
                Err(e) => return self.fail(event_loop, e.context("renderer init")),
            }
        }

        let size = self
            .session
            .as_ref()
            .map(|s| s.window.inner_size())
            .unwrap_or_default();
        self.paused = size.width == 0 || size.height == 0;
        info!("resumed → paused={}", self.paused);

        if let Some(s) = &self.session {
            s.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(session) = &mut self.session else {
            return;
        };
        if window_id != session.window.id() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("CloseRequested");
                self.shutdown(event_loop);
            }

            WindowEvent::Resized(new_size) => {
                let now_paused = new_size.width == 0 || new_size.height == 0;
                if self.paused != now_paused {
                    self.paused = now_paused;
                    info!(
                        "Resized → {}x{} (paused={})",
                        new_size.width, new_size.height, self.paused
                    );
                }
                if !self.paused {
                    session.frames.window_mut().mark_resized();
                    session.window.request_redraw();
                }
            }

            WindowEvent::Occluded(occluded) => {
                let size = session.window.inner_size();
                self.paused = occluded || size.width == 0 || size.height == 0;
                info!("Occluded={} → paused={}", occluded, self.paused);
            }

            WindowEvent::RedrawRequested => {
                if self.exiting || self.paused {
                    return;
                }
                match session.draw() {
                    Ok(true) => {
                        // count only frames that were actually presented
                        self.frames = self.frames.saturating_add(1);
                        self.presented += 1;
                        if self.frame_limit.is_some_and(|n| self.presented >= n) {
                            info!("frame limit reached");
                            self.shutdown(event_loop);
                        }
                    }
                    Ok(false) => {}
                    Err(e) => self.fail(event_loop, e.context("render")),
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exiting {
            return;
        }

        if self.paused {
            // zero-size or occluded → sleep until the window system wakes us
            event_loop.set_control_flow(ControlFlow::Wait);
            self.frames = 0;
            return;
        }

        // The present mode paces the loop.
        event_loop.set_control_flow(ControlFlow::Poll);
        if let Some(s) = &self.session {
            s.window.request_redraw();
        }

        let now = Instant::now();
        if now.duration_since(self.last_fps_instant).as_secs_f32() >= 1.0 {
            info!("fps ~ {}", self.frames);
            self.frames = 0;
            self.last_fps_instant = now;
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut cfg = load_cfg(&args.config);
    if let Some(mode) = args.present_mode {
        cfg.render.present_mode = mode;
    }
    info!("config: {:?}", cfg);

    let event_loop: EventLoop<()> = EventLoop::new()?;
    let mut app = App {
        cfg,
        frame_limit: args.frames,
        session: None,
        failure: None,
        exiting: false,
        paused: false,
        presented: 0,
        frames: 0,
        last_fps_instant: Instant::now(),
    };

    event_loop.run_app(&mut app)?;
    match app.failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
