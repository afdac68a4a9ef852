use crate::renderer::ExperimentRenderer;
use anyhow::{Context, Result};
use pixels::{Pixels, SurfaceTexture};
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use tiny_skia::Pixmap;
use tracing::{error, info, warn};
use twostep_core::{Generator, TrialRecord};
use twostep_experiment::{
    FinishReason, InputEvent, Key, Layout, TaskConfig, TaskStatus, TwoStepTask,
};
use twostep_timing::{HighPrecisionTimer, Timer};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

/// Translates a keyboard event into task input
pub fn map_key(key: PhysicalKey, state: ElementState, repeat: bool) -> Option<InputEvent> {
    if key == PhysicalKey::Code(KeyCode::Escape) {
        return state.is_pressed().then_some(InputEvent::Quit);
    }
    if repeat {
        return None;
    }
    let key = match key {
        PhysicalKey::Code(KeyCode::ArrowLeft) => Key::Left,
        PhysicalKey::Code(KeyCode::ArrowRight) => Key::Right,
        _ => Key::Other,
    };
    Some(match state {
        ElementState::Pressed => InputEvent::KeyDown(key),
        ElementState::Released => InputEvent::KeyUp(key),
    })
}

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    canvas: Option<Pixmap>,
    renderer: ExperimentRenderer,
    task: TwoStepTask<Generator, StdRng>,
    timer: HighPrecisionTimer,
    fullscreen: bool,
    failure: Option<anyhow::Error>,
}

impl App {
    pub fn new(
        config: TaskConfig,
        generator: Generator,
        rng: StdRng,
        renderer: ExperimentRenderer,
        fullscreen: bool,
    ) -> Self {
        let assets = renderer.assets();
        let layout = Layout::new(640.0, 400.0, assets.reference_width());
        let task = TwoStepTask::new(config, generator, rng, layout, |key| assets.card_size(key));
        Self {
            window: None,
            pixels: None,
            canvas: None,
            renderer,
            task,
            timer: HighPrecisionTimer::new(),
            fullscreen,
            failure: None,
        }
    }

    /// History collected so far and the display failure that stopped the
    /// session, if any
    pub fn into_parts(self) -> (Vec<TrialRecord>, Option<anyhow::Error>) {
        (self.task.into_history(), self.failure)
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let mut attributes = Window::default_attributes()
            .with_title("Two-Step Task")
            .with_inner_size(LogicalSize::new(640.0, 400.0))
            .with_resizable(false);
        if self.fullscreen {
            let monitor = event_loop
                .primary_monitor()
                .or_else(|| event_loop.available_monitors().next())
                .context("no monitor available")?;
            attributes = attributes.with_fullscreen(Some(Fullscreen::Borderless(Some(monitor))));
        }

        let window = Arc::new(event_loop.create_window(attributes)?);
        let size = window.inner_size();
        info!(
            width = size.width,
            height = size.height,
            scale_factor = window.scale_factor(),
            "display configured"
        );

        let surface_texture = SurfaceTexture::new(size.width, size.height, window.clone());
        self.pixels = Some(Pixels::new(size.width, size.height, surface_texture)?);
        self.resize_canvas(size)?;

        window.set_cursor_visible(false);
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn resize_canvas(&mut self, size: PhysicalSize<u32>) -> Result<()> {
        let canvas = Pixmap::new(size.width.max(1), size.height.max(1))
            .context("cannot allocate canvas")?;
        self.task.set_layout(Layout::new(
            canvas.width() as f32,
            canvas.height() as f32,
            self.renderer.assets().reference_width(),
        ));
        self.canvas = Some(canvas);
        Ok(())
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>) {
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(size.width, size.height) {
                warn!("failed to resize surface: {e}");
            }
            if let Err(e) = pixels.resize_buffer(size.width, size.height) {
                warn!("failed to resize buffer: {e}");
            }
        }
        if let Err(e) = self.resize_canvas(size) {
            warn!("{e:#}");
        }
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(canvas)) = (&mut self.pixels, &mut self.canvas) else {
            return Ok(());
        };
        self.renderer.render_frame(canvas, &self.task.screen());
        let frame = pixels.frame_mut();
        if frame.len() == canvas.data().len() {
            frame.copy_from_slice(canvas.data());
        }
        pixels.render()?;
        Ok(())
    }

    fn on_status(&mut self, status: TaskStatus, event_loop: &ActiveEventLoop) {
        if let TaskStatus::Finished(reason) = status {
            self.shutdown(reason, event_loop);
        }
    }

    fn shutdown(&mut self, reason: FinishReason, event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }
        let stats = self.timer.frame_stats();
        info!(
            ?reason,
            frames = self.timer.frame_count(),
            "avg_frame_ms" = stats.average_frame_time_ns / 1_000_000.0,
            "jitter_ms" = stats.jitter_ns / 1_000_000.0,
            "session over"
        );
        event_loop.exit();
    }

    fn fail(&mut self, e: anyhow::Error, event_loop: &ActiveEventLoop) {
        error!("{e:#}");
        self.failure = Some(e);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                self.fail(e.context("cannot create window"), event_loop);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                let status = self.task.step(self.timer.now(), Some(InputEvent::Quit));
                self.on_status(status, event_loop);
            }
            WindowEvent::RedrawRequested => {
                let frame_start = self.timer.now();
                let status = self.task.step(frame_start, None);
                if let Err(e) = self.render() {
                    self.fail(e, event_loop);
                    return;
                }
                self.timer.record_frame(self.timer.elapsed(frame_start));
                if let TaskStatus::Finished(_) = status {
                    self.on_status(status, event_loop);
                    return;
                }
                self.timer.pace(frame_start, FRAME_INTERVAL);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let Some(input) = map_key(event.physical_key, event.state, event.repeat) {
                    let status = self.task.step(self.timer.now(), Some(input));
                    self.on_status(status, event_loop);
                }
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            _ => {}
        }
    }
}
