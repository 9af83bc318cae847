use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use futures::channel::mpsc::UnboundedReceiver;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use webcam_scrubber::app::{AppSettings, AppState, CaptureMode, KeyOutcome};
use webcam_scrubber::camera::{self, CameraSource};
use webcam_scrubber::cli::Cli;
use webcam_scrubber::config::{CameraKind, Config};
use webcam_scrubber::core::{compose, Clock, DisplayContext, FixedHz, SurfaceRenderer, WinitKeys};
use webcam_scrubber::diagnostics::MemoryLog;
use webcam_scrubber::recorder::{self, FfmpegRecorder, RecordingComplete};

// === Constants ===

const STATS_UPDATE_INTERVAL: f32 = 1.0;
const WINDOW_TITLE: &str = "Webcam Scrubber";

// === Application ===

struct App {
    display: DisplayContext,
    show_stats: bool,
    window: Option<Arc<Window>>,
    renderer: Option<SurfaceRenderer>,
    source: Box<dyn CameraSource>,
    state: AppState<FfmpegRecorder>,
    completions: UnboundedReceiver<RecordingComplete>,
    keys: WinitKeys,
    clock: Clock,
    memory_log: Option<MemoryLog>,
    stats_timer: FixedHz,
    frame_count: u32,
    fps: f32,
}

impl App {
    fn new(config: &Config) -> Result<Self> {
        let kind = camera::resolve_kind(config.camera);
        let source = camera::open_source(config, kind)?;

        let display = match kind {
            CameraKind::Picam => {
                DisplayContext::new(config.picam.sensor_width, config.picam.sensor_height)
            }
            _ => DisplayContext::new(config.width, config.height),
        };

        recorder::probe(&config.recorder);
        let (encoder, completions) = FfmpegRecorder::new(config.recorder.clone());

        let mode = if config.start_on_disk {
            CaptureMode::Disk
        } else {
            CaptureMode::Memory
        };
        let state = AppState::new(
            AppSettings {
                max_seconds: config.max_seconds,
                frame_rate: source.frame_rate(),
                mode,
            },
            encoder,
        );
        log::info!(
            "Buffer holds up to {} frames ({:?} mode)",
            state.buffer().capacity(),
            mode
        );

        Ok(Self {
            display,
            show_stats: config.show_stats,
            window: None,
            renderer: None,
            source,
            state,
            completions,
            keys: WinitKeys::new(),
            clock: Clock::new(),
            memory_log: config.memory_log_enabled(kind).then(MemoryLog::new),
            stats_timer: FixedHz::every(STATS_UPDATE_INTERVAL),
            frame_count: 0,
            fps: 0.0,
        })
    }

    fn update_stats(&mut self, delta: f32) {
        self.frame_count += 1;
        let interval = self.stats_timer.interval;
        if !self.stats_timer.tick(delta) {
            return;
        }
        self.fps = self.frame_count as f32 / interval;
        self.frame_count = 0;

        if !self.show_stats {
            return;
        }
        if let Some(window) = &self.window {
            window.set_title(&format!(
                "{} | {:.1} fps | {} frames | speed {:.2} | scale {:.2} | {:?}{}",
                WINDOW_TITLE,
                self.fps,
                self.state.buffer().len(),
                self.state.scrubber().speed(),
                self.state.resize(),
                self.state.mode(),
                if self.state.is_recording() { " | REC" } else { "" },
            ));
        }
    }

    fn drain_completions(&mut self) {
        while let Ok(Some(done)) = self.completions.try_next() {
            if done.success {
                log::info!("Saved {} ({} frames)", done.path.display(), done.frames);
            } else {
                log::warn!("Recording {} did not finish cleanly", done.path.display());
            }
        }
    }

    fn redraw(&mut self) {
        let delta = self.clock.tick();
        self.update_stats(delta);

        // Capture before render, so a frame kept this tick can play this tick
        self.state.capture_tick(self.source.as_mut(), delta);
        let recording = self.state.is_recording();
        let live = self.source.latest();
        let playback = self.state.render_tick();
        let canvas = compose(&self.display, live, playback, recording);

        if let Some(renderer) = &mut self.renderer {
            if let Err(e) = renderer.render(&canvas) {
                log::error!("Render error: {:#}", e);
            }
        }

        self.drain_completions();

        if let Some(memory_log) = &mut self.memory_log {
            memory_log.tick(
                delta,
                self.state.recording_elapsed(),
                self.state.buffer().byte_size(),
            );
        }
    }

    fn quit(&mut self, event_loop: &ActiveEventLoop) {
        self.state.shutdown();
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title(WINDOW_TITLE)
                .with_inner_size(PhysicalSize::new(self.display.width, self.display.height)),
        ) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let renderer = match pollster::block_on(SurfaceRenderer::new(window.clone(), self.display)) {
            Ok(renderer) => renderer,
            Err(e) => {
                log::error!("Failed to initialize renderer: {:#}", e);
                event_loop.exit();
                return;
            }
        };

        self.window = Some(window);
        self.renderer = Some(renderer);
        self.clock.reset();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(key) = self.keys.process_event(&event) {
            if self.state.handle_key(key, self.source.as_mut()) == KeyOutcome::Quit {
                event_loop.exit();
            }
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.quit(event_loop),
            WindowEvent::Resized(size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let deadline = self.clock.next_deadline(self.state.frame_rate());
        if Instant::now() >= deadline {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(deadline));
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::load(&cli)?;

    let event_loop = EventLoop::new()?;
    let mut app = App::new(&config)?;

    log::info!(
        "Controls: r record, b memory/disk, c clear, arrows direction/scale, 1-9 speed, space reinit camera, Escape quit"
    );
    event_loop.run_app(&mut app)?;

    Ok(())
}
