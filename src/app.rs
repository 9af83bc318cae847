//! Application state and the per-tick capture/render steps
//!
//! Everything the event loop mutates lives in [`AppState`]. Each render tick
//! calls [`AppState::capture_tick`] and then [`AppState::render_tick`], in
//! that order, on the main thread.

use std::path::PathBuf;

use crate::camera::CameraSource;
use crate::core::{Direction, Frame, FrameBuffer, Key, Scrubber};
use crate::recorder::Encoder;

pub const RESIZE_STEP: f32 = 0.25;
pub const MIN_RESIZE: f32 = 0.25;
pub const MAX_RESIZE: f32 = 1.0;

/// Where captured frames go while recording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Append to the in-memory frame buffer
    Memory,
    /// Stream to the video encoder
    Disk,
}

impl CaptureMode {
    pub fn toggled(self) -> Self {
        match self {
            CaptureMode::Memory => CaptureMode::Disk,
            CaptureMode::Disk => CaptureMode::Memory,
        }
    }
}

/// What the event loop should do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Quit,
}

/// Startup parameters for [`AppState`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppSettings {
    pub max_seconds: f32,
    pub frame_rate: f32,
    pub mode: CaptureMode,
}

/// Long-lived application state, passed by reference to the tick functions
pub struct AppState<E: Encoder> {
    buffer: FrameBuffer,
    scrubber: Scrubber,
    recording: bool,
    mode: CaptureMode,
    resize: f32,
    max_seconds: f32,
    frame_rate: f32,
    elapsed: f32,
    recording_since: f32,
    open_failed: bool,
    encoder: E,
}

impl<E: Encoder> AppState<E> {
    pub fn new(settings: AppSettings, encoder: E) -> Self {
        Self {
            buffer: FrameBuffer::with_duration(settings.max_seconds, settings.frame_rate),
            scrubber: Scrubber::new(),
            recording: false,
            mode: settings.mode,
            resize: MAX_RESIZE,
            max_seconds: settings.max_seconds,
            frame_rate: settings.frame_rate,
            elapsed: 0.0,
            recording_since: 0.0,
            open_failed: false,
            encoder,
        }
    }

    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    pub fn scrubber(&self) -> &Scrubber {
        &self.scrubber
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn resize(&self) -> f32 {
        self.resize
    }

    pub fn frame_rate(&self) -> f32 {
        self.frame_rate
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Seconds since recording was last toggled
    pub fn recording_elapsed(&self) -> f32 {
        self.elapsed - self.recording_since
    }

    /// Apply one key press
    pub fn handle_key(&mut self, key: Key, source: &mut dyn CameraSource) -> KeyOutcome {
        match key {
            Key::Record => self.toggle_recording(),
            Key::BufferMode => self.toggle_mode(),
            Key::Clear => {
                self.buffer.clear();
                log::info!("Frame buffer cleared");
            }
            Key::ArrowRight => self.scrubber.set_direction(Direction::Forward),
            Key::ArrowLeft => self.scrubber.set_direction(Direction::Backward),
            Key::ArrowUp => self.grow_resize(),
            Key::ArrowDown => self.shrink_resize(),
            Key::Digit(code) => {
                self.scrubber.set_speed_from_digit(code);
                log::debug!("Playback speed {:.2}", self.scrubber.speed());
            }
            Key::Space => self.reinitialize_camera(source),
            Key::Escape => {
                self.shutdown();
                return KeyOutcome::Quit;
            }
        }
        KeyOutcome::Continue
    }

    pub fn toggle_recording(&mut self) {
        self.recording = !self.recording;
        self.recording_since = self.elapsed;
        self.open_failed = false;
        log::info!(
            "Recording {} ({:?} mode)",
            if self.recording { "started" } else { "stopped" },
            self.mode
        );
        self.sync_encoder();
    }

    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
        self.open_failed = false;
        log::info!("Capture mode: {:?}", self.mode);
        self.sync_encoder();
    }

    pub fn grow_resize(&mut self) {
        self.resize = (self.resize + RESIZE_STEP).min(MAX_RESIZE);
        log::info!("Resizing to: {}", self.resize);
    }

    pub fn shrink_resize(&mut self) {
        self.resize = (self.resize - RESIZE_STEP).max(MIN_RESIZE);
        log::info!("Resizing to: {}", self.resize);
    }

    /// Change the capture rate; the buffer bound follows it
    pub fn set_frame_rate(&mut self, frame_rate: f32) {
        self.frame_rate = frame_rate;
        self.buffer.set_duration(self.max_seconds, frame_rate);
    }

    fn reinitialize_camera(&mut self, source: &mut dyn CameraSource) {
        match source.reinitialize() {
            Ok(()) => {
                self.set_frame_rate(source.frame_rate());
                if source.resets_scale() {
                    self.resize = MAX_RESIZE;
                }
                log::info!("Camera {} reinitialized at {} fps", source.name(), self.frame_rate);
            }
            Err(e) => log::warn!("Camera reinitialization failed: {:#}", e),
        }
    }

    /// The encoder is open only while recording to disk
    fn sync_encoder(&mut self) {
        let should_write = self.recording && self.mode == CaptureMode::Disk;
        if !should_write && self.encoder.is_open() {
            self.encoder.close();
        }
    }

    /// Capture step: poll the source and keep the frame if recording
    pub fn capture_tick(&mut self, source: &mut dyn CameraSource, delta: f32) {
        self.elapsed += delta;

        if !source.update(delta) || !self.recording {
            return;
        }
        let Some(frame) = source.latest() else {
            return;
        };

        let frame = frame.scaled(self.resize);
        match self.mode {
            CaptureMode::Memory => self.buffer.append(frame),
            CaptureMode::Disk => self.write_frame(&frame),
        }
    }

    fn write_frame(&mut self, frame: &Frame) {
        if !self.encoder.is_open() {
            if self.open_failed {
                return;
            }
            let path: PathBuf = self.encoder.next_path();
            let (width, height) = even_geometry(frame.dimensions());
            if let Err(e) = self.encoder.open(&path, width, height, self.frame_rate) {
                log::warn!("Could not start recording {}: {:#}", path.display(), e);
                self.open_failed = true;
                return;
            }
        }

        if let Err(e) = self.encoder.add_frame(frame) {
            log::warn!("Failed to encode frame: {:#}", e);
        }
    }

    /// Render step: advance the cursor and return the frame to display
    pub fn render_tick(&mut self) -> Option<&Frame> {
        self.scrubber.tick(self.buffer.len());
        self.scrubber.current(&self.buffer)
    }

    /// Stop recording and finish any open file
    pub fn shutdown(&mut self) {
        self.recording = false;
        self.sync_encoder();
    }
}

/// 4:2:0 video needs even dimensions; round down, never below 2
pub fn even_geometry((width, height): (u32, u32)) -> (u32, u32) {
    ((width & !1).max(2), (height & !1).max(2))
}
