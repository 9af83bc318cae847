use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use webcam_scrubber::app::{AppSettings, AppState, CaptureMode, KeyOutcome, MAX_RESIZE, MIN_RESIZE};
use webcam_scrubber::camera::CameraSource;
use webcam_scrubber::core::{Direction, Frame, Key, PixelFormat};
use webcam_scrubber::recorder::Encoder;

/// Source that captures on every tick and serves a fixed 8x8 frame
struct MockSource {
    frame: Frame,
    frame_rate: f32,
    reinit_rate: f32,
    resets_scale: bool,
    reinitialized: usize,
    fail_reinit: bool,
}

impl MockSource {
    fn new() -> Self {
        Self {
            frame: Frame::filled(8, 8, PixelFormat::Rgb8, 10),
            frame_rate: 10.0,
            reinit_rate: 10.0,
            resets_scale: false,
            reinitialized: 0,
            fail_reinit: false,
        }
    }
}

impl CameraSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn update(&mut self, _delta: f32) -> bool {
        true
    }

    fn latest(&self) -> Option<&Frame> {
        Some(&self.frame)
    }

    fn frame_rate(&self) -> f32 {
        self.frame_rate
    }

    fn reinitialize(&mut self) -> Result<()> {
        if self.fail_reinit {
            bail!("camera unplugged");
        }
        self.reinitialized += 1;
        self.frame_rate = self.reinit_rate;
        Ok(())
    }

    fn resets_scale(&self) -> bool {
        self.resets_scale
    }
}

/// Encoder that records what it was asked to do
#[derive(Default)]
struct MockEncoder {
    open: bool,
    fail_open: bool,
    fail_frames: bool,
    attempts: usize,
    opened: Vec<(u32, u32, f32)>,
    frames: usize,
    closed: usize,
}

impl Encoder for MockEncoder {
    fn open(&mut self, _path: &Path, width: u32, height: u32, frame_rate: f32) -> Result<()> {
        self.attempts += 1;
        if self.fail_open {
            bail!("no encoder");
        }
        self.open = true;
        self.opened.push((width, height, frame_rate));
        Ok(())
    }

    fn add_frame(&mut self, _frame: &Frame) -> Result<()> {
        if self.fail_frames {
            bail!("broken pipe");
        }
        self.frames += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
        self.closed += 1;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn next_path(&self) -> PathBuf {
        PathBuf::from("out/capture.mp4")
    }
}

fn app(mode: CaptureMode, max_seconds: f32) -> AppState<MockEncoder> {
    AppState::new(
        AppSettings {
            max_seconds,
            frame_rate: 10.0,
            mode,
        },
        MockEncoder::default(),
    )
}

// ============================================================================
// Memory mode
// ============================================================================

#[test]
fn test_nothing_is_buffered_until_recording() {
    let mut state = app(CaptureMode::Memory, 10.0);
    let mut source = MockSource::new();

    for _ in 0..5 {
        state.capture_tick(&mut source, 0.1);
    }
    assert!(state.buffer().is_empty());

    state.handle_key(Key::Record, &mut source);
    for _ in 0..5 {
        state.capture_tick(&mut source, 0.1);
    }
    assert_eq!(state.buffer().len(), 5);
}

#[test]
fn test_toggling_record_twice_leaves_buffer_unchanged() {
    let mut state = app(CaptureMode::Memory, 10.0);
    let mut source = MockSource::new();
    state.toggle_recording();
    state.capture_tick(&mut source, 0.1);

    state.handle_key(Key::Record, &mut source);
    state.handle_key(Key::Record, &mut source);
    assert_eq!(state.buffer().len(), 1);
}

#[test]
fn test_buffer_is_bounded_by_duration() {
    let mut state = app(CaptureMode::Memory, 0.5);
    let mut source = MockSource::new();
    state.toggle_recording();
    for _ in 0..10 {
        state.capture_tick(&mut source, 0.1);
    }
    assert_eq!(state.buffer().capacity(), 5);
    assert_eq!(state.buffer().len(), 5);
}

#[test]
fn test_clear_key_empties_buffer() {
    let mut state = app(CaptureMode::Memory, 10.0);
    let mut source = MockSource::new();
    state.toggle_recording();
    state.capture_tick(&mut source, 0.1);

    state.handle_key(Key::Clear, &mut source);
    assert!(state.buffer().is_empty());
    assert!(state.render_tick().is_none());
}

#[test]
fn test_playback_includes_frame_captured_this_tick() {
    let mut state = app(CaptureMode::Memory, 10.0);
    let mut source = MockSource::new();
    state.toggle_recording();

    state.capture_tick(&mut source, 0.1);
    assert!(state.render_tick().is_some());
}

// ============================================================================
// Disk mode
// ============================================================================

#[test]
fn test_disk_mode_never_touches_buffer() {
    let mut state = app(CaptureMode::Disk, 10.0);
    let mut source = MockSource::new();
    state.toggle_recording();
    for _ in 0..4 {
        state.capture_tick(&mut source, 0.1);
    }

    assert!(state.buffer().is_empty());
    assert_eq!(state.encoder().frames, 4);
    assert_eq!(state.encoder().opened, vec![(8, 8, 10.0)]);
}

#[test]
fn test_odd_frames_open_even_file() {
    let mut state = app(CaptureMode::Disk, 10.0);
    let mut source = MockSource::new();
    source.frame = Frame::filled(7, 5, PixelFormat::Rgb8, 10);
    state.toggle_recording();
    state.capture_tick(&mut source, 0.1);

    assert_eq!(state.encoder().opened, vec![(6, 4, 10.0)]);
    assert_eq!(state.encoder().frames, 1);
}

#[test]
fn test_encoder_open_only_while_recording_to_disk() {
    let mut state = app(CaptureMode::Memory, 10.0);
    let mut source = MockSource::new();

    let check = |state: &AppState<MockEncoder>| {
        if state.encoder().is_open() {
            assert!(state.is_recording() && state.mode() == CaptureMode::Disk);
        }
    };

    for key in [
        Key::BufferMode,
        Key::Record,
        Key::BufferMode,
        Key::BufferMode,
        Key::Record,
        Key::Record,
        Key::BufferMode,
    ] {
        state.handle_key(key, &mut source);
        check(&state);
        state.capture_tick(&mut source, 0.1);
        check(&state);
    }
}

#[test]
fn test_switching_to_memory_closes_file() {
    let mut state = app(CaptureMode::Disk, 10.0);
    let mut source = MockSource::new();
    state.toggle_recording();
    state.capture_tick(&mut source, 0.1);
    assert!(state.encoder().is_open());

    state.handle_key(Key::BufferMode, &mut source);
    assert!(!state.encoder().is_open());
    assert_eq!(state.encoder().closed, 1);

    state.capture_tick(&mut source, 0.1);
    assert_eq!(state.buffer().len(), 1);
}

#[test]
fn test_failed_open_is_not_retried_every_tick() {
    let mut source = MockSource::new();
    let mut failing = AppState::new(
        AppSettings {
            max_seconds: 10.0,
            frame_rate: 10.0,
            mode: CaptureMode::Disk,
        },
        MockEncoder {
            fail_open: true,
            ..MockEncoder::default()
        },
    );
    failing.toggle_recording();
    for _ in 0..3 {
        failing.capture_tick(&mut source, 0.1);
    }

    assert!(!failing.encoder().is_open());
    assert_eq!(failing.encoder().attempts, 1);
    assert_eq!(failing.encoder().frames, 0);
    assert!(failing.buffer().is_empty());
}

#[test]
fn test_write_failure_does_not_stop_recording() {
    let mut source = MockSource::new();
    let mut state = AppState::new(
        AppSettings {
            max_seconds: 10.0,
            frame_rate: 10.0,
            mode: CaptureMode::Disk,
        },
        MockEncoder {
            fail_frames: true,
            ..MockEncoder::default()
        },
    );
    state.toggle_recording();
    state.capture_tick(&mut source, 0.1);
    state.capture_tick(&mut source, 0.1);

    assert!(state.is_recording());
    assert!(state.encoder().is_open());
    assert_eq!(state.encoder().opened.len(), 1);
}

#[test]
fn test_escape_finishes_recording_and_quits() {
    let mut state = app(CaptureMode::Disk, 10.0);
    let mut source = MockSource::new();
    state.toggle_recording();
    state.capture_tick(&mut source, 0.1);

    assert_eq!(state.handle_key(Key::Escape, &mut source), KeyOutcome::Quit);
    assert!(!state.is_recording());
    assert!(!state.encoder().is_open());
}

// ============================================================================
// Playback, scale and camera keys
// ============================================================================

#[test]
fn test_arrow_keys_set_direction() {
    let mut state = app(CaptureMode::Memory, 10.0);
    let mut source = MockSource::new();

    state.handle_key(Key::ArrowLeft, &mut source);
    assert_eq!(state.scrubber().direction(), Direction::Backward);
    state.handle_key(Key::ArrowRight, &mut source);
    assert_eq!(state.scrubber().direction(), Direction::Forward);
}

#[test]
fn test_digit_key_sets_speed() {
    let mut state = app(CaptureMode::Memory, 10.0);
    let mut source = MockSource::new();
    state.handle_key(Key::ArrowLeft, &mut source);
    state.handle_key(Key::Digit(b'9'), &mut source);
    assert_eq!(state.scrubber().speed(), -2.0);
}

#[test]
fn test_resize_stays_in_bounds() {
    let mut state = app(CaptureMode::Memory, 10.0);
    let mut source = MockSource::new();

    for _ in 0..6 {
        state.handle_key(Key::ArrowDown, &mut source);
    }
    assert_eq!(state.resize(), MIN_RESIZE);

    for _ in 0..6 {
        state.handle_key(Key::ArrowUp, &mut source);
    }
    assert_eq!(state.resize(), MAX_RESIZE);
}

#[test]
fn test_quarter_scale_capture() {
    let mut state = app(CaptureMode::Memory, 10.0);
    let mut source = MockSource::new();
    for _ in 0..3 {
        state.handle_key(Key::ArrowDown, &mut source);
    }
    state.toggle_recording();
    state.capture_tick(&mut source, 0.1);
    assert_eq!(state.buffer().get(0).unwrap().dimensions(), (2, 2));
}

#[test]
fn test_space_reinitializes_and_rebounds_buffer() {
    let mut state = app(CaptureMode::Memory, 2.0);
    let mut source = MockSource::new();
    source.reinit_rate = 25.0;
    source.resets_scale = true;
    state.handle_key(Key::ArrowDown, &mut source);

    assert_eq!(state.handle_key(Key::Space, &mut source), KeyOutcome::Continue);
    assert_eq!(source.reinitialized, 1);
    assert_eq!(state.frame_rate(), 25.0);
    assert_eq!(state.buffer().capacity(), 50);
    assert_eq!(state.resize(), MAX_RESIZE);
}

#[test]
fn test_space_keeps_scale_for_webcam_like_sources() {
    let mut state = app(CaptureMode::Memory, 2.0);
    let mut source = MockSource::new();
    state.handle_key(Key::ArrowDown, &mut source);
    state.handle_key(Key::Space, &mut source);
    assert_eq!(state.resize(), 0.75);
}

#[test]
fn test_failed_reinit_keeps_state() {
    let mut state = app(CaptureMode::Memory, 2.0);
    let mut source = MockSource::new();
    source.fail_reinit = true;

    state.handle_key(Key::Space, &mut source);
    assert_eq!(state.frame_rate(), 10.0);
    assert_eq!(state.buffer().capacity(), 20);
}
