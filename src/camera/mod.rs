//! Camera backends behind one capture interface
//!
//! A source is polled once per render tick. `update` reports whether this
//! tick is a capture tick; the app then reads `latest` and decides whether to
//! keep the frame. Grabbing itself may happen on a backend thread, but frames
//! only reach app state through `update` on the main thread.

pub mod pattern;
pub mod picam;
pub mod webcam;

use std::fs;
use std::sync::mpsc::{Receiver, TryRecvError};

use anyhow::Result;

use crate::config::{CameraKind, Config};
use crate::core::Frame;

pub use pattern::TestPatternSource;
pub use picam::{PiCameraSettings, PiCameraSource};
pub use webcam::{WebcamSettings, WebcamSource};

/// Capture collaborator polled by the main loop
pub trait CameraSource {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// True once the source has delivered a frame
    fn is_ready(&self) -> bool;

    /// Poll the backend; returns true when this tick should capture
    fn update(&mut self, delta: f32) -> bool;

    /// Most recent frame, for live preview and capture
    fn latest(&self) -> Option<&Frame>;

    /// Capture rate in frames per second
    fn frame_rate(&self) -> f32;

    /// Restart the backend with its camera-specific settings
    fn reinitialize(&mut self) -> Result<()>;

    /// Whether reinitializing also resets the capture scale to 1
    fn resets_scale(&self) -> bool {
        false
    }
}

/// Receiving end of a grabber thread, keeping only the newest frame
#[derive(Debug)]
pub struct LatestFrame {
    receiver: Receiver<Frame>,
    frame: Option<Frame>,
    disconnected: bool,
}

impl LatestFrame {
    pub fn new(receiver: Receiver<Frame>) -> Self {
        Self {
            receiver,
            frame: None,
            disconnected: false,
        }
    }

    /// Drain pending frames; returns true if at least one arrived
    pub fn poll(&mut self) -> bool {
        let mut fresh = false;
        loop {
            match self.receiver.try_recv() {
                Ok(frame) => {
                    self.frame = Some(frame);
                    fresh = true;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        log::warn!("Camera grabber stopped delivering frames");
                        self.disconnected = true;
                    }
                    break;
                }
            }
        }
        fresh
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    /// Swap in a new grabber, keeping the last frame on screen
    pub fn replace(&mut self, receiver: Receiver<Frame>) {
        self.receiver = receiver;
        self.disconnected = false;
    }
}

/// True when running on a Raspberry Pi
pub fn is_raspberry_pi() -> bool {
    fs::read_to_string("/proc/device-tree/model")
        .map(|model| model.contains("Raspberry Pi"))
        .unwrap_or(false)
}

/// Resolve `Auto` to a concrete backend
pub fn resolve_kind(kind: CameraKind) -> CameraKind {
    match kind {
        CameraKind::Auto if is_raspberry_pi() => CameraKind::Picam,
        CameraKind::Auto => CameraKind::Webcam,
        other => other,
    }
}

/// Open the configured camera backend
pub fn open_source(config: &Config, kind: CameraKind) -> Result<Box<dyn CameraSource>> {
    let source: Box<dyn CameraSource> = match resolve_kind(kind) {
        CameraKind::Picam => Box::new(PiCameraSource::open(config.picam.clone())?),
        CameraKind::TestPattern => Box::new(TestPatternSource::new(
            config.width,
            config.height,
            config.frame_rate,
        )),
        CameraKind::Webcam | CameraKind::Auto => {
            Box::new(WebcamSource::open(WebcamSettings::from_config(config))?)
        }
    };

    log::info!(
        "Camera source: {} at {:.1} fps",
        source.name(),
        source.frame_rate()
    );
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PixelFormat;
    use std::sync::mpsc;

    #[test]
    fn test_latest_frame_keeps_newest() {
        let (tx, rx) = mpsc::channel();
        let mut latest = LatestFrame::new(rx);
        assert!(!latest.poll());
        assert!(latest.frame().is_none());

        tx.send(Frame::filled(1, 1, PixelFormat::Gray8, 1)).unwrap();
        tx.send(Frame::filled(1, 1, PixelFormat::Gray8, 2)).unwrap();
        assert!(latest.poll());
        assert_eq!(latest.frame().unwrap().pixels(), &[2]);

        // Nothing new, previous frame stays
        assert!(!latest.poll());
        assert_eq!(latest.frame().unwrap().pixels(), &[2]);
    }

    #[test]
    fn test_latest_frame_survives_disconnect() {
        let (tx, rx) = mpsc::channel();
        let mut latest = LatestFrame::new(rx);
        tx.send(Frame::filled(1, 1, PixelFormat::Gray8, 5)).unwrap();
        drop(tx);

        assert!(latest.poll());
        assert!(!latest.poll());
        assert_eq!(latest.frame().unwrap().pixels(), &[5]);
    }

    #[test]
    fn test_explicit_kinds_resolve_to_themselves() {
        assert_eq!(resolve_kind(CameraKind::Webcam), CameraKind::Webcam);
        assert_eq!(resolve_kind(CameraKind::Picam), CameraKind::Picam);
        assert_eq!(resolve_kind(CameraKind::TestPattern), CameraKind::TestPattern);
        assert_ne!(resolve_kind(CameraKind::Auto), CameraKind::Auto);
    }

    #[test]
    fn test_open_test_pattern() {
        let config = Config {
            width: 32,
            height: 24,
            ..Config::default()
        };
        let source = open_source(&config, CameraKind::TestPattern).unwrap();
        assert_eq!(source.name(), "test-pattern");
        assert_eq!(source.frame_rate(), 25.0);
    }
}
