use anyhow::Result;

use super::CameraSource;
use crate::core::{Frame, PixelFormat, Throttled};

/// Synthetic source: a vertical bar sweeping across a gradient
///
/// Runs without hardware, for headless sessions and tests. Frames are
/// produced on the same throttled schedule a hardware source would follow.
pub struct TestPatternSource {
    width: u32,
    height: u32,
    frame_rate: f32,
    throttle: Throttled,
    sequence: u64,
    latest: Option<Frame>,
}

impl TestPatternSource {
    pub fn new(width: u32, height: u32, frame_rate: f32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            frame_rate,
            throttle: Throttled::per_second(frame_rate),
            sequence: 0,
            latest: None,
        }
    }

    /// Number of frames generated so far
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Render pattern frame `n`
    pub fn render(width: u32, height: u32, n: u64) -> Frame {
        let (width, height) = (width.max(1), height.max(1));
        let bar_x = (n % width as u64) as u32;
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 3);

        for y in 0..height {
            for x in 0..width {
                if x == bar_x {
                    pixels.extend_from_slice(&[255, 255, 255]);
                } else {
                    let r = (x * 255 / (width - 1).max(1)) as u8;
                    let g = (y * 255 / (height - 1).max(1)) as u8;
                    let b = (n % 256) as u8;
                    pixels.extend_from_slice(&[r, g, b]);
                }
            }
        }

        Frame::new(width, height, PixelFormat::Rgb8, pixels)
            .unwrap_or_else(|| Frame::filled(width, height, PixelFormat::Rgb8, 0))
    }
}

impl CameraSource for TestPatternSource {
    fn name(&self) -> &str {
        "test-pattern"
    }

    fn is_ready(&self) -> bool {
        self.latest.is_some()
    }

    fn update(&mut self, delta: f32) -> bool {
        if !self.throttle.try_tick(delta) {
            return false;
        }

        self.latest = Some(Self::render(self.width, self.height, self.sequence));
        self.sequence += 1;
        true
    }

    fn latest(&self) -> Option<&Frame> {
        self.latest.as_ref()
    }

    fn frame_rate(&self) -> f32 {
        self.frame_rate
    }

    fn reinitialize(&mut self) -> Result<()> {
        self.sequence = 0;
        self.throttle = Throttled::per_second(self.frame_rate);
        Ok(())
    }
}
