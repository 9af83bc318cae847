use super::frame::Frame;
use super::frame_buffer::FrameBuffer;

/// Playback direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn sign(&self) -> f32 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }
}

/// Maximum playback magnitude reachable from the digit keys
pub const MAX_SPEED: f32 = 2.0;

/// Key code of '1', which maps to speed zero
const DIGIT_LOW: f32 = 49.0;
/// Key code of '9', which maps to full speed
const DIGIT_HIGH: f32 = 57.0;

/// Linear remap of `value` from [in_min, in_max] onto [out_min, out_max], unclamped
pub fn map_range(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    if (in_max - in_min).abs() < f32::EPSILON {
        return out_min;
    }
    out_min + (value - in_min) * (out_max - out_min) / (in_max - in_min)
}

/// Fractional playback cursor with a signed step
///
/// The step is held as a direction and a non-negative magnitude so either can
/// change without losing the other, even at zero speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scrubber {
    position: f32,
    direction: Direction,
    magnitude: f32,
}

impl Scrubber {
    pub fn new() -> Self {
        Self {
            position: 0.0,
            direction: Direction::Forward,
            magnitude: 1.0,
        }
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Signed step applied each render tick
    pub fn speed(&self) -> f32 {
        self.direction.sign() * self.magnitude
    }

    /// Replace the signed step
    pub fn set_speed(&mut self, value: f32) {
        self.direction = if value < 0.0 {
            Direction::Backward
        } else {
            Direction::Forward
        };
        self.magnitude = value.abs();
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Map a digit key code onto [0, MAX_SPEED], keeping the current sign
    ///
    /// '1' is zero and '9' is full speed. '0' falls below the range and is
    /// clamped to zero.
    pub fn set_speed_from_digit(&mut self, key_code: u8) {
        let magnitude = map_range(key_code as f32, DIGIT_LOW, DIGIT_HIGH, 0.0, MAX_SPEED);
        self.magnitude = magnitude.max(0.0);
    }

    /// Move by `step` and snap to the opposite end when leaving [0, len)
    pub fn advance(&mut self, step: f32, len: usize) {
        self.position += step;

        if self.position.floor() < 0.0 {
            self.position = len as f32 - 1.0;
        }
        if self.position.floor() >= len as f32 {
            self.position = 0.0;
        }
    }

    /// Advance by the current speed
    pub fn tick(&mut self, len: usize) {
        self.advance(self.speed(), len);
    }

    /// Index the cursor refers to in a buffer of `len` frames
    ///
    /// A cursor left out of range by a shrinking buffer resolves with the same
    /// snap rule as `advance`.
    pub fn resolve(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }

        let index = self.position.floor();
        if index < 0.0 {
            Some(len - 1)
        } else if index >= len as f32 {
            Some(0)
        } else {
            Some(index as usize)
        }
    }

    /// Frame at the cursor, or None when there is nothing to display
    pub fn current<'a>(&self, buffer: &'a FrameBuffer) -> Option<&'a Frame> {
        self.resolve(buffer.len()).and_then(|i| buffer.get(i))
    }
}

impl Default for Scrubber {
    fn default() -> Self {
        Self::new()
    }
}
