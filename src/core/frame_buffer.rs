use std::collections::VecDeque;

use super::frame::Frame;

/// Capacity derived from a duration bound and a capture rate, never below one
///
/// Eviction starts once the length reaches `max_seconds * frame_rate`, so a
/// fractional product keeps the next whole frame.
pub fn capacity_for(max_seconds: f32, frame_rate: f32) -> usize {
    let frames = (max_seconds * frame_rate).ceil();
    if frames.is_finite() && frames >= 1.0 {
        frames as usize
    } else {
        1
    }
}

/// Capacity-bounded FIFO of captured frames, oldest first
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    frames: VecDeque<Frame>,
    capacity: usize,
}

impl FrameBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Buffer sized for `max_seconds` of capture at `frame_rate`
    pub fn with_duration(max_seconds: f32, frame_rate: f32) -> Self {
        Self::new(capacity_for(max_seconds, frame_rate))
    }

    /// Append at the back, evicting from the front while at capacity
    pub fn append(&mut self, frame: Frame) {
        while self.frames.len() >= self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
    }

    /// Change the bound. Existing frames are kept until the next append.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
    }

    /// Recompute the bound from a duration and the current capture rate
    pub fn set_duration(&mut self, max_seconds: f32, frame_rate: f32) {
        self.set_capacity(capacity_for(max_seconds, frame_rate));
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    /// Approximate sample bytes held
    pub fn byte_size(&self) -> usize {
        self.frames.iter().map(|f| f.pixels().len()).sum()
    }
}
