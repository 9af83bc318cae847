/// Key identifier for the actions the app responds to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Toggle recording
    Record,
    /// Toggle memory/disk capture
    BufferMode,
    /// Drop all buffered frames
    Clear,
    ArrowRight,
    ArrowLeft,
    ArrowUp,
    ArrowDown,
    /// Digit key, carrying its ASCII code ('0' is 48)
    Digit(u8),
    /// Re-initialize the camera
    Space,
    Escape,
}

impl Key {
    /// Digit key for a numeric value 0-9
    pub fn digit(value: u8) -> Option<Key> {
        (value <= 9).then(|| Key::Digit(b'0' + value))
    }
}
