use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{Key as LogicalKey, KeyCode, PhysicalKey};

use super::controller::Key;

/// Adapter that bridges Winit keyboard events to app keys
///
/// Only presses are reported; key repeat counts as a press like a held key
/// on the original keyboard handler.
#[derive(Debug, Clone, Default)]
pub struct WinitKeys;

impl WinitKeys {
    pub fn new() -> Self {
        Self
    }

    /// Translate a window event into an app key press, if it is one
    pub fn process_event(&self, event: &WindowEvent) -> Option<Key> {
        match event {
            WindowEvent::KeyboardInput { event, .. } => Self::key_event(event),
            _ => None,
        }
    }

    fn key_event(event: &KeyEvent) -> Option<Key> {
        if event.state != ElementState::Pressed {
            return None;
        }
        // Letters and digits follow the keyboard layout, the rest the key position
        if let LogicalKey::Character(text) = &event.logical_key {
            return Self::text_to_key(text);
        }
        match event.physical_key {
            PhysicalKey::Code(code) => Self::keycode_to_key(code),
            PhysicalKey::Unidentified(_) => None,
        }
    }

    /// Map the typed character to Key
    pub fn text_to_key(text: &str) -> Option<Key> {
        let mut chars = text.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            return None;
        };

        match c.to_ascii_lowercase() {
            'r' => Some(Key::Record),
            'b' => Some(Key::BufferMode),
            'c' => Some(Key::Clear),
            ' ' => Some(Key::Space),
            d @ '0'..='9' => Key::digit(d as u8 - b'0'),
            _ => None,
        }
    }

    /// Map Winit KeyCode to Key
    pub fn keycode_to_key(keycode: KeyCode) -> Option<Key> {
        match keycode {
            KeyCode::KeyR => Some(Key::Record),
            KeyCode::KeyB => Some(Key::BufferMode),
            KeyCode::KeyC => Some(Key::Clear),
            KeyCode::ArrowRight => Some(Key::ArrowRight),
            KeyCode::ArrowLeft => Some(Key::ArrowLeft),
            KeyCode::ArrowUp => Some(Key::ArrowUp),
            KeyCode::ArrowDown => Some(Key::ArrowDown),
            KeyCode::Space => Some(Key::Space),
            KeyCode::Escape => Some(Key::Escape),
            KeyCode::Digit0 | KeyCode::Numpad0 => Key::digit(0),
            KeyCode::Digit1 | KeyCode::Numpad1 => Key::digit(1),
            KeyCode::Digit2 | KeyCode::Numpad2 => Key::digit(2),
            KeyCode::Digit3 | KeyCode::Numpad3 => Key::digit(3),
            KeyCode::Digit4 | KeyCode::Numpad4 => Key::digit(4),
            KeyCode::Digit5 | KeyCode::Numpad5 => Key::digit(5),
            KeyCode::Digit6 | KeyCode::Numpad6 => Key::digit(6),
            KeyCode::Digit7 | KeyCode::Numpad7 => Key::digit(7),
            KeyCode::Digit8 | KeyCode::Numpad8 => Key::digit(8),
            KeyCode::Digit9 | KeyCode::Numpad9 => Key::digit(9),
            _ => None,
        }
    }
}
