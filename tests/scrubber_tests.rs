use webcam_scrubber::core::{Direction, Frame, FrameBuffer, PixelFormat, Scrubber};

fn buffer_of(len: u8) -> FrameBuffer {
    let mut buffer = FrameBuffer::new(len as usize);
    for tag in 0..len {
        buffer.append(Frame::filled(1, 1, PixelFormat::Gray8, tag));
    }
    buffer
}

// ============================================================================
// Cursor movement
// ============================================================================

#[test]
fn test_forward_wraps_to_start() {
    let buffer = buffer_of(3);
    let mut scrubber = Scrubber::new();

    let mut seen = Vec::new();
    for _ in 0..4 {
        scrubber.tick(buffer.len());
        seen.push(scrubber.current(&buffer).unwrap().pixels()[0]);
    }
    assert_eq!(seen, vec![1, 2, 0, 1]);
}

#[test]
fn test_backward_wraps_to_end() {
    let buffer = buffer_of(3);
    let mut scrubber = Scrubber::new();
    scrubber.set_direction(Direction::Backward);

    scrubber.tick(buffer.len());
    assert_eq!(scrubber.position(), 2.0);
    scrubber.tick(buffer.len());
    assert_eq!(scrubber.current(&buffer).unwrap().pixels()[0], 1);
}

#[test]
fn test_fractional_speed_holds_frames() {
    let buffer = buffer_of(4);
    let mut scrubber = Scrubber::new();
    scrubber.set_speed(0.5);

    let mut seen = Vec::new();
    for _ in 0..4 {
        scrubber.tick(buffer.len());
        seen.push(scrubber.current(&buffer).unwrap().pixels()[0]);
    }
    assert_eq!(seen, vec![0, 1, 1, 2]);
}

#[test]
fn test_cursor_stays_in_range_for_any_speed() {
    let buffer = buffer_of(5);
    let mut scrubber = Scrubber::new();

    for speed in [2.0, -2.0, 1.75, -0.25, 0.0] {
        scrubber.set_speed(speed);
        for _ in 0..20 {
            scrubber.tick(buffer.len());
            let index = scrubber.resolve(buffer.len()).unwrap();
            assert!(index < buffer.len());
        }
    }
}

// ============================================================================
// Speed keys
// ============================================================================

#[test]
fn test_digit_keys_span_zero_to_max() {
    let mut scrubber = Scrubber::new();

    scrubber.set_speed_from_digit(b'1');
    assert_eq!(scrubber.speed(), 0.0);
    scrubber.set_speed_from_digit(b'5');
    assert_eq!(scrubber.speed(), 1.0);
    scrubber.set_speed_from_digit(b'9');
    assert_eq!(scrubber.speed(), 2.0);
    scrubber.set_speed_from_digit(b'0');
    assert_eq!(scrubber.speed(), 0.0);
}

#[test]
fn test_digit_keeps_direction() {
    let mut scrubber = Scrubber::new();
    scrubber.set_direction(Direction::Backward);
    scrubber.set_speed_from_digit(b'9');
    assert_eq!(scrubber.speed(), -2.0);
}

#[test]
fn test_direction_survives_zero_speed() {
    let mut scrubber = Scrubber::new();
    scrubber.set_speed_from_digit(b'1');
    scrubber.set_direction(Direction::Backward);
    scrubber.set_speed_from_digit(b'3');
    assert_eq!(scrubber.speed(), -0.5);
}

// ============================================================================
// Shrinking buffers
// ============================================================================

#[test]
fn test_empty_buffer_shows_nothing() {
    let buffer = FrameBuffer::new(4);
    let mut scrubber = Scrubber::new();
    scrubber.tick(buffer.len());
    assert!(scrubber.current(&buffer).is_none());
}

#[test]
fn test_cursor_past_cleared_buffer_resolves_to_start() {
    let mut buffer = buffer_of(5);
    let mut scrubber = Scrubber::new();
    for _ in 0..3 {
        scrubber.tick(buffer.len());
    }

    buffer.clear();
    buffer.append(Frame::filled(1, 1, PixelFormat::Gray8, 42));
    assert_eq!(scrubber.current(&buffer).unwrap().pixels()[0], 42);
}
