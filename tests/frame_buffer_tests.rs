use webcam_scrubber::core::{capacity_for, Frame, FrameBuffer, PixelFormat};

fn tagged(tag: u8) -> Frame {
    Frame::filled(2, 2, PixelFormat::Gray8, tag)
}

fn tags(buffer: &FrameBuffer) -> Vec<u8> {
    buffer.iter().map(|f| f.pixels()[0]).collect()
}

// ============================================================================
// Capacity
// ============================================================================

#[test]
fn test_capacity_from_duration() {
    assert_eq!(capacity_for(2.0, 25.0), 50);
    assert_eq!(capacity_for(0.5, 25.0), 13);
    assert_eq!(capacity_for(0.0, 25.0), 1);
    assert_eq!(capacity_for(10.0, 0.0), 1);
    assert_eq!(capacity_for(f32::NAN, 25.0), 1);
}

#[test]
fn test_fractional_bound_keeps_next_whole_frame() {
    let mut buffer = FrameBuffer::with_duration(0.5, 25.0);
    for tag in 0..40 {
        buffer.append(tagged(tag));
    }
    assert_eq!(buffer.len(), 13);
    assert_eq!(tags(&buffer).first(), Some(&27));
}

#[test]
fn test_default_duration_is_effectively_unbounded() {
    assert_eq!(capacity_for(99999.0, 25.0), 2_499_975);
}

// ============================================================================
// Append and eviction
// ============================================================================

#[test]
fn test_length_never_exceeds_capacity() {
    let mut buffer = FrameBuffer::new(3);
    for tag in 0..10 {
        buffer.append(tagged(tag));
        assert!(buffer.len() <= buffer.capacity());
    }
    assert_eq!(buffer.len(), 3);
}

#[test]
fn test_oldest_frames_are_evicted_first() {
    let mut buffer = FrameBuffer::new(3);
    for tag in 1..=5 {
        buffer.append(tagged(tag));
    }
    assert_eq!(tags(&buffer), vec![3, 4, 5]);
}

#[test]
fn test_append_below_capacity_keeps_order() {
    let mut buffer = FrameBuffer::new(10);
    for tag in [7, 3, 9] {
        buffer.append(tagged(tag));
    }
    assert_eq!(tags(&buffer), vec![7, 3, 9]);
    assert_eq!(buffer.get(1).unwrap().pixels()[0], 3);
    assert!(buffer.get(3).is_none());
}

#[test]
fn test_shrinking_capacity_evicts_on_next_append() {
    let mut buffer = FrameBuffer::with_duration(1.0, 5.0);
    for tag in 0..5 {
        buffer.append(tagged(tag));
    }

    buffer.set_duration(1.0, 2.0);
    assert_eq!(buffer.capacity(), 2);
    buffer.append(tagged(9));
    assert_eq!(tags(&buffer), vec![4, 9]);
}

#[test]
fn test_clear_then_append() {
    let mut buffer = FrameBuffer::new(4);
    buffer.append(tagged(1));
    buffer.append(tagged(2));
    buffer.clear();
    assert!(buffer.is_empty());
    assert_eq!(buffer.byte_size(), 0);

    buffer.append(tagged(3));
    assert_eq!(tags(&buffer), vec![3]);
    assert_eq!(buffer.byte_size(), 4);
}
