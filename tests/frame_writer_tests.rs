use jedibus::frame::*;

#[test]
fn test_write_byte_truncates_across_value_range() {
    let mut frame = Frame::new();

    // The documented example: 300 mod 256 lands as 44.
    frame.write_byte(0, 300);
    assert_eq!(frame.as_bytes()[2], 44);

    // Truncation holds across the whole u32 range, not just near 256.
    for raw in (0..4096u32).step_by(7) {
        frame.write_byte(1, raw);
        assert_eq!(u32::from(frame.as_bytes()[3]), raw % 256);
    }
    for raw in [65_535u32, 65_536, 1_000_000, u32::MAX] {
        frame.write_byte(2, raw);
        assert_eq!(u32::from(frame.as_bytes()[4]), raw % 256);
    }
}

#[test]
fn test_multi_byte_widths_and_order() {
    // Each width takes the least-significant bytes of the value, in order.
    let value = 0x1122_3344;

    let mut frame = Frame::new();
    frame.write_multi_byte(0, value, 1);
    assert_eq!(frame.as_bytes()[2], 0x44);

    let mut frame = Frame::new();
    frame.write_multi_byte(0, value, 2);
    assert_eq!(&frame.as_bytes()[2..4], &[0x44, 0x33]);

    let mut frame = Frame::new();
    frame.write_multi_byte(0, value, 3);
    assert_eq!(&frame.as_bytes()[2..5], &[0x44, 0x33, 0x22]);

    let mut frame = Frame::new();
    frame.write_multi_byte(0, value, 4);
    assert_eq!(&frame.as_bytes()[2..6], &[0x44, 0x33, 0x22, 0x11]);
}

#[test]
fn test_multi_byte_at_payload_tail() {
    let mut frame = Frame::new();
    frame.write_multi_byte(6, 0xBEEF, 2);
    assert_eq!(frame.as_bytes()[8], 0xEF);
    assert_eq!(frame.as_bytes()[9], 0xBE);
    assert_eq!(frame.payload_u16_le(6), 0xBEEF);
}

#[test]
fn test_nibble_writes_commute_for_all_values() {
    // Phase and class share one payload byte; writing them in either order
    // must produce the same byte for every nibble pair.
    for phase in 0u32..=15 {
        for class in 0u32..=15 {
            let mut forward = Frame::new();
            forward.write_bits(3, 0, 4, phase);
            forward.write_bits(3, 4, 4, class);

            let mut reverse = Frame::new();
            reverse.write_bits(3, 4, 4, class);
            reverse.write_bits(3, 0, 4, phase);

            let expected = (phase | (class << 4)) as u8;
            assert_eq!(forward.as_bytes()[5], expected);
            assert_eq!(reverse.as_bytes()[5], expected);
        }
    }
}

#[test]
fn test_bit_writes_leave_other_payload_bytes_alone() {
    let mut frame = Frame::new();
    frame.write_byte(2, 0x77);
    frame.write_byte(4, 0x99);

    frame.write_bits(3, 0, 4, 0xF);
    frame.write_bits(3, 4, 2, 0x3);

    assert_eq!(frame.as_bytes()[4], 0x77);
    assert_eq!(frame.as_bytes()[5], 0x3F);
    assert_eq!(frame.as_bytes()[6], 0x99);
}

#[test]
fn test_header_keeps_identifier_low_byte_only() {
    let frame = Frame::with_header(0x1308, 16);
    assert_eq!(frame.identifier(), 0x08);
    assert_eq!(frame.length(), 16);

    let frame = Frame::with_header(0xFFFF, 3);
    assert_eq!(frame.identifier(), 0xFF);
}

#[test]
fn test_payload_writes_never_touch_header() {
    let mut frame = Frame::with_header(520, 8);
    frame.write_byte(0, 0xAA);
    frame.write_multi_byte(4, 0xFFFF_FFFF, 4);
    frame.write_bits(3, 0, 8, 0xFF);

    assert_eq!(frame.identifier(), 8);
    assert_eq!(frame.length(), 8);
}

#[test]
fn test_float_bits_round_trip() {
    let mut frame = Frame::new();
    frame.write_float_bits(0, -2.5);

    // -2.5f32 = 0xC020_0000, Little Endian on the wire.
    assert_eq!(&frame.as_bytes()[2..6], &[0x00, 0x00, 0x20, 0xC0]);

    let bits = u32::from_le_bytes([
        frame.as_bytes()[2],
        frame.as_bytes()[3],
        frame.as_bytes()[4],
        frame.as_bytes()[5],
    ]);
    assert_eq!(f32::from_bits(bits), -2.5);
}

#[test]
fn test_display_renders_hex_bytes() {
    let mut frame = Frame::with_header(520, 8);
    frame.write_byte(1, 30);
    frame.write_multi_byte(4, 804, 2);

    assert_eq!(format!("{}", frame), "08 08 00 1E 00 00 24 03 00 00");
    assert_eq!(format!("{}", frame), frame.render_hex().as_str());
}
