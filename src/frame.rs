//! Fixed-length status frame buffer and generic field write primitives.
//!
//! Every bus message is a 10-byte frame: a 2-byte header followed by an
//! 8-byte payload. Field writers address the payload with logical offsets;
//! the physical byte index is `logical offset + 2`.
//!
//! ```text
//! ┌─────────────┬─────────────┬──────────────────────────┐
//! │ Byte 0      │ Byte 1      │ Bytes 2..9               │
//! │ identifier  │ length      │ payload fields           │
//! │ (low byte)  │             │                          │
//! └─────────────┴─────────────┴──────────────────────────┘
//! ```
//!
//! Multi-byte payload fields are Little Endian.

use arrayvec::ArrayString;
use core::fmt::{self, Write};
use static_assertions::const_assert;

/// Total frame size in bytes (fixed, exactly 10).
pub const FRAME_LEN: usize = 10;

/// Header size in bytes: identifier low byte + length byte.
pub const HEADER_LEN: usize = 2;

/// Payload size in bytes.
pub const PAYLOAD_LEN: usize = FRAME_LEN - HEADER_LEN;

/// Capacity of the hex rendering buffer ("XX " per byte).
pub const HEX_RENDER_LEN: usize = FRAME_LEN * 3;

const_assert!(FRAME_LEN > HEADER_LEN);
const_assert!(PAYLOAD_LEN == 8);

/// One bus status frame.
///
/// Allocated zeroed per encoding request, mutated in place by field writes,
/// and handed to the caller by value once complete. Cells are bytes, so the
/// [0, 255] range invariant holds by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Frame {
    bytes: [u8; FRAME_LEN],
}

impl Frame {
    /// Create an all-zero frame.
    pub fn new() -> Self {
        Self {
            bytes: [0u8; FRAME_LEN],
        }
    }

    /// Create a frame with the header stamped and a zeroed payload.
    ///
    /// Only the low byte of the identifier goes on the wire; consumers
    /// discriminate message types by the (identifier low byte, length) pair.
    pub fn with_header(identifier: u16, length: u8) -> Self {
        let mut frame = Self::new();
        frame.bytes[0] = (identifier & 0xFF) as u8;
        frame.bytes[1] = length;
        frame
    }

    /// Header identifier byte (frame byte 0).
    pub fn identifier(&self) -> u8 {
        self.bytes[0]
    }

    /// Header length byte (frame byte 1).
    pub fn length(&self) -> u8 {
        self.bytes[1]
    }

    /// Whether this frame's header carries the given identifier/length pair.
    pub fn matches_header(&self, identifier: u16, length: u8) -> bool {
        self.bytes[0] == (identifier & 0xFF) as u8 && self.bytes[1] == length
    }

    /// Full frame contents.
    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.bytes
    }

    /// Write one payload byte at the given logical offset.
    ///
    /// Values wider than one byte are truncated mod 256; bus consumers
    /// depend on this truncation, so it is part of the wire contract.
    pub fn write_byte(&mut self, offset: usize, value: u32) {
        debug_assert!(offset < PAYLOAD_LEN, "payload offset out of range");
        self.bytes[HEADER_LEN + offset] = (value & 0xFF) as u8;
    }

    /// Write `count` payload bytes at consecutive logical offsets,
    /// least-significant byte first. Supports 1 to 4 bytes.
    pub fn write_multi_byte(&mut self, offset: usize, value: u32, count: usize) {
        debug_assert!((1..=4).contains(&count), "byte count out of range");
        debug_assert!(offset + count <= PAYLOAD_LEN, "field exceeds payload");
        for i in 0..count {
            self.write_byte(offset + i, value >> (8 * i));
        }
    }

    /// Write a sub-byte bitfield into the payload byte at the given logical
    /// offset. `bit_offset` counts from the least-significant end. Bits
    /// outside the field keep their current value, so two fields sharing a
    /// byte can be written in either order.
    pub fn write_bits(&mut self, offset: usize, bit_offset: u8, bit_width: u8, value: u32) {
        debug_assert!((1..=8).contains(&bit_width), "bit width out of range");
        debug_assert!(bit_offset + bit_width <= 8, "bitfield exceeds one byte");
        let field_mask = (0xFFu8 >> (8 - bit_width)) << bit_offset;
        let current = self.bytes[HEADER_LEN + offset];
        let cleared = current & !field_mask;
        let inserted = ((value << bit_offset) as u8) & field_mask;
        self.write_byte(offset, u32::from(cleared | inserted));
    }

    /// Write a 32-bit float's IEEE-754 bit pattern as a 4-byte Little
    /// Endian field. Not used by the current message set; kept as a general
    /// capability for wider payloads.
    pub fn write_float_bits(&mut self, offset: usize, value: f32) {
        self.write_multi_byte(offset, value.to_bits(), 4);
    }

    /// Read back a 16-bit Little Endian payload field.
    pub fn payload_u16_le(&self, offset: usize) -> u16 {
        debug_assert!(offset + 2 <= PAYLOAD_LEN, "field exceeds payload");
        u16::from_le_bytes([
            self.bytes[HEADER_LEN + offset],
            self.bytes[HEADER_LEN + offset + 1],
        ])
    }

    /// Render the frame as space-separated hex bytes for logs and console
    /// output.
    pub fn render_hex(&self) -> ArrayString<HEX_RENDER_LEN> {
        let mut buf = ArrayString::new();
        for (i, byte) in self.bytes.iter().enumerate() {
            // Capacity is sized for the full frame, so the write cannot fail.
            let _ = if i == 0 {
                write!(buf, "{:02X}", byte)
            } else {
                write!(buf, " {:02X}", byte)
            };
        }
        buf
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render_hex())
    }
}
