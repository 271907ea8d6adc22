//! Message type registry and parameter dispatch tables.
//!
//! Both tables are fixed at construction and shared read-only afterwards.
//! Frame encoding walks them instead of branching on parameter names, so
//! adding a message type or field is a table edit, not new control flow.

use heapless::Vec;

use crate::frame::Frame;

/// Query the generator for its current status.
pub const MSG_GET_STATUS: &str = "GET_JEDI_STATUS";
/// Unsolicited generator status notification.
pub const MSG_NOTIFY_STATUS: &str = "NOTIFY_JEDI_STATUS";

/// Bus identifier shared by both status message types. Only the length
/// byte separates them on the wire.
pub const STATUS_MESSAGE_ID: u16 = 520;

/// Wire length byte of the query-status message.
pub const GET_STATUS_LEN: u8 = 16;
/// Wire length byte of the notify-status message.
pub const NOTIFY_STATUS_LEN: u8 = 8;

/// Upper bound on registry and dispatch table sizes.
pub const MAX_MESSAGE_TYPES: usize = 8;

/// External parameter names recognized by the notify-status table.
pub mod param {
    pub const STATUS_PHASE: &str = "JEDI_STATUS_PHASE";
    pub const SIMPLIFIED_ERROR_CODE: &str = "SIMPLIFIED_ERROR_CODE";
    pub const DISPLAY_BITMAP: &str = "DISPLAY_BITMAP";
    pub const PHASE_OF_ERROR: &str = "PHASE_OF_ERROR_OCCURED";
    pub const ERROR_CLASS: &str = "ERROR_CLASS";
    pub const ERROR_CODE: &str = "JEDI_ERROR_CODE";
    pub const ERROR_DATA: &str = "DATA_RELATED_TO_ERROR";
}

/// One registered message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageType {
    pub name: &'static str,
    pub identifier: u16,
    pub length: u8,
}

/// Placement of one parameter inside a frame payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSpec {
    /// Whole byte at a logical payload offset.
    Byte { offset: usize },
    /// Sub-byte bitfield inside the payload byte at `offset`;
    /// `bit_offset` counts from the least-significant end.
    Bits {
        offset: usize,
        bit_offset: u8,
        bit_width: u8,
    },
    /// Little Endian integer spanning `count` bytes from `offset`.
    MultiByte { offset: usize, count: usize },
    /// IEEE-754 bit pattern spanning four bytes from `offset`.
    FloatBits { offset: usize },
}

impl FieldSpec {
    /// Write `value` into `frame` as this field. Field writes cannot fail;
    /// oversized values truncate or mask per the wire contract.
    pub fn apply(self, frame: &mut Frame, value: u32) {
        match self {
            FieldSpec::Byte { offset } => frame.write_byte(offset, value),
            FieldSpec::Bits {
                offset,
                bit_offset,
                bit_width,
            } => frame.write_bits(offset, bit_offset, bit_width, value),
            FieldSpec::MultiByte { offset, count } => frame.write_multi_byte(offset, value, count),
            FieldSpec::FloatBits { offset } => frame.write_float_bits(offset, value as f32),
        }
    }
}

/// One dispatch table row: external parameter name plus field placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub field: FieldSpec,
}

const STANDARD_MESSAGES: [MessageType; 2] = [
    MessageType {
        name: MSG_GET_STATUS,
        identifier: STATUS_MESSAGE_ID,
        length: GET_STATUS_LEN,
    },
    MessageType {
        name: MSG_NOTIFY_STATUS,
        identifier: STATUS_MESSAGE_ID,
        length: NOTIFY_STATUS_LEN,
    },
];

const NOTIFY_STATUS_PARAMS: [ParameterSpec; 7] = [
    ParameterSpec {
        name: param::STATUS_PHASE,
        field: FieldSpec::Byte { offset: 0 },
    },
    ParameterSpec {
        name: param::SIMPLIFIED_ERROR_CODE,
        field: FieldSpec::Byte { offset: 1 },
    },
    ParameterSpec {
        name: param::DISPLAY_BITMAP,
        field: FieldSpec::Byte { offset: 2 },
    },
    ParameterSpec {
        name: param::PHASE_OF_ERROR,
        field: FieldSpec::Bits {
            offset: 3,
            bit_offset: 0,
            bit_width: 4,
        },
    },
    ParameterSpec {
        name: param::ERROR_CLASS,
        field: FieldSpec::Bits {
            offset: 3,
            bit_offset: 4,
            bit_width: 4,
        },
    },
    ParameterSpec {
        name: param::ERROR_CODE,
        field: FieldSpec::MultiByte { offset: 4, count: 2 },
    },
    ParameterSpec {
        name: param::ERROR_DATA,
        field: FieldSpec::MultiByte { offset: 6, count: 2 },
    },
];

// The query-status message carries no writable parameters.
const GET_STATUS_PARAMS: [ParameterSpec; 0] = [];

/// Static table of known message types.
#[derive(Debug, Clone)]
pub struct MessageRegistry {
    entries: Vec<MessageType, MAX_MESSAGE_TYPES>,
}

impl MessageRegistry {
    /// Registry holding the standard protocol table.
    pub fn new() -> Self {
        Self::with_entries(&STANDARD_MESSAGES)
    }

    /// Registry holding a caller-supplied table. Entries beyond
    /// `MAX_MESSAGE_TYPES` are dropped.
    pub fn with_entries(entries: &[MessageType]) -> Self {
        let mut table = Vec::new();
        for entry in entries.iter().take(MAX_MESSAGE_TYPES) {
            let _ = table.push(*entry);
        }
        Self { entries: table }
    }

    /// Look up a message type by symbolic name.
    pub fn lookup(&self, name: &str) -> Option<&MessageType> {
        self.entries.iter().find(|m| m.name == name)
    }

    /// Find the message type matching a frame's header pair. Identifier
    /// alone is ambiguous here since both status messages share one
    /// identifier: the length byte is part of the key.
    pub fn classify(&self, frame: &Frame) -> Option<&MessageType> {
        self.entries
            .iter()
            .find(|m| frame.matches_header(m.identifier, m.length))
    }
}

impl Default for MessageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-message parameter rows plus the message identity needed to verify a
/// frame actually is the message it is being written as.
#[derive(Debug, Clone, Copy)]
struct MessageDispatch {
    message: MessageType,
    params: &'static [ParameterSpec],
}

/// Maps (message type, parameter name) to a field write.
#[derive(Debug, Clone)]
pub struct DispatchTable {
    entries: Vec<MessageDispatch, MAX_MESSAGE_TYPES>,
}

impl DispatchTable {
    /// Dispatch table for the standard protocol.
    pub fn new() -> Self {
        let mut entries = Vec::new();
        let _ = entries.push(MessageDispatch {
            message: STANDARD_MESSAGES[0],
            params: &GET_STATUS_PARAMS,
        });
        let _ = entries.push(MessageDispatch {
            message: STANDARD_MESSAGES[1],
            params: &NOTIFY_STATUS_PARAMS,
        });
        Self { entries }
    }

    /// Parameter rows for a message type name.
    pub fn params_for(&self, message: &str) -> Option<&[ParameterSpec]> {
        self.entries
            .iter()
            .find(|e| e.message.name == message)
            .map(|e| e.params)
    }

    /// Apply a named parameter to a frame of the named message type.
    ///
    /// Unknown message types, frames whose header pair does not match the
    /// named type, and unrecognized parameter names all leave the frame
    /// untouched. Callers probe optional fields, so none of these is an
    /// error.
    pub fn set_param(&self, frame: &mut Frame, message: &str, parameter: &str, value: u32) {
        if let Some(entry) = self.entries.iter().find(|e| e.message.name == message) {
            if !frame.matches_header(entry.message.identifier, entry.message.length) {
                return;
            }
            if let Some(spec) = entry.params.iter().find(|p| p.name == parameter) {
                spec.field.apply(frame, value);
            }
        }
    }
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::new()
    }
}
