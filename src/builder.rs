//! Status frame assembly: allocate from the registry, resolve the record,
//! dispatch each field write.

use thiserror::Error;
use tracing::debug;

use crate::frame::Frame;
use crate::protocol::{param, DispatchTable, MessageRegistry, MSG_NOTIFY_STATUS};
use crate::resolver::RecordResolver;
use crate::store::RecordStore;

/// Frame assembly failures. The Display strings double as operator-facing
/// failure reasons in reply envelopes, so their wording is part of the
/// console contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Input string does not parse as an integer.
    #[error("Invalid error code format: {0}")]
    InvalidErrorCodeFormat(String),
    /// Integer parses but no record matches it.
    #[error("Error code {0} is not valid")]
    UnknownErrorCode(i64),
    /// Registry entry missing or zeroed. A configuration defect: fatal to
    /// the request, not to the process.
    #[error("Failed to generate/send CAN message")]
    FrameAllocationFailed,
}

/// Parse an operator-supplied error code string. Surrounding whitespace is
/// tolerated; anything that does not parse as an integer fails here,
/// before any record lookup happens.
pub fn parse_error_code(raw: &str) -> Result<i64, BuildError> {
    let trimmed = raw.trim();
    trimmed
        .parse::<i64>()
        .map_err(|_| BuildError::InvalidErrorCodeFormat(trimmed.to_string()))
}

/// Assembles notify-status frames from resolved error records.
///
/// Holds only the immutable protocol tables; the record store comes in by
/// reference per call, so one builder serves any number of requests with a
/// freshly allocated frame each time.
#[derive(Debug)]
pub struct FrameBuilder {
    registry: MessageRegistry,
    dispatch: DispatchTable,
}

impl FrameBuilder {
    /// Builder over the standard protocol tables.
    pub fn new() -> Self {
        Self::with_tables(MessageRegistry::new(), DispatchTable::new())
    }

    /// Builder over caller-supplied tables.
    pub fn with_tables(registry: MessageRegistry, dispatch: DispatchTable) -> Self {
        Self { registry, dispatch }
    }

    pub fn registry(&self) -> &MessageRegistry {
        &self.registry
    }

    /// Encode the notify-status frame for `code`.
    ///
    /// The only failure points are the registry lookup and the record
    /// resolution. Field writes cannot fail, so a returned frame is always
    /// complete; there is no partial-success case.
    pub fn build_status_frame<S: RecordStore>(
        &self,
        resolver: &RecordResolver<S>,
        code: i64,
    ) -> Result<Frame, BuildError> {
        let mut frame = self.allocate(MSG_NOTIFY_STATUS)?;
        let record = resolver
            .resolve(code)
            .ok_or(BuildError::UnknownErrorCode(code))?;

        self.set_notify_param(&mut frame, param::STATUS_PHASE, u32::from(record.generator_status));
        self.set_notify_param(
            &mut frame,
            param::SIMPLIFIED_ERROR_CODE,
            u32::from(record.simplified_code),
        );
        self.set_notify_param(&mut frame, param::DISPLAY_BITMAP, u32::from(record.display_bitmap));
        // Phase and class share frame byte 5; both writes land before the
        // frame is considered final.
        self.set_notify_param(&mut frame, param::PHASE_OF_ERROR, u32::from(record.phase_nibble));
        self.set_notify_param(&mut frame, param::ERROR_CLASS, u32::from(record.class_nibble));
        self.set_notify_param(
            &mut frame,
            param::ERROR_CODE,
            u32::from(record.generator_error_code),
        );
        self.set_notify_param(&mut frame, param::ERROR_DATA, u32::from(record.aux_data));

        debug!("Encoded status frame for code {}: {}", code, frame);
        Ok(frame)
    }

    fn set_notify_param(&self, frame: &mut Frame, parameter: &str, value: u32) {
        self.dispatch
            .set_param(frame, MSG_NOTIFY_STATUS, parameter, value);
    }

    /// Allocate a header-stamped, zero-payload frame for a message type.
    fn allocate(&self, name: &str) -> Result<Frame, BuildError> {
        let message = self
            .registry
            .lookup(name)
            .ok_or(BuildError::FrameAllocationFailed)?;
        if message.identifier == 0 && message.length == 0 {
            return Err(BuildError::FrameAllocationFailed);
        }
        Ok(Frame::with_header(message.identifier, message.length))
    }
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self::new()
    }
}
