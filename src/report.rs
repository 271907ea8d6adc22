//! Report pipeline: validate the code, encode the frame, hand it to the
//! bus, shape the reply envelope.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::builder::{parse_error_code, BuildError, FrameBuilder};
use crate::bus::{FrameSink, SimulatedBus};
use crate::frame::Frame;
use crate::resolver::RecordResolver;
use crate::store::{ErrorRecord, RecordDatabase};

/// Reply message of a delivered report.
pub const REPORT_OK_MESSAGE: &str = "OK, CAN message has been sent";
/// Reply message of a stored record.
pub const ADD_OK_MESSAGE: &str = "Error code data saved successfully";
/// Reply message for an undecodable request line.
pub const BAD_REQUEST_MESSAGE: &str = "Invalid JSON data";

/// One console request, newline-delimited JSON on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ConsoleRequest {
    /// Encode and transmit the status frame for an error code.
    Report { errorcode: String },
    /// Check an error code without transmitting anything.
    Validate { errorcode: String },
    /// Add one record to the database.
    AddErrorCode { record: ErrorRecord },
    /// List all records.
    ListErrorCodes,
}

/// Reply envelopes. The field layout is the original console's wire format:
/// successes carry `"status": true`, failures carry `"success": false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConsoleReply {
    /// A frame went out; `can_msg` holds all ten bytes.
    Sent {
        status: bool,
        code: String,
        message: String,
        #[serde(rename = "canMsg", with = "serde_bytes")]
        can_msg: Vec<u8>,
    },
    /// Database listing.
    Listing {
        status: bool,
        codes: Vec<ErrorRecord>,
    },
    /// Plain success.
    Done { status: bool, message: String },
    /// Any failure, with the operator-facing reason.
    Failed { success: bool, message: String },
}

impl ConsoleReply {
    pub fn sent(code: &str, frame: &Frame) -> Self {
        ConsoleReply::Sent {
            status: true,
            code: code.to_string(),
            message: REPORT_OK_MESSAGE.to_string(),
            can_msg: frame.as_bytes().to_vec(),
        }
    }

    pub fn listing(codes: Vec<ErrorRecord>) -> Self {
        ConsoleReply::Listing {
            status: true,
            codes,
        }
    }

    pub fn done(message: &str) -> Self {
        ConsoleReply::Done {
            status: true,
            message: message.to_string(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        ConsoleReply::Failed {
            success: false,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, ConsoleReply::Failed { .. })
    }
}

/// Report pipeline failures; Display doubles as the envelope reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error(transparent)]
    Build(#[from] BuildError),
    /// The bus refused the frame after a successful encode.
    #[error("Failed to generate/send CAN message")]
    SendFailed,
}

/// Running totals for the operator log.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceStats {
    pub reports_ok: u32,
    pub reports_failed: u32,
    pub records_added: u32,
}

/// Generator-side console service: owns the protocol tables, the record
/// database, and the outbound bus.
#[derive(Debug)]
pub struct ReportService<D: RecordDatabase> {
    builder: FrameBuilder,
    resolver: RecordResolver<D>,
    bus: SimulatedBus,
    stats: ServiceStats,
}

impl<D: RecordDatabase> ReportService<D> {
    pub fn new(database: D) -> Self {
        Self {
            builder: FrameBuilder::new(),
            resolver: RecordResolver::new(database),
            bus: SimulatedBus::new(),
            stats: ServiceStats::default(),
        }
    }

    pub fn bus(&self) -> &SimulatedBus {
        &self.bus
    }

    pub fn stats(&self) -> ServiceStats {
        self.stats
    }

    /// Decode one raw request line and produce the reply for it. An
    /// undecodable line gets the original console's wording.
    pub fn handle_line(&mut self, line: &str) -> ConsoleReply {
        match serde_json::from_str::<ConsoleRequest>(line) {
            Ok(request) => self.handle_request(request),
            Err(err) => {
                warn!("Request parse failed: {}", err);
                ConsoleReply::failed(BAD_REQUEST_MESSAGE)
            }
        }
    }

    /// Dispatch one decoded console request.
    pub fn handle_request(&mut self, request: ConsoleRequest) -> ConsoleReply {
        match request {
            ConsoleRequest::Report { errorcode } => self.handle_report(&errorcode),
            ConsoleRequest::Validate { errorcode } => self.handle_validate(&errorcode),
            ConsoleRequest::AddErrorCode { record } => self.handle_add(record),
            ConsoleRequest::ListErrorCodes => self.handle_list(),
        }
    }

    /// Full report pipeline for one raw error code string. The reply echoes
    /// the code exactly as the caller sent it.
    pub fn handle_report(&mut self, raw_code: &str) -> ConsoleReply {
        match self.report_frame(raw_code) {
            Ok(frame) => {
                self.stats.reports_ok += 1;
                ConsoleReply::sent(raw_code, &frame)
            }
            Err(err) => {
                self.stats.reports_failed += 1;
                warn!("Report for {:?} failed: {}", raw_code, err);
                ConsoleReply::failed(err.to_string())
            }
        }
    }

    /// Encode and transmit the status frame for a raw error code string.
    pub fn report_frame(&mut self, raw_code: &str) -> Result<Frame, ReportError> {
        let code = parse_error_code(raw_code)?;
        let frame = self.builder.build_status_frame(&self.resolver, code)?;
        if let Err(reason) = self.bus.send_frame(&frame) {
            warn!("Bus send failed: {}", reason);
            return Err(ReportError::SendFailed);
        }
        Ok(frame)
    }

    /// Format plus existence check, without touching the bus.
    pub fn handle_validate(&self, raw_code: &str) -> ConsoleReply {
        match self.check_code(raw_code) {
            Ok(code) => ConsoleReply::done(&format!("Error code {} is valid", code)),
            Err(err) => ConsoleReply::failed(err.to_string()),
        }
    }

    fn check_code(&self, raw_code: &str) -> Result<i64, BuildError> {
        let code = parse_error_code(raw_code)?;
        if self.resolver.resolve(code).is_none() {
            return Err(BuildError::UnknownErrorCode(code));
        }
        Ok(code)
    }

    pub fn handle_add(&mut self, record: ErrorRecord) -> ConsoleReply {
        match self.resolver.store_mut().add(record) {
            Ok(()) => {
                self.stats.records_added += 1;
                ConsoleReply::done(ADD_OK_MESSAGE)
            }
            Err(err) => ConsoleReply::failed(err.to_string()),
        }
    }

    pub fn handle_list(&self) -> ConsoleReply {
        match self.resolver.store().list() {
            Ok(codes) => ConsoleReply::listing(codes),
            Err(err) => ConsoleReply::failed(err.to_string()),
        }
    }
}
