//! # JEDI Generator Bus Simulator
//!
//! Simulates the status-reporting side of the JEDI generator-to-controller
//! bus used by imaging-equipment generators: a numeric error code goes in,
//! a 10-byte notify-status frame comes out, and an operator console can
//! report, validate, and maintain the error-code database over TCP.
//!
//! ## Features
//!
//! - **Table-driven frame encoding**: message registry plus per-parameter
//!   field specs interpreted by one generic writer
//! - **Mixed-width fields**: whole bytes, packed nibbles, and Little Endian
//!   16-bit values in a fixed 10-byte frame
//! - **Error-code database**: JSON file keyed by decimal code strings, with
//!   duplicate rejection and atomic rewrites
//! - **Console protocol**: newline-delimited JSON requests with the
//!   original console's reply envelopes
//! - **Simulated bus**: loopback sink with a bounded send history
//!
//! ## Frame layout
//!
//! ```text
//! byte 0    message identifier (low byte)
//! byte 1    message length
//! byte 2    generator status (phase)
//! byte 3    simplified error code
//! byte 4    display bitmap
//! byte 5    bits 0-3 phase of error, bits 4-7 error class
//! bytes 6-7 generator error code, Little Endian
//! bytes 8-9 auxiliary error data, Little Endian
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use jedibus::{MemoryStore, ReportService};
//!
//! // Console service over the built-in error codes
//! let mut service = ReportService::new(MemoryStore::builtin());
//!
//! let reply = service.handle_report("804");
//! assert!(reply.is_success());
//! ```
//!
//! ## Architecture
//!
//! - [`frame`] - Frame buffer and generic field write primitives
//! - [`protocol`] - Message registry and parameter dispatch tables
//! - [`store`] - Error-code record database (JSON file / in-memory)
//! - [`resolver`] - Error code to record resolution
//! - [`builder`] - Status frame assembly and its failure modes
//! - [`bus`] - Outbound frame sink seam and the simulated bus
//! - [`report`] - Console service, request decoding, reply envelopes

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::missing_errors_doc)]

pub mod builder;
pub mod bus;
pub mod frame;
pub mod protocol;
pub mod report;
pub mod resolver;
pub mod store;

// Re-export main public types for convenience
pub use builder::{parse_error_code, BuildError, FrameBuilder};
pub use bus::{FrameSink, SimulatedBus};
pub use frame::{Frame, FRAME_LEN};
pub use protocol::{DispatchTable, MessageRegistry};
pub use report::{ConsoleReply, ConsoleRequest, ReportService};
pub use resolver::RecordResolver;
pub use store::{ErrorRecord, JsonFileStore, MemoryStore, RecordDatabase, RecordStore};
