//! RKSOK protocol definitions
//!
//! This module contains the wire-level vocabulary of РКСОК/1.0 and the
//! pieces that turn a raw byte stream into validated requests: the message
//! framer, the parser/validator, and the typed request/response/verdict
//! structures shared by the server and the approval client.

pub mod framing;
pub mod messages;
pub mod method;
pub mod validation;

pub use framing::MessageCodec;
pub use messages::{ApprovalOutcome, ApprovalVerdict, Request, Response};
pub use method::Method;
pub use validation::parse;

/// Protocol version marker, present once in every request and response
/// header line.
pub const PROTOCOL: &str = "РКСОК/1.0";

/// Line terminator.
pub const LINE_END: &str = "\r\n";

/// Message terminator: a blank line, in both directions of both protocols.
pub const MESSAGE_END: &str = "\r\n\r\n";

/// Status keyword for a successful response.
pub const STATUS_OK: &str = "НОРМАЛДЫКС";

/// Status keyword for a lookup or delete on an absent name.
pub const STATUS_NOT_FOUND: &str = "НИНАШОЛ";

/// Status keyword for a request the server could not make sense of.
pub const STATUS_UNRECOGNIZED: &str = "НИПОНЯЛ";

/// Keyword on the envelope the server sends to the gatekeeper.
pub const APPROVAL_REQUEST: &str = "АМОЖНА?";

/// Keyword on the gatekeeper's affirmative reply.
pub const APPROVAL_GRANTED: &str = "МОЖНА";

/// Keyword on the gatekeeper's denial reply.
pub const APPROVAL_DENIED: &str = "НИЛЬЗЯ";

/// Name length cap fixed by the protocol (configurable for testing).
pub const MAX_NAME_LEN: usize = 30;

/// How many leading bytes the framer inspects before committing to
/// buffering a full message.
pub const SNIFF_LEN: usize = 100;

/// The exact gatekeeper reply that counts as approval.
pub fn approval_success_line() -> String {
    format!("{APPROVAL_GRANTED} {PROTOCOL}{MESSAGE_END}")
}

/// Header line prefixed to the verbatim client request when asking the
/// gatekeeper for approval.
pub fn approval_request_line() -> String {
    format!("{APPROVAL_REQUEST} {PROTOCOL}{LINE_END}")
}
