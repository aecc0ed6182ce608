//! Typed RKSOK messages
//!
//! Structured representations of the three request variants, the server's
//! response set, and the gatekeeper verdict, together with their wire-form
//! serialization. Parsing lives in [`crate::protocol::validation`]; this
//! module is the data side.

use std::fmt::{self, Display};

use super::{
    APPROVAL_DENIED, LINE_END, MESSAGE_END, PROTOCOL, STATUS_NOT_FOUND, STATUS_OK,
    STATUS_UNRECOGNIZED,
};
use crate::protocol::method::Method;

/// A validated client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Retrieve the phone numbers stored for a name
    Get {
        /// Canonical (trimmed, upper-cased) name
        name: String,
    },

    /// Remove a name and everything stored under it
    Delete {
        /// Canonical name
        name: String,
    },

    /// Store phone numbers for a name
    Write {
        /// Canonical name
        name: String,
        /// Phone entries in the order they appeared in the request body
        phones: Vec<String>,
    },
}

impl Request {
    /// The name this request operates on.
    pub fn name(&self) -> &str {
        match self {
            Request::Get { name } | Request::Delete { name } | Request::Write { name, .. } => name,
        }
    }

    /// The protocol method of this request.
    pub fn method(&self) -> Method {
        match self {
            Request::Get { .. } => Method::Get,
            Request::Delete { .. } => Method::Delete,
            Request::Write { .. } => Method::Write,
        }
    }
}

/// A response the server sends back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The request succeeded. The payload is the phone number list for a
    /// get, and empty for a write or delete acknowledgement.
    Ok(Vec<String>),

    /// The requested name is not in the directory
    NotFound,

    /// The request could not be understood (framing, parsing, or an
    /// internal fault the protocol has no status for)
    Unrecognized,

    /// An opaque upstream denial, forwarded verbatim
    Forwarded(String),
}

impl Response {
    /// Serialize to the protocol's wire form: a status header line, optional
    /// body lines, and the blank terminator. `Forwarded` text is passed
    /// through untouched; the approval client guarantees its terminator.
    pub fn to_wire(&self) -> String {
        match self {
            Response::Ok(phones) => {
                let mut out = format!("{STATUS_OK} {PROTOCOL}{LINE_END}");
                for phone in phones {
                    out.push_str(phone);
                    out.push_str(LINE_END);
                }
                out.push_str(LINE_END);
                out
            }
            Response::NotFound => format!("{STATUS_NOT_FOUND} {PROTOCOL}{MESSAGE_END}"),
            Response::Unrecognized => format!("{STATUS_UNRECOGNIZED} {PROTOCOL}{MESSAGE_END}"),
            Response::Forwarded(text) => text.clone(),
        }
    }
}

/// The gatekeeper's verdict as the dispatcher sees it: either the request
/// may proceed, or the client gets `text` instead of a local response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalVerdict {
    /// The gatekeeper allowed the request
    Approved,
    /// The gatekeeper denied the request; `text` is the full wire message
    /// to forward to the client
    Denied(String),
}

/// The raw classification of a gatekeeper exchange, before the fail-closed
/// fold. Distinguishing `Unreachable` from `Denied` keeps "the gatekeeper
/// said no" and "the gatekeeper never answered" from being confused at the
/// call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// Exact match against the approval-success line
    Approved,
    /// Any other well-received reply; carries the reply text
    Denied(String),
    /// Connection refused, timed out, or the reply did not decode; carries
    /// a diagnostic
    Unreachable(String),
}

impl ApprovalOutcome {
    /// Fold into the verdict the dispatcher consumes. `Unreachable`
    /// degrades to `Denied` with a synthesized, well-formed denial message,
    /// so an absent gatekeeper can never let a request through.
    pub fn into_verdict(self) -> ApprovalVerdict {
        match self {
            ApprovalOutcome::Approved => ApprovalVerdict::Approved,
            ApprovalOutcome::Denied(text) => ApprovalVerdict::Denied(ensure_terminated(text)),
            ApprovalOutcome::Unreachable(diag) => ApprovalVerdict::Denied(format!(
                "{APPROVAL_DENIED} {PROTOCOL}{LINE_END}{diag}{MESSAGE_END}"
            )),
        }
    }
}

impl Display for ApprovalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApprovalOutcome::Approved => f.write_str("approved"),
            ApprovalOutcome::Denied(_) => f.write_str("denied"),
            ApprovalOutcome::Unreachable(diag) => write!(f, "unreachable ({diag})"),
        }
    }
}

/// Append the blank terminator if the text does not already end with one.
fn ensure_terminated(mut text: String) -> String {
    if !text.ends_with(MESSAGE_END) {
        text.push_str(MESSAGE_END);
    }
    text
}
