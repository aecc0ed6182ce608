//! Approval client
//!
//! Every validated request is submitted to the external gatekeeper before
//! it is executed. The exchange is one short-lived TCP connection: write an
//! envelope (approval header line + the client's verbatim request text),
//! read one bounded reply, classify it. The policy is fail-closed — a
//! gatekeeper that is unreachable, slow, or unintelligible denies the
//! request; it never lets one through and never surfaces as a fault.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::config::TextEncoding;
use crate::protocol::{ApprovalOutcome, ApprovalVerdict, approval_request_line, approval_success_line};

/// Upper bound on the gatekeeper's reply. The gatekeeper protocol's
/// replies are short and blank-terminated, so a single bounded read is
/// sufficient.
const REPLY_BUF_SIZE: usize = 1024;

/// The seam between the connection handler and the gatekeeper. The TCP
/// implementation is the production one; tests substitute their own to
/// drive the approval paths deterministically.
#[async_trait]
pub trait Approver: Send + Sync {
    /// Ask the gatekeeper to clear `raw_request` (the client's exact
    /// message text). Always returns a verdict; never an error.
    async fn request_approval(&self, raw_request: &str) -> ApprovalVerdict;
}

/// Approval client speaking the gatekeeper wire protocol over TCP.
pub struct TcpApprover {
    endpoint: String,
    encoding: TextEncoding,
    timeout: Duration,
}

impl TcpApprover {
    /// Create an approver for the gatekeeper at `endpoint`.
    pub fn new(endpoint: impl Into<String>, encoding: TextEncoding, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            encoding,
            timeout,
        }
    }

    /// Run one full exchange and classify the result. Transport failures
    /// land in `Unreachable`; the fold into a verdict happens in the
    /// caller.
    async fn exchange(&self, raw_request: &str) -> ApprovalOutcome {
        match tokio::time::timeout(self.timeout, self.exchange_inner(raw_request)).await {
            Ok(outcome) => outcome,
            Err(_) => ApprovalOutcome::Unreachable(format!(
                "gatekeeper did not answer within {:?}",
                self.timeout
            )),
        }
    }

    async fn exchange_inner(&self, raw_request: &str) -> ApprovalOutcome {
        let mut stream = match TcpStream::connect(&self.endpoint).await {
            Ok(stream) => stream,
            Err(e) => {
                return ApprovalOutcome::Unreachable(format!(
                    "cannot connect to gatekeeper at {}: {e}",
                    self.endpoint
                ));
            }
        };

        let mut envelope = approval_request_line();
        envelope.push_str(raw_request);
        if let Err(e) = stream.write_all(&self.encoding.encode(&envelope)).await {
            return ApprovalOutcome::Unreachable(format!("cannot write to gatekeeper: {e}"));
        }

        let mut buf = vec![0u8; REPLY_BUF_SIZE];
        let read = match stream.read(&mut buf).await {
            Ok(read) => read,
            Err(e) => {
                return ApprovalOutcome::Unreachable(format!("cannot read from gatekeeper: {e}"));
            }
        };

        match self.encoding.decode(&buf[..read]) {
            Ok(reply) if reply == approval_success_line() => ApprovalOutcome::Approved,
            Ok(reply) if !reply.is_empty() => ApprovalOutcome::Denied(reply),
            Ok(_) => ApprovalOutcome::Unreachable("gatekeeper closed without a reply".to_string()),
            Err(e) => ApprovalOutcome::Unreachable(format!("gatekeeper reply did not decode: {e}")),
        }
    }
}

#[async_trait]
impl Approver for TcpApprover {
    async fn request_approval(&self, raw_request: &str) -> ApprovalVerdict {
        let outcome = self.exchange(raw_request).await;
        match &outcome {
            ApprovalOutcome::Unreachable(diag) => {
                warn!(%diag, "gatekeeper unreachable, failing closed");
            }
            _ => debug!(outcome = %outcome, "gatekeeper answered"),
        }
        outcome.into_verdict()
    }
}
