//! Outbound clients
//!
//! The server's only outbound dependency is the gatekeeper; this module
//! holds the approval client and the seam trait it implements.

pub mod approval;

pub use approval::{Approver, TcpApprover};
