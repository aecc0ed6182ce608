//! RKSOK Rust Library
//!
//! This crate provides a Rust implementation of the РКСОК/1.0 protocol: a
//! small text-based request/response protocol for storing, retrieving, and
//! deleting a name→phone-numbers directory, in which every request must be
//! cleared by an external gatekeeper service before it is executed. It
//! includes the protocol engine (framing, validation, approval, dispatch),
//! the file-backed directory store, and the server binary glue.

// Re-export core components
pub mod client;
pub mod config;
pub mod errors;
pub mod protocol;
pub mod server;
pub mod storage;

// Re-export commonly used items
pub use client::{Approver, TcpApprover};
pub use config::{Config, TextEncoding};
pub use errors::Error;
pub use protocol::{ApprovalVerdict, Request, Response};
pub use server::{Server, ServerBuilder};
pub use storage::DirectoryStore;
