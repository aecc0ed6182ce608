//! RKSOK server
//!
//! The listener, the per-connection handler, and the method dispatcher.

pub mod connection;
pub mod dispatch;
pub mod server;

#[cfg(test)]
mod tests;

pub use server::{Server, ServerBuilder};
