//! Server configuration
//!
//! Configuration is explicit state constructed at startup and handed down
//! to components, never a process-wide singleton. It loads from a TOML file
//! with serde defaults for every field, so an empty file is a valid config.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::errors::Error;
use crate::protocol::MAX_NAME_LEN;

/// The text encoding used on both wire protocols and for the store file.
///
/// The protocol fixes a single encoding per deployment; the config names it
/// and the name is validated at load time. Only UTF-8 is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum TextEncoding {
    /// UTF-8
    Utf8,
}

impl TextEncoding {
    /// Decode raw bytes into text. A failure here is a malformed-input
    /// outcome for the caller, never a panic.
    pub fn decode(&self, bytes: &[u8]) -> Result<String, Error> {
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|e| Error::Encoding(format!("invalid UTF-8 at byte {}", e.valid_up_to()))),
        }
    }

    /// Encode text into raw bytes.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            TextEncoding::Utf8 => text.as_bytes().to_vec(),
        }
    }
}

impl TryFrom<String> for TextEncoding {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Error> {
        match value.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            other => Err(Error::Config(format!("unsupported encoding: {other}"))),
        }
    }
}

impl Default for TextEncoding {
    fn default() -> Self {
        TextEncoding::Utf8
    }
}

/// Configuration for the RKSOK server
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Address the server listens on
    pub listen_addr: String,

    /// Address of the gatekeeper service
    pub gatekeeper_addr: String,

    /// Path of the directory store file
    pub store_path: PathBuf,

    /// Wire and store text encoding
    pub encoding: TextEncoding,

    /// Maximum name length in characters. Fixed at 30 by the protocol,
    /// exposed as a tunable for testing.
    pub max_name_len: usize,

    /// Seconds a connection may sit idle before the handler gives up on it
    pub read_timeout_secs: u64,

    /// Seconds allowed for the whole gatekeeper exchange
    pub approval_timeout_secs: u64,

    /// Upper bound on a single buffered message, in bytes
    pub max_message_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8888".to_string(),
            gatekeeper_addr: "127.0.0.1:5000".to_string(),
            store_path: PathBuf::from("name_phone.json"),
            encoding: TextEncoding::Utf8,
            max_name_len: MAX_NAME_LEN,
            read_timeout_secs: 30,
            approval_timeout_secs: 10,
            max_message_bytes: 64 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        toml::from_str(&raw).map_err(|e| Error::Config(format!("cannot parse {}: {e}", path.display())))
    }

    /// Idle-read timeout as a [`Duration`].
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Approval timeout as a [`Duration`].
    pub fn approval_timeout(&self) -> Duration {
        Duration::from_secs(self.approval_timeout_secs)
    }
}
