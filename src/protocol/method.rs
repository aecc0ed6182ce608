//! Type-safe definitions for the RKSOK method identifiers.
//! This module provides the structured representation of the three request
//! methods defined in the protocol and the byte-level sniffing used by the
//! framer to reject foreign streams early.

use std::fmt::{self, Display};

/// Represents the request methods defined in РКСОК/1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Retrieve the phone numbers stored for a name
    Get,

    /// Remove a name and its phone numbers
    Delete,

    /// Store phone numbers for a name
    Write,
}

/// Result of probing the first bytes of a stream against the known method
/// keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sniff {
    /// The stream starts with a known method keyword
    Recognized,
    /// Too few bytes to decide yet
    NeedMore,
    /// The stream cannot start with any known method keyword
    Unrecognized,
}

impl Method {
    /// All methods, in protocol order.
    pub const ALL: [Method; 3] = [Method::Get, Method::Delete, Method::Write];

    /// The wire keyword for this method.
    pub fn keyword(&self) -> &'static str {
        match self {
            Method::Get => "ОТДОВАЙ",
            Method::Delete => "УДОЛИ",
            Method::Write => "ЗОПИШИ",
        }
    }

    /// Look up a method by its wire keyword.
    pub fn from_keyword(token: &str) -> Option<Method> {
        Method::ALL.into_iter().find(|m| m.keyword() == token)
    }

    /// Probe the first bytes of a stream. `Recognized` as soon as a full
    /// keyword is present at the start, `NeedMore` while the bytes are still
    /// a proper prefix of some keyword, `Unrecognized` otherwise.
    pub fn sniff(bytes: &[u8]) -> Sniff {
        let mut partial = false;
        for method in Method::ALL {
            let keyword = method.keyword().as_bytes();
            if bytes.len() >= keyword.len() {
                if &bytes[..keyword.len()] == keyword {
                    return Sniff::Recognized;
                }
            } else if keyword.starts_with(bytes) {
                partial = true;
            }
        }
        if partial { Sniff::NeedMore } else { Sniff::Unrecognized }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
