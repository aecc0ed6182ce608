//! Request parsing and validation
//!
//! A framed message is text by the time it gets here; this module turns it
//! into a [`Request`] or rejects it. Every check is a hard precondition for
//! the next, and the function has no side effects.

use crate::errors::Error;
use crate::protocol::method::Method;
use crate::protocol::{LINE_END, PROTOCOL, Request};

/// Parse a raw message into a validated request.
///
/// Order of checks: the protocol marker must appear exactly once in the
/// header line; the first whitespace-delimited token must be a known method
/// keyword; the name between the keyword and the marker, trimmed and
/// upper-cased, must be 1..=`max_name_len` characters; and for a write the
/// remaining lines become the phone list with empty entries dropped.
pub fn parse(raw: &str, max_name_len: usize) -> Result<Request, Error> {
    let header = raw.split(LINE_END).next().unwrap_or(raw);
    if header.matches(PROTOCOL).count() != 1 {
        return Err(Error::Malformed(
            "protocol marker missing or repeated in header".to_string(),
        ));
    }

    let token = raw
        .split_whitespace()
        .next()
        .ok_or_else(|| Error::Malformed("empty request".to_string()))?;
    let method = Method::from_keyword(token)
        .ok_or_else(|| Error::Malformed(format!("unknown method: {token}")))?;

    let after_method = header
        .strip_prefix(method.keyword())
        .ok_or_else(|| Error::Malformed("header does not start with the method".to_string()))?;
    let marker_at = after_method
        .find(PROTOCOL)
        .ok_or_else(|| Error::Malformed("protocol marker not in header".to_string()))?;
    let name = after_method[..marker_at].trim().to_uppercase();

    let name_len = name.chars().count();
    if name_len == 0 || name_len > max_name_len {
        return Err(Error::Malformed(format!(
            "name length {name_len} outside 1..={max_name_len}"
        )));
    }

    Ok(match method {
        Method::Get => Request::Get { name },
        Method::Delete => Request::Delete { name },
        Method::Write => {
            let body = raw.split_once(LINE_END).map(|(_, rest)| rest).unwrap_or("");
            let phones = body
                .split(LINE_END)
                .filter(|line| !line.is_empty())
                .map(str::to_owned)
                .collect();
            Request::Write { name, phones }
        }
    })
}
