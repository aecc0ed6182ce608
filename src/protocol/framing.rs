//! Message framing
//!
//! РКСОК/1.0 messages have no length prefix; a message is everything up to
//! and including the first blank line. [`MessageCodec`] implements
//! [`Decoder`] over that discipline so a connection can be read through
//! `FramedRead` regardless of how the peer fragments its writes.
//!
//! Before committing to full buffering the codec sniffs the first bytes
//! against the known method keywords and rejects streams that cannot be
//! RKSOK at all, so unrelated or hostile input is dropped with a bounded
//! read instead of being accumulated.

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::config::TextEncoding;
use crate::errors::Error;
use crate::protocol::method::{Method, Sniff};
use crate::protocol::{MESSAGE_END, SNIFF_LEN};

/// Decoder yielding one complete raw message per frame, terminator
/// included. The raw text is kept verbatim because the approval envelope
/// must carry the client's exact bytes.
#[derive(Debug)]
pub struct MessageCodec {
    encoding: TextEncoding,
    max_message_bytes: usize,
    /// Set once the stream prefix has matched a method keyword
    sniffed: bool,
    /// Resume offset for the terminator scan, so repeated polls stay linear
    scanned: usize,
}

impl MessageCodec {
    /// Create a codec for one connection.
    pub fn new(encoding: TextEncoding, max_message_bytes: usize) -> Self {
        Self {
            encoding,
            max_message_bytes,
            sniffed: false,
            scanned: 0,
        }
    }

    fn take_frame(&mut self, buf: &mut BytesMut, len: usize) -> Result<String, Error> {
        let frame = buf.split_to(len);
        self.sniffed = false;
        self.scanned = 0;
        self.encoding.decode(&frame)
    }
}

impl Decoder for MessageCodec {
    type Item = String;
    type Error = Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>, Error> {
        if buf.is_empty() {
            return Ok(None);
        }

        if !self.sniffed {
            let probe = &buf[..buf.len().min(SNIFF_LEN)];
            match Method::sniff(probe) {
                Sniff::Recognized => {
                    self.sniffed = true;
                }
                Sniff::NeedMore => return Ok(None),
                Sniff::Unrecognized => {
                    return Err(Error::Malformed(
                        "stream does not start with a known method keyword".to_string(),
                    ));
                }
            }
        }

        match find_terminator(buf, self.scanned) {
            Some(end) => {
                let frame = self.take_frame(buf, end + MESSAGE_END.len())?;
                Ok(Some(frame))
            }
            None => {
                if buf.len() > self.max_message_bytes {
                    return Err(Error::Malformed(format!(
                        "message exceeds {} bytes without a terminator",
                        self.max_message_bytes
                    )));
                }
                // A terminator may straddle the next read; back off by its
                // length minus one before resuming the scan.
                self.scanned = buf.len().saturating_sub(MESSAGE_END.len() - 1);
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<String>, Error> {
        match self.decode(buf)? {
            Some(frame) => Ok(Some(frame)),
            None if buf.is_empty() => Ok(None),
            None => {
                // Peer closed mid-message: yield whatever accumulated as the
                // final, possibly incomplete message.
                let len = buf.len();
                let frame = self.take_frame(buf, len)?;
                Ok(Some(frame))
            }
        }
    }
}

fn find_terminator(buf: &BytesMut, from: usize) -> Option<usize> {
    let terminator = MESSAGE_END.as_bytes();
    if buf.len() < terminator.len() {
        return None;
    }
    buf[from..]
        .windows(terminator.len())
        .position(|window| window == terminator)
        .map(|pos| from + pos)
}
