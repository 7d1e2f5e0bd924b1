use crate::Frame;

use bytes::Bytes;
use std::{fmt, str};

/// Utility for parsing a command
///
/// Commands are represented as array frames. Each entry in the frame is a
/// "token". A `Parse` is initialized with the array frame and provides a
/// cursor-like API. Each command struct includes a `parse_frames` method that
/// uses a `Parse` to extract its fields.
#[derive(Debug)]
pub(crate) struct Parse {
    /// Array frame contents, with `pos` marking how much has been consumed.
    parts: Vec<Frame>,
    pos: usize,
}

#[derive(Debug)]
pub(crate) enum ParseError {
    /// Attempting to extract a value failed due to the frame being fully
    /// consumed.
    EndOfStream,

    /// All other errors
    Other(crate::Error),
}

impl Parse {
    /// Create a new `Parse` to parse the contents of `frame`.
    ///
    /// Returns `Err` if `frame` is not an array frame.
    pub(crate) fn new(frame: Frame) -> Result<Parse, ParseError> {
        let array = match frame {
            Frame::Array(array) => array,
            frame => return Err(format!("protocol error; expected array, got {frame:?}").into()),
        };

        Ok(Parse { parts: array, pos: 0 })
    }

    /// Return the next entry. Array frames are arrays of frames, so the next
    /// entry is a frame.
    fn next(&mut self) -> Result<Frame, ParseError> {
        if self.pos >= self.parts.len() {
            return Err(ParseError::EndOfStream);
        }
        let frame = self.parts[self.pos].clone();
        self.pos += 1;
        Ok(frame)
    }

    /// Return the next entry as a string.
    ///
    /// If the next entry is not a string-like frame, an error is returned.
    pub(crate) fn next_string(&mut self) -> Result<String, ParseError> {
        match self.next()? {
            Frame::Simple(s) => Ok(s),
            Frame::Bulk(data) => str::from_utf8(&data[..])
                .map(|s| s.to_string())
                .map_err(|_| "protocol error; invalid string".into()),
            frame => Err(format!(
                "protocol error; expected simple frame or bulk frame, got {frame:?}"
            )
            .into()),
        }
    }

    /// Return the next entry as raw bytes.
    ///
    /// If the next entry cannot be represented as raw bytes, an error is
    /// returned.
    pub(crate) fn next_bytes(&mut self) -> Result<Bytes, ParseError> {
        match self.next()? {
            Frame::Simple(s) => Ok(Bytes::from(s.into_bytes())),
            Frame::Bulk(data) => Ok(data),
            frame => Err(format!(
                "protocol error; expected simple frame or bulk frame, got {frame:?}"
            )
            .into()),
        }
    }

    /// Return the next entry as an integer.
    ///
    /// This includes `Simple`, `Bulk`, and `Integer` frame types. `Simple` and
    /// `Bulk` frame types are parsed.
    ///
    /// If the next entry cannot be represented as an integer, an error is
    /// returned.
    pub(crate) fn next_int(&mut self) -> Result<u64, ParseError> {
        use atoi::atoi;

        const MSG: &str = "protocol error; invalid number";

        match self.next()? {
            Frame::Integer(v) => Ok(v as u64),
            Frame::Simple(data) => atoi::<u64>(data.as_bytes()).ok_or_else(|| MSG.into()),
            Frame::Bulk(data) => atoi::<u64>(&data).ok_or_else(|| MSG.into()),
            frame => Err(format!("protocol error; expected int frame, got {frame:?}").into()),
        }
    }

    /// Return the next entry as a signed 64-bit integer. Unlike `next_int`,
    /// this accepts a leading `-`, which most numeric arguments (LRANGE
    /// indices, EXPIRE seconds, ZADD scores as integers, ...) require.
    pub(crate) fn next_int_signed(&mut self) -> Result<i64, ParseError> {
        const MSG: &str = "protocol error; invalid number";

        match self.next()? {
            Frame::Integer(v) => Ok(v),
            Frame::Simple(data) => data.parse::<i64>().map_err(|_| MSG.into()),
            Frame::Bulk(data) => str::from_utf8(&data)
                .ok()
                .and_then(|s| s.parse::<i64>().ok())
                .ok_or_else(|| MSG.into()),
            frame => Err(format!("protocol error; expected int frame, got {frame:?}").into()),
        }
    }

    /// Return the next entry parsed as an IEEE-754 double (zset scores,
    /// INCRBYFLOAT deltas, ...).
    pub(crate) fn next_float(&mut self) -> Result<f64, ParseError> {
        const MSG: &str = "protocol error; invalid float";

        match self.next()? {
            Frame::Integer(v) => Ok(v as f64),
            Frame::Simple(data) => data.parse::<f64>().map_err(|_| MSG.into()),
            Frame::Bulk(data) => str::from_utf8(&data)
                .ok()
                .and_then(|s| s.trim().parse::<f64>().ok())
                .ok_or_else(|| MSG.into()),
            frame => Err(format!("protocol error; expected float frame, got {frame:?}").into()),
        }
    }

    /// Peek at the next entry as an uppercased string, without consuming it.
    /// Used to look ahead for option keywords (`NX`, `EX`, `LIMIT`, ...)
    /// before deciding whether to consume them.
    pub(crate) fn peek_string_upper(&self) -> Option<String> {
        match self.parts.get(self.pos)? {
            Frame::Simple(s) => Some(s.to_uppercase()),
            Frame::Bulk(data) => str::from_utf8(data).ok().map(|s| s.to_uppercase()),
            _ => None,
        }
    }

    /// Ensure there are no more entries in the array
    pub(crate) fn finish(&mut self) -> Result<(), ParseError> {
        if self.pos >= self.parts.len() {
            Ok(())
        } else {
            Err("protocol error; expected end of frame, but there was more".into())
        }
    }

    /// Check that there are no more entries, without consuming the state
    /// needed to keep iterating (used by commands that want to fall back to
    /// an "invalid" variant instead of aborting the connection on a trailing
    /// argument).
    pub(crate) fn check_finish(&mut self) -> bool {
        self.pos >= self.parts.len()
    }

    /// Returns true if there is at least one more unconsumed entry.
    pub(crate) fn has_next(&self) -> bool {
        self.pos < self.parts.len()
    }

    /// Consume and return every remaining entry as raw bytes, in order.
    pub(crate) fn remaining_bytes(&mut self) -> Result<Vec<Bytes>, ParseError> {
        let mut out = Vec::new();
        while self.has_next() {
            out.push(self.next_bytes()?);
        }
        Ok(out)
    }
}

impl From<String> for ParseError {
    fn from(src: String) -> ParseError {
        ParseError::Other(src.into())
    }
}

impl From<&str> for ParseError {
    fn from(src: &str) -> ParseError {
        src.to_string().into()
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::EndOfStream => "protocol error; unexpected end of stream".fmt(fmt),
            ParseError::Other(err) => err.fmt(fmt),
        }
    }
}

impl std::error::Error for ParseError {}
