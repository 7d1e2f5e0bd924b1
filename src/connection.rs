use crate::frame::{self, Frame};

use bytes::{Buf, BytesMut};
use std::io::{self, Cursor};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;

/// Send and receive `Frame` values from a remote peer.
///
/// Implemented as a buffered `TcpStream`. Reading is performed by first
/// buffering data into an in-memory buffer, then parsing the buffer to find a
/// complete frame. When a full frame is parsed, any data left over in the
/// read buffer stays there for the next call.
///
/// When sending frames, the frame is first encoded into the write buffer.
/// The contents of the write buffer are then written to the socket.
#[derive(Debug)]
pub struct Connection {
    stream: BufWriter<TcpStream>,
    buffer: BytesMut,
}

impl Connection {
    /// Create a new `Connection`, backed by `socket`. Read and write buffers
    /// are initialized.
    pub fn new(socket: TcpStream) -> Connection {
        Connection {
            stream: BufWriter::new(socket),
            buffer: BytesMut::with_capacity(4 * 1024),
        }
    }

    /// Read a single `Frame` value from the underlying stream.
    ///
    /// The function waits until it has retrieved enough data to parse a
    /// frame. Any data remaining in the read buffer after the frame has been
    /// parsed is kept there for the next call to `read_frame`.
    ///
    /// # Returns
    ///
    /// On success, the received frame is returned. If the `TcpStream` is
    /// closed in a way that doesn't break a frame in half, it returns `None`.
    /// Otherwise, an error is returned.
    pub async fn read_frame(&mut self) -> crate::Result<Option<Frame>> {
        loop {
            // Attempt to parse a frame from the buffered data. If enough data
            // has been buffered, the frame is returned.
            if let Some(frame) = self.parse_frame()? {
                return Ok(Some(frame));
            }

            // There is not enough buffered data to read a frame. Attempt to
            // read more data from the socket.
            //
            // On success, the number of bytes is returned. `0` indicates "end
            // of stream".
            if 0 == self.stream.read_buf(&mut self.buffer).await? {
                // The remote closed the connection. For this to be a clean
                // shutdown, there should be no data in the read buffer. If
                // there is, this means that the peer closed the socket while
                // sending a frame.
                if self.buffer.is_empty() {
                    return Ok(None);
                } else {
                    return Err("connection reset by peer".into());
                }
            }
        }
    }

    /// Attempt to parse a frame from the buffer. If the buffer contains
    /// enough data, the frame is returned and the data removed from the
    /// buffer. If not enough data has been buffered yet, `Ok(None)` is
    /// returned. If the buffered data does not represent a valid frame,
    /// `Err` is returned.
    fn parse_frame(&mut self) -> crate::Result<Option<Frame>> {
        use frame::Error::Incomplete;

        if self.buffer.is_empty() {
            return Ok(None);
        }

        // An inline command never starts with a RESP type byte.
        if !matches!(self.buffer[0], b'+' | b'-' | b':' | b'$' | b'*') {
            return self.parse_inline();
        }

        // Cursor is used to track the "current" location in the buffer.
        let mut buf = Cursor::new(&self.buffer[..]);

        // The first step is to check if enough data has been buffered to
        // parse a single frame. This step is usually much faster than doing a
        // full parse of the frame, and allows us to skip allocating data
        // structures to hold the frame data unless we know the full frame has
        // been received.
        match Frame::check(&mut buf) {
            Ok(_) => {
                // The `check` function will have advanced the cursor until
                // the end of the frame. Since the cursor had position set to
                // zero before `Frame::check` was called, we obtain the length
                // of the frame by checking the cursor position.
                let len = buf.position() as usize;

                // Reset the position to zero before passing the cursor to
                // `Frame::parse`.
                buf.set_position(0);

                // Parse the frame from the buffer. This allocates the
                // necessary structures to represent the frame and returns the
                // frame value.
                let frame = Frame::parse(&mut buf)?;

                // Discard the parsed data from the read buffer.
                self.buffer.advance(len);

                // Return the parsed frame to the caller.
                Ok(Some(frame))
            }
            // There is not enough data present in the read buffer to parse a
            // single frame. We must wait for more data to be received from
            // the socket. Reading from the socket will be done in the
            // statement after this `match`.
            Err(Incomplete) => Ok(None),
            // An error was encountered while parsing the frame. The
            // connection is now in an invalid state. Returning `Err` from
            // here will result in the connection being closed.
            Err(e) => Err(e.into()),
        }
    }

    /// Parse the buffered data as a single whitespace-separated inline
    /// command line, the one-line fallback accepted alongside the
    /// array-of-bulk-strings form.
    fn parse_inline(&mut self) -> crate::Result<Option<Frame>> {
        if let Some(pos) = self.buffer.windows(2).position(|w| w == b"\r\n") {
            let line = self.buffer.split_to(pos + 2);
            let line = &line[..line.len() - 2];
            match Frame::parse_inline(line) {
                Some(frame) => Ok(Some(frame)),
                None => Ok(Some(Frame::Array(vec![]))),
            }
        } else if let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line = self.buffer.split_to(pos + 1);
            let line = &line[..line.len() - 1];
            match Frame::parse_inline(line) {
                Some(frame) => Ok(Some(frame)),
                None => Ok(Some(Frame::Array(vec![]))),
            }
        } else {
            Ok(None)
        }
    }

    /// Write a single `Frame` value to the underlying stream.
    ///
    /// The `Frame` value is written to the socket using the various `write_*`
    /// functions provided by `AsyncWrite`. Calling these functions directly on
    /// a `TcpStream` is **not** advised, as this will result in a large
    /// number of syscalls. However, it is fine to call these functions on a
    /// *buffered* write stream. The data will be written to the buffer.
    /// Once the buffer is full, it is flushed to the underlying socket.
    pub async fn write_frame(&mut self, frame: &Frame) -> io::Result<()> {
        self.write_value(frame).await?;
        self.stream.flush().await
    }

    /// Write a frame literal to the stream, without flushing the underlying
    /// socket. This is used internally so several frames can be buffered into
    /// a single write (e.g. when writing out the results of a `MULTI` /
    /// `EXEC` transaction).
    #[async_recursion::async_recursion]
    async fn write_value(&mut self, frame: &Frame) -> io::Result<()> {
        match frame {
            Frame::Simple(val) => {
                self.stream.write_u8(b'+').await?;
                self.stream.write_all(val.as_bytes()).await?;
                self.stream.write_all(b"\r\n").await?;
            }
            Frame::Error(val) => {
                self.stream.write_u8(b'-').await?;
                self.stream.write_all(val.as_bytes()).await?;
                self.stream.write_all(b"\r\n").await?;
            }
            Frame::Integer(val) => {
                self.stream.write_u8(b':').await?;
                self.write_decimal(*val).await?;
            }
            Frame::Null => {
                self.stream.write_all(b"$-1\r\n").await?;
            }
            Frame::NullArray => {
                self.stream.write_all(b"*-1\r\n").await?;
            }
            Frame::Bulk(val) => {
                let len = val.len();
                self.stream.write_u8(b'$').await?;
                self.write_decimal(len as i64).await?;
                self.stream.write_all(val).await?;
                self.stream.write_all(b"\r\n").await?;
            }
            Frame::Array(val) => {
                self.stream.write_u8(b'*').await?;
                self.write_decimal(val.len() as i64).await?;

                for entry in &**val {
                    self.write_value(entry).await?;
                }
            }
        }

        Ok(())
    }

    /// Write a decimal frame to the stream
    async fn write_decimal(&mut self, val: i64) -> io::Result<()> {
        use std::io::Write;

        let mut buf = [0u8; 20];
        let mut buf = Cursor::new(&mut buf[..]);
        write!(&mut buf, "{val}")?;

        let pos = buf.position() as usize;
        self.stream.write_all(&buf.get_ref()[..pos]).await?;
        self.stream.write_all(b"\r\n").await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_parses_into_bulk_array() {
        let frame = Frame::parse_inline(b"ping").unwrap();
        match frame {
            Frame::Array(parts) => assert_eq!(parts.len(), 1),
            _ => panic!("expected array"),
        }
    }
}
