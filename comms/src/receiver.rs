use std::io;

use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// The receiving end handle of the communication.
pub struct LineReceiver<R: AsyncRead + Unpin> {
    rx: BufReader<R>,
    buf: String,
}

impl<R: AsyncRead + Unpin> LineReceiver<R> {
    /// Creates a new `LineReceiver` instance.
    ///
    /// # Arguments
    /// * `rx` - The underlying reader.
    pub(super) fn new(rx: R) -> Self {
        Self {
            rx: BufReader::new(rx),
            buf: String::new(),
        }
    }

    /// Waits to receive a new message from the inner receiver.
    ///
    /// Blank lines are skipped.
    ///
    /// # Returns
    /// A result object that returns `T` on success or `io::Error` on failure, reaching the end
    /// of the stream is an `UnexpectedEof` error.
    pub async fn recv<T: DeserializeOwned>(&mut self) -> io::Result<T> {
        loop {
            self.buf.clear();

            if self.rx.read_line(&mut self.buf).await? == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "the peer closed the channel",
                ));
            }

            let line = self.buf.trim();
            if !line.is_empty() {
                return Ok(serde_json::from_str(line)?);
            }
        }
    }
}
