//! The implementation of the sending end of the application layer protocol.

use std::io;

use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// The sending end handle of the communication.
///
/// Every message travels as a single line of JSON.
pub struct LineSender<W>
where
    W: AsyncWrite + Unpin,
{
    tx: W,
    buf: Vec<u8>,
}

impl<W: AsyncWrite + Unpin> LineSender<W> {
    /// Creates a new `LineSender` instance.
    ///
    /// # Arguments
    /// * `tx` - The underlying writer.
    pub(super) fn new(tx: W) -> Self {
        Self {
            tx,
            buf: Vec::new(),
        }
    }

    /// Sends `msg` through the inner sender.
    ///
    /// # Arguments
    /// * `msg` - A serializable object.
    ///
    /// # Returns
    /// A result object that returns `io::Error` on failure.
    pub async fn send<T: Serialize + ?Sized>(&mut self, msg: &T) -> io::Result<()> {
        let Self { buf, tx } = self;

        buf.clear();
        serde_json::to_writer(&mut *buf, msg)?;
        buf.push(b'\n');

        tx.write_all(buf).await?;
        tx.flush().await
    }
}
