use std::io::{self, Write};

use crate::msg::{Ack, Update};

/// The outbound end of the callback channel.
///
/// Posting is a request/response exchange: the caller is suspended until the recipient
/// acknowledges the update, and the acknowledgment is the only way the recipient has of
/// cancelling an ongoing job.
pub trait Callback {
    /// Delivers an update and waits for its acknowledgment.
    ///
    /// # Arguments
    /// * `update` - The update to deliver.
    ///
    /// # Returns
    /// The recipient's acknowledgment or an io error if the exchange failed.
    fn post(&mut self, update: &Update) -> io::Result<Ack>;
}

impl<C: Callback + ?Sized> Callback for &mut C {
    fn post(&mut self, update: &Update) -> io::Result<Ack> {
        (**self).post(update)
    }
}

impl<C: Callback + ?Sized> Callback for Box<C> {
    fn post(&mut self, update: &Update) -> io::Result<Ack> {
        (**self).post(update)
    }
}

/// A one way callback that writes every update as a line of JSON, it never cancels.
pub struct WriterChannel<W: Write> {
    tx: W,
}

impl<W: Write> WriterChannel<W> {
    pub fn new(tx: W) -> Self {
        Self { tx }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.tx
    }
}

impl<W: Write> Callback for WriterChannel<W> {
    fn post(&mut self, update: &Update) -> io::Result<Ack> {
        serde_json::to_writer(&mut self.tx, update)?;
        self.tx.write_all(b"\n")?;
        self.tx.flush()?;
        Ok(Ack::default())
    }
}
