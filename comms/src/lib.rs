mod blocking;
mod callback;
pub mod msg;
mod receiver;
mod sender;
pub mod specs;

use tokio::io::{AsyncRead, AsyncWrite};

pub use blocking::BlockingChannel;
pub use callback::{Callback, WriterChannel};
pub use receiver::LineReceiver;
pub use sender::LineSender;

/// Creates both `LineReceiver` and `LineSender` network channel parts.
///
/// Given a writer and reader creates and returns both ends of the communication.
///
/// # Arguments
/// * `rx` - An async readable.
/// * `tx` - An async writable.
///
/// # Returns
/// A communication stream in the form of a line receiver and sender.
pub fn channel<R, W>(rx: R, tx: W) -> (LineReceiver<R>, LineSender<W>)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    (LineReceiver::new(rx), LineSender::new(tx))
}
