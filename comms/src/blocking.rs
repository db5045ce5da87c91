use std::io;

use tokio::{
    net::{
        TcpStream, ToSocketAddrs,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    runtime::{self, Runtime},
};

use crate::{
    Callback, LineReceiver, LineSender,
    msg::{Ack, Update},
};

type NetRx = LineReceiver<OwnedReadHalf>;
type NetTx = LineSender<OwnedWriteHalf>;

/// A callback channel over TCP with a synchronous facade.
///
/// It owns a single threaded runtime so synchronous code, like an epoch loop, can block on
/// each exchange.
pub struct BlockingChannel {
    runtime: Runtime,
    rx: NetRx,
    tx: NetTx,
}

impl BlockingChannel {
    /// Connects to the callback recipient.
    ///
    /// # Arguments
    /// * `addr` - The network address of the recipient.
    ///
    /// # Returns
    /// A new `BlockingChannel` or an io error if the connection failed.
    pub fn connect<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        let runtime = runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let stream = runtime.block_on(TcpStream::connect(addr))?;
        let (rx, tx) = stream.into_split();
        let (rx, tx) = crate::channel(rx, tx);

        Ok(Self { runtime, rx, tx })
    }
}

impl Callback for BlockingChannel {
    fn post(&mut self, update: &Update) -> io::Result<Ack> {
        let Self { runtime, rx, tx } = self;

        runtime.block_on(async {
            tx.send(update).await?;
            rx.recv().await
        })
    }
}
