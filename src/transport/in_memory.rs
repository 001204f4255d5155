use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::transport::Transport;

/// One end of an in-process channel pair.
pub struct InMemoryTransport<Tx, Rx> {
    tx: UnboundedSender<Tx>,
    rx: UnboundedReceiver<Rx>,
}

impl<Tx, Rx> InMemoryTransport<Tx, Rx> {
    pub fn pair() -> (Self, InMemoryTransport<Rx, Tx>) {
        let (left_tx, left_rx) = unbounded_channel();
        let (right_tx, right_rx) = unbounded_channel();
        (
            Self {
                tx: left_tx,
                rx: right_rx,
            },
            InMemoryTransport {
                tx: right_tx,
                rx: left_rx,
            },
        )
    }
}

#[async_trait::async_trait]
impl<Tx, Rx> Transport<Tx, Rx> for InMemoryTransport<Tx, Rx>
where
    Tx: Send + 'static,
    Rx: Send + 'static,
{
    async fn send(&mut self, msg: Tx) -> anyhow::Result<()> {
        self.tx
            .send(msg)
            .map_err(|_| anyhow::anyhow!("Channel closed"))
    }

    async fn recv(&mut self) -> anyhow::Result<Rx> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| anyhow::anyhow!("Channel closed"))
    }
}
