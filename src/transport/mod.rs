//! Message transports between the server and its clients. `Tx` is what this
//! end sends, `Rx` what it receives.

#[async_trait::async_trait]
pub trait Transport<Tx, Rx>: Send
where
    Tx: Send + 'static,
    Rx: Send + 'static,
{
    async fn send(&mut self, msg: Tx) -> anyhow::Result<()>;

    /// Wait for the next message. Cancel safe: a dropped call loses nothing.
    async fn recv(&mut self) -> anyhow::Result<Rx>;
}

pub mod in_memory;
pub mod tcp;

pub use in_memory::InMemoryTransport;
pub use tcp::{TcpTransport, DEFAULT_TIMEOUT, MAX_FRAME_SIZE};
