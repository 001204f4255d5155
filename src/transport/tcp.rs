use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::{timeout, Duration};

use crate::transport::Transport;

/// Default timeout for a single send (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum frame payload (1 MiB).
pub const MAX_FRAME_SIZE: u32 = 1 << 20;

const LEN_PREFIX: usize = 4;
const READ_CHUNK: usize = 4096;

/// Length-prefixed bincode frames over TCP: a big-endian `u32` payload
/// length followed by the payload.
pub struct TcpTransport<Tx, Rx> {
    stream: TcpStream,
    /// Bytes read but not yet consumed as a frame.
    buffer: Vec<u8>,
    timeout_duration: Duration,
    max_frame_size: u32,
    _marker: PhantomData<fn(Tx) -> Rx>,
}

impl<Tx, Rx> TcpTransport<Tx, Rx> {
    pub fn new(stream: TcpStream) -> Self {
        Self::with_config(stream, DEFAULT_TIMEOUT, MAX_FRAME_SIZE)
    }

    pub fn with_config(
        stream: TcpStream,
        timeout_duration: Duration,
        max_frame_size: u32,
    ) -> Self {
        Self {
            stream,
            buffer: Vec::new(),
            timeout_duration,
            max_frame_size,
            _marker: PhantomData,
        }
    }

    pub async fn connect<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }

    /// Split one complete frame off the front of the buffer.
    fn take_frame(&mut self) -> anyhow::Result<Option<Vec<u8>>> {
        if self.buffer.len() < LEN_PREFIX {
            return Ok(None);
        }
        let mut len_buf = [0u8; LEN_PREFIX];
        len_buf.copy_from_slice(&self.buffer[..LEN_PREFIX]);
        let len = u32::from_be_bytes(len_buf);

        if len == 0 {
            return Err(anyhow::anyhow!("Invalid message length: 0"));
        }
        if len > self.max_frame_size {
            return Err(anyhow::anyhow!(
                "Message too large: {} bytes (max: {})",
                len,
                self.max_frame_size
            ));
        }

        let end = LEN_PREFIX + len as usize;
        if self.buffer.len() < end {
            return Ok(None);
        }
        let frame = self.buffer[LEN_PREFIX..end].to_vec();
        self.buffer.drain(..end);
        Ok(Some(frame))
    }
}

fn io_error(e: std::io::Error) -> anyhow::Error {
    match e.kind() {
        std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::ConnectionReset => {
            anyhow::anyhow!("Connection closed by peer")
        }
        _ => anyhow::anyhow!("I/O error: {}", e),
    }
}

#[async_trait::async_trait]
impl<Tx, Rx> Transport<Tx, Rx> for TcpTransport<Tx, Rx>
where
    Tx: Serialize + Send + 'static,
    Rx: DeserializeOwned + Send + 'static,
{
    async fn send(&mut self, msg: Tx) -> anyhow::Result<()> {
        let data =
            bincode::serialize(&msg).map_err(|e| anyhow::anyhow!("Serialization error: {}", e))?;
        if data.len() > self.max_frame_size as usize {
            return Err(anyhow::anyhow!(
                "Message too large: {} bytes (max: {})",
                data.len(),
                self.max_frame_size
            ));
        }

        let mut frame = Vec::with_capacity(LEN_PREFIX + data.len());
        frame.extend_from_slice(&(data.len() as u32).to_be_bytes());
        frame.extend_from_slice(&data);

        let write = async {
            self.stream.write_all(&frame).await.map_err(io_error)?;
            self.stream.flush().await.map_err(io_error)
        };
        timeout(self.timeout_duration, write)
            .await
            .map_err(|_| anyhow::anyhow!("Send timeout after {:?}", self.timeout_duration))?
    }

    /// Waits without a deadline; idle clients are normal between games.
    async fn recv(&mut self) -> anyhow::Result<Rx> {
        loop {
            if let Some(frame) = self.take_frame()? {
                return bincode::deserialize(&frame)
                    .map_err(|e| anyhow::anyhow!("Deserialization error: {}", e));
            }
            let mut chunk = [0u8; READ_CHUNK];
            let n = self.stream.read(&mut chunk).await.map_err(io_error)?;
            if n == 0 {
                return Err(anyhow::anyhow!("Connection closed by peer"));
            }
            self.buffer.extend_from_slice(&chunk[..n]);
        }
    }
}
