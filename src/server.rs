//! Connection handling: one task per client, all fan-out through per-client
//! channels so each client sees notifications in the order they were made.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use tokio::net::TcpListener;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

use crate::common::{recover, PlayerId};
use crate::config::ServerConfig;
use crate::coordinator::{Audience, Coordinator, Dispatch, Session};
use crate::protocol::{ClientMessage, ServerMessage, PROTOCOL_VERSION};
use crate::transport::{TcpTransport, Transport};

type Outbox = UnboundedSender<ServerMessage>;
type Peers = HashMap<PlayerId, Outbox>;

/// Outbound channels of registered connections.
#[derive(Debug, Default)]
struct Hub {
    peers: Mutex<Peers>,
}

impl Hub {
    fn connected(&self) -> usize {
        recover(self.peers.lock()).len()
    }

    /// Run `apply` and queue the dispatches it returns without releasing the
    /// peers lock in between. Every outbox then receives broadcasts in the
    /// order the underlying state changed.
    fn sequenced(&self, caller: &Outbox, apply: impl FnOnce(&mut Peers) -> Vec<Dispatch>) {
        let mut peers = recover(self.peers.lock());
        let dispatches = apply(&mut peers);
        deliver(&peers, caller, dispatches);
    }
}

/// A closed outbox means that connection is going away; it is skipped.
fn deliver(peers: &Peers, caller: &Outbox, dispatches: Vec<Dispatch>) {
    for Dispatch { audience, message } in dispatches {
        match audience {
            Audience::Caller => {
                let _ = caller.send(message);
            }
            Audience::Player(player) => match peers.get(&player) {
                Some(outbox) => {
                    let _ = outbox.send(message);
                }
                None => debug!("player {} is not connected, dropping {:?}", player, message),
            },
            Audience::Everyone => {
                for outbox in peers.values() {
                    let _ = outbox.send(message.clone());
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Server {
    coordinator: Arc<Coordinator>,
    hub: Arc<Hub>,
}

impl Server {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            coordinator: Arc::new(Coordinator::new(config)),
            hub: Arc::new(Hub::default()),
        }
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Number of registered connections currently attached.
    pub fn connected(&self) -> usize {
        self.hub.connected()
    }

    /// Accept TCP clients forever, one task each.
    pub async fn run(&self, listener: TcpListener) -> anyhow::Result<()> {
        info!("listening on {}", listener.local_addr()?);
        loop {
            let (stream, addr) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("accept failed: {}", e);
                    continue;
                }
            };
            if let Err(e) = stream.set_nodelay(true) {
                debug!("set_nodelay for {} failed: {}", addr, e);
            }
            info!("client connected from {}", addr);

            let server = self.clone();
            tokio::spawn(async move {
                let transport = TcpTransport::<ServerMessage, ClientMessage>::new(stream);
                if let Err(e) = server.serve_connection(transport).await {
                    info!("connection from {} closed: {}", addr, e);
                }
            });
        }
    }

    /// Drive one client until its transport fails or closes.
    pub async fn serve_connection<T>(&self, mut transport: T) -> anyhow::Result<()>
    where
        T: Transport<ServerMessage, ClientMessage>,
    {
        handshake(&mut transport).await?;

        let (outbox, mut inbox) = unbounded_channel();
        let mut session = Session::new();
        let result = loop {
            tokio::select! {
                inbound = transport.recv() => {
                    match inbound {
                        Ok(message) => self.on_message(&mut session, &outbox, message),
                        Err(e) => break Err(e),
                    }
                }
                Some(outbound) = inbox.recv() => {
                    if let Err(e) = transport.send(outbound).await {
                        break Err(e);
                    }
                }
            }
        };

        if let Some(player) = session.player() {
            self.on_disconnect(player, &outbox);
            debug!("player {} detached", player);
        }
        result
    }

    fn on_message(&self, session: &mut Session, outbox: &Outbox, message: ClientMessage) {
        self.hub.sequenced(outbox, |peers| {
            let registered = session.player();
            let dispatches = self.coordinator.handle(session, message);
            if let (None, Some(player)) = (registered, session.player()) {
                peers.insert(player, outbox.clone());
            }
            dispatches
        });
    }

    fn on_disconnect(&self, player: PlayerId, outbox: &Outbox) {
        self.hub.sequenced(outbox, |peers| {
            peers.remove(&player);
            self.coordinator.disconnect(player)
        });
    }
}

async fn handshake<T>(transport: &mut T) -> anyhow::Result<()>
where
    T: Transport<ServerMessage, ClientMessage>,
{
    match transport.recv().await? {
        ClientMessage::Handshake { version } if version == PROTOCOL_VERSION => {
            transport
                .send(ServerMessage::HandshakeAck {
                    version: PROTOCOL_VERSION,
                })
                .await
        }
        ClientMessage::Handshake { version } => {
            warn!(
                "handshake protocol version mismatch: expected {}, peer sent {}",
                PROTOCOL_VERSION, version
            );
            transport
                .send(ServerMessage::error(format!(
                    "unsupported protocol version {}",
                    version
                )))
                .await?;
            Err(anyhow::anyhow!(
                "Protocol version mismatch in Handshake: expected {}, got {}",
                PROTOCOL_VERSION,
                version
            ))
        }
        other => {
            warn!("expected Handshake, got {:?}", other);
            Err(anyhow::anyhow!(
                "Expected Handshake, got unexpected message (closing session)"
            ))
        }
    }
}
