//! A client that plays by firing at random untargeted cells.

use log::{debug, info};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::common::{GameId, PlayerId, RoomId};
use crate::protocol::{ClientMessage, ServerMessage, PROTOCOL_VERSION};
use crate::server::Server;
use crate::ship::random_fleet;
use crate::transport::{InMemoryTransport, Transport};

/// How a finished game went for one bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotOutcome {
    pub player: PlayerId,
    pub game: GameId,
    pub won: bool,
    /// Attack requests sent, including any the server ignored.
    pub shots: u32,
}

pub struct RandomBot<T> {
    transport: T,
    rng: SmallRng,
    player: Option<PlayerId>,
}

impl<T> RandomBot<T>
where
    T: Transport<ClientMessage, ServerMessage>,
{
    /// Complete the handshake over `transport`.
    pub async fn connect(mut transport: T, rng: SmallRng) -> anyhow::Result<Self> {
        transport
            .send(ClientMessage::Handshake {
                version: PROTOCOL_VERSION,
            })
            .await?;
        match transport.recv().await? {
            ServerMessage::HandshakeAck { version } if version == PROTOCOL_VERSION => {}
            ServerMessage::HandshakeAck { version } => {
                return Err(anyhow::anyhow!(
                    "Protocol version mismatch in HandshakeAck: expected {}, got {}",
                    PROTOCOL_VERSION,
                    version
                ))
            }
            other => return Err(anyhow::anyhow!("Expected HandshakeAck, got {:?}", other)),
        }
        Ok(Self {
            transport,
            rng,
            player: None,
        })
    }

    pub fn player(&self) -> Option<PlayerId> {
        self.player
    }

    pub async fn register(&mut self, name: &str) -> anyhow::Result<PlayerId> {
        self.transport
            .send(ClientMessage::Register {
                name: name.to_string(),
            })
            .await?;
        loop {
            match self.transport.recv().await? {
                ServerMessage::Registered { player } => {
                    self.player = Some(player.id);
                    return Ok(player.id);
                }
                ServerMessage::Error { reason } => {
                    return Err(anyhow::anyhow!("register refused: {}", reason))
                }
                _ => {}
            }
        }
    }

    /// Open a room and wait until it shows up in the room list.
    pub async fn host(&mut self) -> anyhow::Result<RoomId> {
        let me = self.me()?;
        self.transport.send(ClientMessage::CreateRoom).await?;
        loop {
            match self.transport.recv().await? {
                ServerMessage::RoomsUpdated(rooms) => {
                    let hosted = rooms
                        .iter()
                        .find(|room| room.occupants.iter().any(|o| o.id == me));
                    if let Some(room) = hosted {
                        return Ok(room.room_id);
                    }
                }
                ServerMessage::Error { reason } => {
                    return Err(anyhow::anyhow!("create room refused: {}", reason))
                }
                _ => {}
            }
        }
    }

    pub async fn join(&mut self, room: RoomId) -> anyhow::Result<()> {
        self.me()?;
        self.transport
            .send(ClientMessage::JoinRoom { room_id: room })
            .await
    }

    /// Play one game to the end: submit a random fleet once seated, then
    /// fire whenever the turn is ours.
    pub async fn play(&mut self) -> anyhow::Result<BotOutcome> {
        let me = self.me()?;
        let mut game = None;
        let mut shots = 0;
        loop {
            match self.transport.recv().await? {
                ServerMessage::GameCreated(seat) if seat.player_id == me => {
                    let fleet = random_fleet(&mut self.rng)?;
                    debug!("bot {} submitting {} ships", me, fleet.len());
                    game = Some(seat.game_id);
                    self.transport
                        .send(ClientMessage::SubmitShips {
                            game_id: seat.game_id,
                            ships: fleet,
                        })
                        .await?;
                }
                ServerMessage::Turn(turn) if turn.current_player == me => {
                    if let Some(game_id) = game {
                        shots += 1;
                        self.transport
                            .send(ClientMessage::RandomAttack {
                                game_id,
                                attacker: me,
                            })
                            .await?;
                    }
                }
                ServerMessage::Finished { win_player } => {
                    let game = game.ok_or_else(|| anyhow::anyhow!("Finished before GameCreated"))?;
                    return Ok(BotOutcome {
                        player: me,
                        game,
                        won: win_player == me,
                        shots,
                    });
                }
                ServerMessage::Error { reason } => {
                    return Err(anyhow::anyhow!("server error: {}", reason))
                }
                _ => {}
            }
        }
    }

    fn me(&self) -> anyhow::Result<PlayerId> {
        self.player
            .ok_or_else(|| anyhow::anyhow!("bot is not registered"))
    }
}

/// Two bots play each other on `server` over in-memory transports.
pub async fn play_demo(server: &Server, seed: Option<u64>) -> anyhow::Result<[BotOutcome; 2]> {
    let rng_for = |offset: u64| match seed {
        Some(s) => SmallRng::seed_from_u64(s.wrapping_add(offset)),
        None => SmallRng::from_rng(&mut rand::rng()),
    };

    let mut bots = Vec::with_capacity(2);
    for (offset, name) in [(1, "Alice"), (2, "Bob")] {
        let (client, server_end) = InMemoryTransport::<ClientMessage, ServerMessage>::pair();
        let server = server.clone();
        tokio::spawn(async move {
            if let Err(e) = server.serve_connection(server_end).await {
                debug!("demo connection closed: {}", e);
            }
        });
        let mut bot = RandomBot::connect(client, rng_for(offset)).await?;
        bot.register(name).await?;
        bots.push(bot);
    }

    let mut guest = bots.pop().ok_or_else(|| anyhow::anyhow!("missing guest bot"))?;
    let mut host = bots.pop().ok_or_else(|| anyhow::anyhow!("missing host bot"))?;
    let room = host.host().await?;
    guest.join(room).await?;
    info!("demo game starting in room {}", room);

    let (host_outcome, guest_outcome) = tokio::try_join!(host.play(), guest.play())?;
    Ok([host_outcome, guest_outcome])
}
