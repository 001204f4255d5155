//! Maps inbound client events onto the stores and decides who hears about
//! the result. No I/O happens here.

use std::sync::Mutex;

use log::{debug, info, warn};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::common::{recover, GameId, Outcome, PlayerId, RoomId, ServerResult};
use crate::config::ServerConfig;
use crate::game::{AttackReport, ShipsSubmitted};
use crate::grid::Position;
use crate::lobby::Lobby;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::ship::ShipPlacement;

/// Who a notification is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// The connection that sent the event, registered or not.
    Caller,
    Player(PlayerId),
    /// Every registered connection.
    Everyone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub audience: Audience,
    pub message: ServerMessage,
}

impl Dispatch {
    pub fn caller(message: ServerMessage) -> Self {
        Self {
            audience: Audience::Caller,
            message,
        }
    }

    pub fn player(id: PlayerId, message: ServerMessage) -> Self {
        Self {
            audience: Audience::Player(id),
            message,
        }
    }

    pub fn everyone(message: ServerMessage) -> Self {
        Self {
            audience: Audience::Everyone,
            message,
        }
    }
}

/// Per-connection state: which player, if any, the connection speaks for.
#[derive(Debug, Default, Clone)]
pub struct Session {
    player: Option<PlayerId>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player(&self) -> Option<PlayerId> {
        self.player
    }
}

#[derive(Debug)]
pub struct Coordinator {
    lobby: Lobby,
    rng: Mutex<SmallRng>,
}

impl Coordinator {
    pub fn new(config: &ServerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_rng(&mut rand::rng()),
        };
        Self {
            lobby: Lobby::new(config.placement),
            rng: Mutex::new(rng),
        }
    }

    pub fn lobby(&self) -> &Lobby {
        &self.lobby
    }

    /// Apply one inbound event. Precondition failures come back to the
    /// caller as `Error`; rejected moves produce no dispatch at all.
    pub fn handle(&self, session: &mut Session, message: ClientMessage) -> Vec<Dispatch> {
        match self.route(session, message) {
            Ok(dispatches) => dispatches,
            Err(e) => {
                warn!("request from {:?} failed: {}", session.player, e);
                vec![Dispatch::caller(ServerMessage::error(e))]
            }
        }
    }

    /// Forget the waiting rooms of a player whose connection went away.
    pub fn disconnect(&self, player: PlayerId) -> Vec<Dispatch> {
        match self.lobby.rooms().leave(player) {
            Some(rooms) => {
                info!("closed the open room of departed player {}", player);
                vec![Dispatch::everyone(ServerMessage::RoomsUpdated(
                    self.lobby.room_views(&rooms),
                ))]
            }
            None => Vec::new(),
        }
    }

    fn route(&self, session: &mut Session, message: ClientMessage) -> ServerResult<Vec<Dispatch>> {
        let caller = match (&message, session.player) {
            (ClientMessage::Register { name }, None) => return Ok(self.register(session, name)),
            (ClientMessage::Register { .. }, Some(_)) => {
                return Ok(vec![Dispatch::caller(ServerMessage::error(
                    "connection is already registered",
                ))])
            }
            (ClientMessage::Handshake { .. }, _) => {
                return Ok(vec![Dispatch::caller(ServerMessage::error(
                    "handshake already completed",
                ))])
            }
            (_, None) => {
                return Ok(vec![Dispatch::caller(ServerMessage::error(
                    "register before sending game events",
                ))])
            }
            (_, Some(player)) => player,
        };

        match message {
            ClientMessage::CreateRoom => Ok(self.create_room(caller)),
            ClientMessage::JoinRoom { room_id } => self.join_room(caller, room_id),
            ClientMessage::SubmitShips { game_id, ships } => {
                self.submit_ships(caller, game_id, &ships)
            }
            ClientMessage::Attack {
                game_id,
                x,
                y,
                attacker,
            } => self.attack(game_id, Position::new(x, y), attacker),
            ClientMessage::RandomAttack { game_id, attacker } => {
                self.random_attack(game_id, attacker)
            }
            ClientMessage::Register { .. } | ClientMessage::Handshake { .. } => Ok(Vec::new()),
        }
    }

    fn register(&self, session: &mut Session, name: &str) -> Vec<Dispatch> {
        let registration = self.lobby.register(name);
        session.player = Some(registration.player.id);
        info!(
            "player {} registered as {:?}",
            registration.player.id, registration.player.name
        );
        vec![
            Dispatch::caller(ServerMessage::Registered {
                player: registration.player,
            }),
            Dispatch::caller(ServerMessage::RoomsUpdated(registration.rooms)),
            Dispatch::caller(ServerMessage::WinnersUpdated(registration.leaderboard)),
        ]
    }

    fn create_room(&self, caller: PlayerId) -> Vec<Dispatch> {
        let rooms = self.lobby.rooms().create_or_join_room(caller);
        vec![Dispatch::everyone(ServerMessage::RoomsUpdated(
            self.lobby.room_views(&rooms),
        ))]
    }

    fn join_room(&self, caller: PlayerId, room: RoomId) -> ServerResult<Vec<Dispatch>> {
        let host = self.lobby.rooms().peek_first_occupant(room)?;
        let rooms = match self.lobby.rooms().join_room(room, caller)? {
            Outcome::Applied(rooms) => rooms,
            Outcome::Rejected => {
                debug!("player {} may not join room {}", caller, room);
                return Ok(Vec::new());
            }
        };

        if host.is_none() {
            return Ok(vec![Dispatch::caller(ServerMessage::RoomsUpdated(
                self.lobby.room_views(&rooms),
            ))]);
        }

        let created = self.lobby.games().create_game(room, caller)?;
        let mut dispatches: Vec<Dispatch> = created
            .seats
            .iter()
            .map(|seat| Dispatch::player(seat.player_id, ServerMessage::GameCreated(*seat)))
            .collect();
        dispatches.push(Dispatch::everyone(ServerMessage::RoomsUpdated(
            self.lobby.room_views(&created.rooms),
        )));
        Ok(dispatches)
    }

    fn submit_ships(
        &self,
        caller: PlayerId,
        game: GameId,
        ships: &[ShipPlacement],
    ) -> ServerResult<Vec<Dispatch>> {
        let start = match self.lobby.games().submit_ships(game, caller, ships)? {
            Outcome::Applied(ShipsSubmitted::Started(start)) => start,
            Outcome::Applied(ShipsSubmitted::Waiting) | Outcome::Rejected => return Ok(Vec::new()),
        };

        let mut dispatches = Vec::with_capacity(4);
        for fleet in start.fleets {
            let player = fleet.player_id;
            dispatches.push(Dispatch::player(
                player,
                ServerMessage::GameStarted {
                    ships: fleet.ships,
                    current_player_index: player,
                },
            ));
            dispatches.push(Dispatch::player(player, ServerMessage::Turn(start.turn)));
        }
        Ok(dispatches)
    }

    fn attack(
        &self,
        game: GameId,
        target: Position,
        attacker: PlayerId,
    ) -> ServerResult<Vec<Dispatch>> {
        match self
            .lobby
            .games()
            .attack(game, target.x, target.y, attacker)?
        {
            Outcome::Applied(report) => Ok(self.attack_dispatches(report)),
            Outcome::Rejected => Ok(Vec::new()),
        }
    }

    fn random_attack(&self, game: GameId, attacker: PlayerId) -> ServerResult<Vec<Dispatch>> {
        let target = {
            let mut rng = recover(self.rng.lock());
            self.lobby
                .games()
                .pick_random_untargeted_cell(game, attacker, &mut *rng)?
        };
        match target {
            Some(target) => self.attack(game, target, attacker),
            None => {
                debug!("player {} has no cells left to fire at in {}", attacker, game);
                Ok(Vec::new())
            }
        }
    }

    fn attack_dispatches(&self, report: AttackReport) -> Vec<Dispatch> {
        let mut dispatches = Vec::new();
        for player in report.player_ids {
            dispatches.push(Dispatch::player(
                player,
                ServerMessage::Attack(report.attack_result),
            ));
            for miss in &report.halo_misses {
                dispatches.push(Dispatch::player(player, ServerMessage::Attack(*miss)));
            }
            dispatches.push(Dispatch::player(player, ServerMessage::Turn(report.turn)));
            if report.is_finished {
                dispatches.push(Dispatch::player(
                    player,
                    ServerMessage::Finished {
                        win_player: report.attack_result.current_player,
                    },
                ));
            }
        }
        if report.is_finished {
            dispatches.push(Dispatch::everyone(ServerMessage::WinnersUpdated(
                self.lobby.players().leaderboard(),
            )));
        }
        dispatches
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new(&ServerConfig::default())
    }
}
