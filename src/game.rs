//! Game engine: promotes full rooms to games, collects fleets, resolves
//! attacks and credits the winner.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::common::{recover, GameId, Outcome, PlayerId, RoomId, ServerError, ServerResult};
use crate::grid::{new_shot_grid, Position, ShotGrid};
use crate::players::PlayerStore;
use crate::rooms::{Room, RoomRegistry};
use crate::ship::{expand_ship, validate_fleet, PlacementPolicy, Ship, ShipPlacement};

/// Lifecycle of a game. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Seated, no fleet submitted.
    Forming,
    /// One fleet submitted.
    Placement,
    /// Both fleets in, `turn` set.
    Active,
    Finished { winner: PlayerId },
}

/// Classification of a single shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackStatus {
    Miss,
    Shot,
    Killed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub current_player: PlayerId,
}

/// What happened at one cell, as told to both players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackFeedback {
    pub position: Position,
    pub current_player: PlayerId,
    pub status: AttackStatus,
}

/// Per-player payload announcing a new game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatAssignment {
    pub player_id: PlayerId,
    pub game_id: GameId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameCreated {
    pub game_id: GameId,
    /// Room-occupant order.
    pub player_ids: [PlayerId; 2],
    pub seats: [SeatAssignment; 2],
    /// Open rooms after the promoted room was removed.
    pub rooms: Vec<Room>,
}

/// Per-player payload announcing the start of play: the player's own fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetReveal {
    pub player_id: PlayerId,
    pub ships: Vec<Ship>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameStart {
    /// Submission order; the first entry moves first.
    pub player_ids: [PlayerId; 2],
    pub fleets: [FleetReveal; 2],
    pub turn: Turn,
}

/// Result of an accepted fleet submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShipsSubmitted {
    /// First fleet stored; nothing to announce yet.
    Waiting,
    Started(GameStart),
}

impl ShipsSubmitted {
    pub fn is_game_start(&self) -> bool {
        matches!(self, ShipsSubmitted::Started(_))
    }
}

/// Result of an accepted attack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackReport {
    pub turn: Turn,
    pub is_finished: bool,
    pub attack_result: AttackFeedback,
    /// Cells around a sunk ship, auto-marked as misses. Empty unless `Killed`.
    pub halo_misses: Vec<AttackFeedback>,
    pub player_ids: [PlayerId; 2],
}

/// What is kept of a game once it has been won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishedGame {
    pub game_id: GameId,
    /// Room-occupant order.
    pub player_ids: [PlayerId; 2],
    pub winner: PlayerId,
}

impl FinishedGame {
    fn check_seated(&self, player: PlayerId) -> ServerResult<()> {
        if self.player_ids.contains(&player) {
            Ok(())
        } else {
            Err(ServerError::NotInGame {
                game: self.game_id,
                player,
            })
        }
    }
}

#[derive(Debug, Clone)]
struct Seat {
    player: PlayerId,
    fleet: Option<Vec<Ship>>,
    /// Cells this player has fired at on the opponent's board.
    shots: ShotGrid,
}

/// A match between two seated players.
#[derive(Debug, Clone)]
pub struct Game {
    id: GameId,
    /// Room-occupant order.
    seats: [Seat; 2],
    /// Seat indices in the order fleets were first submitted.
    submissions: Vec<usize>,
    turn: Option<PlayerId>,
    phase: GamePhase,
}

impl Game {
    fn new(id: GameId, players: [PlayerId; 2]) -> Self {
        let seat = |player| Seat {
            player,
            fleet: None,
            shots: new_shot_grid(),
        };
        Self {
            id,
            seats: [seat(players[0]), seat(players[1])],
            submissions: Vec::with_capacity(2),
            turn: None,
            phase: GamePhase::Forming,
        }
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn turn(&self) -> Option<PlayerId> {
        self.turn
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, GamePhase::Finished { .. })
    }

    /// Seated players: submission order once started, room order before.
    pub fn player_ids(&self) -> [PlayerId; 2] {
        match self.submissions.as_slice() {
            [first, second] => [self.seats[*first].player, self.seats[*second].player],
            _ => [self.seats[0].player, self.seats[1].player],
        }
    }

    pub fn fleet(&self, player: PlayerId) -> ServerResult<Option<&[Ship]>> {
        let seat = self.seat_index(player)?;
        Ok(self.seats[seat].fleet.as_deref())
    }

    /// Cells `player` has fired at.
    pub fn shots(&self, player: PlayerId) -> ServerResult<ShotGrid> {
        let seat = self.seat_index(player)?;
        Ok(self.seats[seat].shots)
    }

    fn seat_index(&self, player: PlayerId) -> ServerResult<usize> {
        self.seats
            .iter()
            .position(|s| s.player == player)
            .ok_or(ServerError::NotInGame {
                game: self.id,
                player,
            })
    }

    fn submit(
        &mut self,
        player: PlayerId,
        ships: Vec<Ship>,
    ) -> ServerResult<Outcome<ShipsSubmitted>> {
        let seat = self.seat_index(player)?;
        if matches!(self.phase, GamePhase::Active | GamePhase::Finished { .. }) {
            return Ok(Outcome::Rejected);
        }
        self.seats[seat].fleet = Some(ships);
        if !self.submissions.contains(&seat) {
            self.submissions.push(seat);
        }

        let [first, second] = match self.submissions.as_slice() {
            [first, second] => [*first, *second],
            _ => {
                self.phase = GamePhase::Placement;
                return Ok(Outcome::Applied(ShipsSubmitted::Waiting));
            }
        };

        let turn = Turn {
            current_player: self.seats[first].player,
        };
        self.turn = Some(turn.current_player);
        self.phase = GamePhase::Active;

        let reveal = |seat: &Seat| FleetReveal {
            player_id: seat.player,
            ships: seat.fleet.clone().unwrap_or_default(),
        };
        Ok(Outcome::Applied(ShipsSubmitted::Started(GameStart {
            player_ids: [self.seats[first].player, self.seats[second].player],
            fleets: [reveal(&self.seats[first]), reveal(&self.seats[second])],
            turn,
        })))
    }

    /// Resolve one shot from `attacker`.
    fn fire(
        &mut self,
        attacker: PlayerId,
        target: Position,
    ) -> ServerResult<Outcome<AttackReport>> {
        let attacker_seat = self.seat_index(attacker)?;
        if self.phase != GamePhase::Active || self.turn != Some(attacker) {
            return Ok(Outcome::Rejected);
        }
        if !target.on_board() || !self.seats[attacker_seat].shots.mark(target)? {
            return Ok(Outcome::Rejected);
        }

        let defender_seat = 1 - attacker_seat;
        let defender = self.seats[defender_seat].player;
        let fleet = self.seats[defender_seat]
            .fleet
            .as_mut()
            .map(Vec::as_mut_slice)
            .unwrap_or_default();

        let mut halo_misses = Vec::new();
        let mut is_finished = false;
        let status = match fleet.iter_mut().find(|ship| ship.occupies(target)) {
            None => AttackStatus::Miss,
            Some(ship) => {
                ship.hit(target);
                if ship.is_sunk() {
                    let border = ship.halo();
                    is_finished = fleet.iter().all(Ship::is_sunk);
                    self.seats[attacker_seat].shots.mark_all(border.iter().copied())?;
                    halo_misses = border
                        .into_iter()
                        .map(|position| AttackFeedback {
                            position,
                            current_player: attacker,
                            status: AttackStatus::Miss,
                        })
                        .collect();
                    AttackStatus::Killed
                } else {
                    AttackStatus::Shot
                }
            }
        };

        let next = if status == AttackStatus::Miss {
            defender
        } else {
            attacker
        };
        self.turn = Some(next);
        if is_finished {
            self.phase = GamePhase::Finished { winner: attacker };
        }

        Ok(Outcome::Applied(AttackReport {
            turn: Turn {
                current_player: next,
            },
            is_finished,
            attack_result: AttackFeedback {
                position: target,
                current_player: attacker,
                status,
            },
            halo_misses,
            player_ids: self.player_ids(),
        }))
    }
}

enum Slot {
    Live(Arc<Mutex<Game>>),
    Finished(FinishedGame),
}

/// Owns every game. Each game sits behind its own lock, so work on
/// different games never contends beyond the brief map lookup.
///
/// A won game is dropped from the live map and only its [`FinishedGame`]
/// record is kept, so late requests for it are still told apart from
/// requests for ids that never existed.
#[derive(Debug)]
pub struct GameEngine {
    games: RwLock<HashMap<GameId, Arc<Mutex<Game>>>>,
    finished: RwLock<HashMap<GameId, FinishedGame>>,
    rooms: Arc<RoomRegistry>,
    players: Arc<PlayerStore>,
    placement: PlacementPolicy,
}

impl GameEngine {
    pub fn new(
        rooms: Arc<RoomRegistry>,
        players: Arc<PlayerStore>,
        placement: PlacementPolicy,
    ) -> Self {
        Self {
            games: RwLock::new(HashMap::new()),
            finished: RwLock::new(HashMap::new()),
            rooms,
            players,
            placement,
        }
    }

    pub fn placement_policy(&self) -> PlacementPolicy {
        self.placement
    }

    /// Promote a full room to a game with the same id. The room is removed.
    pub fn create_game(&self, room: RoomId, triggered_by: PlayerId) -> ServerResult<GameCreated> {
        let (taken, rooms) = self.rooms.take_full(room)?;
        let player_ids = [taken.occupants[0], taken.occupants[1]];
        let game_id = GameId::from(taken.id);

        recover(self.games.write()).insert(
            game_id,
            Arc::new(Mutex::new(Game::new(game_id, player_ids))),
        );
        info!(
            "game {} created from room {} (joined by {})",
            game_id, room, triggered_by
        );

        Ok(GameCreated {
            game_id,
            player_ids,
            seats: player_ids.map(|player_id| SeatAssignment { player_id, game_id }),
            rooms,
        })
    }

    /// Store `player`'s fleet. The second distinct submission starts the
    /// game, and the first submitter moves first.
    pub fn submit_ships(
        &self,
        game: GameId,
        player: PlayerId,
        placements: &[ShipPlacement],
    ) -> ServerResult<Outcome<ShipsSubmitted>> {
        let handle = match self.slot(game)? {
            Slot::Live(handle) => handle,
            Slot::Finished(done) => {
                done.check_seated(player)?;
                debug!("game {} is over, fleet from {} ignored", game, player);
                return Ok(Outcome::Rejected);
            }
        };
        validate_fleet(self.placement, placements)?;
        let ships: Vec<Ship> = placements.iter().map(expand_ship).collect();

        let mut game = recover(handle.lock());
        let outcome = game.submit(player, ships)?;
        match &outcome {
            Outcome::Applied(ShipsSubmitted::Started(start)) => info!(
                "game {} started, {} moves first",
                game.id, start.turn.current_player
            ),
            Outcome::Applied(ShipsSubmitted::Waiting) => {
                debug!("game {}: fleet from {} stored", game.id, player)
            }
            Outcome::Rejected => debug!("game {}: late fleet from {} ignored", game.id, player),
        }
        Ok(outcome)
    }

    /// Fire at `(x, y)` on the opponent's board. Out-of-turn shots, repeated
    /// targets, off-board targets and shots at a finished game are rejected.
    pub fn attack(
        &self,
        game: GameId,
        x: u8,
        y: u8,
        attacker: PlayerId,
    ) -> ServerResult<Outcome<AttackReport>> {
        let handle = match self.slot(game)? {
            Slot::Live(handle) => handle,
            Slot::Finished(done) => {
                done.check_seated(attacker)?;
                debug!("game {} is over, shot by {} ignored", game, attacker);
                return Ok(Outcome::Rejected);
            }
        };
        let mut game = recover(handle.lock());
        let outcome = game.fire(attacker, Position::new(x, y))?;

        match &outcome {
            Outcome::Applied(report) => {
                debug!(
                    "game {}: {} fired at ({}, {}): {:?}",
                    game.id, attacker, x, y, report.attack_result.status
                );
                if report.is_finished {
                    let wins = self.players.increment_wins(attacker)?;
                    info!("game {} finished, {} now has {} win(s)", game.id, attacker, wins);
                    self.retire(FinishedGame {
                        game_id: game.id,
                        player_ids: [game.seats[0].player, game.seats[1].player],
                        winner: attacker,
                    });
                }
            }
            Outcome::Rejected => debug!(
                "game {}: shot by {} at ({}, {}) rejected",
                game.id, attacker, x, y
            ),
        }
        Ok(outcome)
    }

    /// Uniformly pick a cell `player` has not fired at yet.
    pub fn pick_random_untargeted_cell<R: Rng>(
        &self,
        game: GameId,
        player: PlayerId,
        rng: &mut R,
    ) -> ServerResult<Option<Position>> {
        let handle = match self.slot(game)? {
            Slot::Live(handle) => handle,
            Slot::Finished(done) => {
                done.check_seated(player)?;
                return Ok(None);
            }
        };
        let game = recover(handle.lock());
        let open = game.shots(player)?.untargeted();
        if open.is_empty() {
            return Ok(None);
        }
        Ok(Some(open[rng.random_range(0..open.len())]))
    }

    /// Copy of the current state of a live `game`.
    pub fn snapshot(&self, game: GameId) -> ServerResult<Game> {
        match self.slot(game)? {
            Slot::Live(handle) => Ok(recover(handle.lock()).clone()),
            Slot::Finished(_) => Err(ServerError::UnknownGame(game)),
        }
    }

    /// Whether `game` is still being played.
    pub fn contains(&self, game: GameId) -> bool {
        recover(self.games.read()).contains_key(&game)
    }

    pub fn finished(&self, game: GameId) -> Option<FinishedGame> {
        recover(self.finished.read()).get(&game).copied()
    }

    /// Number of games still being played.
    pub fn live_count(&self) -> usize {
        recover(self.games.read()).len()
    }

    // The record goes in before the live entry leaves, so a lookup never
    // finds neither.
    fn retire(&self, done: FinishedGame) {
        recover(self.finished.write()).insert(done.game_id, done);
        recover(self.games.write()).remove(&done.game_id);
    }

    fn slot(&self, game: GameId) -> ServerResult<Slot> {
        if let Some(handle) = recover(self.games.read()).get(&game).cloned() {
            return Ok(Slot::Live(handle));
        }
        self.finished(game)
            .map(Slot::Finished)
            .ok_or(ServerError::UnknownGame(game))
    }
}
