//! Messages exchanged between the server and connected clients.

use serde::{Deserialize, Serialize};

use crate::common::{GameId, PlayerId, RoomId};
use crate::game::{AttackFeedback, SeatAssignment, Turn};
use crate::lobby::RoomView;
use crate::players::{LeaderboardEntry, Player};
use crate::ship::{Ship, ShipPlacement};

/// Current wire protocol version, checked during the handshake.
pub const PROTOCOL_VERSION: u8 = 1;

/// Requests sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientMessage {
    /// First frame on every connection.
    Handshake { version: u8 },
    Register { name: String },
    /// Open a room, or do nothing if the caller already waits in one.
    CreateRoom,
    JoinRoom { room_id: RoomId },
    SubmitShips {
        game_id: GameId,
        ships: Vec<ShipPlacement>,
    },
    Attack {
        game_id: GameId,
        x: u8,
        y: u8,
        attacker: PlayerId,
    },
    /// Attack a random cell the attacker has not fired at yet.
    RandomAttack { game_id: GameId, attacker: PlayerId },
}

/// Notifications pushed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerMessage {
    HandshakeAck { version: u8 },
    Registered { player: Player },
    RoomsUpdated(Vec<RoomView>),
    WinnersUpdated(Vec<LeaderboardEntry>),
    GameCreated(SeatAssignment),
    /// The receiving player's own fleet. `current_player_index` is the
    /// receiver's id.
    GameStarted {
        ships: Vec<Ship>,
        current_player_index: PlayerId,
    },
    Turn(Turn),
    Attack(AttackFeedback),
    Finished { win_player: PlayerId },
    Error { reason: String },
}

impl ServerMessage {
    pub fn error(reason: impl ToString) -> Self {
        ServerMessage::Error {
            reason: reason.to_string(),
        }
    }
}
