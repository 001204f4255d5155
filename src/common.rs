//! Common types shared by the stores: identifiers, errors and the
//! applied/rejected outcome of a state transition.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bitboard::BitBoardError;
use crate::ship::PlacementError;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Allocate a fresh random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            #[must_use]
            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl core::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

opaque_id!(
    /// Unique identifier of a registered player.
    PlayerId
);
opaque_id!(
    /// Unique identifier of a waiting room.
    RoomId
);
opaque_id!(
    /// Unique identifier of a game. Equal to the id of the room it was promoted from.
    GameId
);

impl From<RoomId> for GameId {
    fn from(room: RoomId) -> Self {
        GameId(room.0)
    }
}

/// Result of a state transition that may be silently refused.
///
/// `Rejected` means the request broke a game rule (out of turn, repeated
/// target, joining your own room) and nothing was changed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome<T> {
    Applied(T),
    Rejected,
}

impl<T> Outcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected)
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Outcome::Applied(value) => Some(value),
            Outcome::Rejected => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Applied(value) => Outcome::Applied(f(value)),
            Outcome::Rejected => Outcome::Rejected,
        }
    }
}

/// Precondition violations raised by the stores and the game engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerError {
    /// No player registered under this id.
    UnknownPlayer(PlayerId),
    /// No open room with this id.
    UnknownRoom(RoomId),
    /// No game with this id.
    UnknownGame(GameId),
    /// The player is not seated in the game.
    NotInGame { game: GameId, player: PlayerId },
    /// A game was requested from a room without two occupants.
    RoomNotReady { room: RoomId, occupants: usize },
    /// Submitted fleet violates the configured placement policy.
    InvalidPlacement(PlacementError),
    /// Underlying grid error.
    Grid(BitBoardError),
}

impl From<BitBoardError> for ServerError {
    fn from(err: BitBoardError) -> Self {
        ServerError::Grid(err)
    }
}

impl From<PlacementError> for ServerError {
    fn from(err: PlacementError) -> Self {
        ServerError::InvalidPlacement(err)
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::UnknownPlayer(id) => write!(f, "unknown player {}", id),
            ServerError::UnknownRoom(id) => write!(f, "unknown room {}", id),
            ServerError::UnknownGame(id) => write!(f, "unknown game {}", id),
            ServerError::NotInGame { game, player } => {
                write!(f, "player {} is not seated in game {}", player, game)
            }
            ServerError::RoomNotReady { room, occupants } => {
                write!(f, "room {} has {} occupant(s), need 2", room, occupants)
            }
            ServerError::InvalidPlacement(e) => write!(f, "invalid ship placement: {}", e),
            ServerError::Grid(e) => write!(f, "grid error: {}", e),
        }
    }
}

impl std::error::Error for ServerError {}

pub type ServerResult<T> = Result<T, ServerError>;

/// Recover the guard from a poisoned lock. Mutations under these locks are
/// all-or-nothing.
pub(crate) fn recover<G>(result: Result<G, std::sync::PoisonError<G>>) -> G {
    result.unwrap_or_else(std::sync::PoisonError::into_inner)
}
