//! Composition root owning the player, room and game stores.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::common::{PlayerId, RoomId};
use crate::game::GameEngine;
use crate::players::{LeaderboardEntry, Player, PlayerStore};
use crate::rooms::{Room, RoomRegistry};
use crate::ship::PlacementPolicy;

/// A room occupant as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomOccupant {
    pub id: PlayerId,
    pub name: String,
}

/// A room as shown to clients, occupants resolved to names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomView {
    pub room_id: RoomId,
    pub occupants: Vec<RoomOccupant>,
}

/// Everything a freshly registered client needs to sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub player: Player,
    pub rooms: Vec<RoomView>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Debug)]
pub struct Lobby {
    players: Arc<PlayerStore>,
    rooms: Arc<RoomRegistry>,
    games: GameEngine,
}

impl Lobby {
    pub fn new(placement: PlacementPolicy) -> Self {
        let players = Arc::new(PlayerStore::new());
        let rooms = Arc::new(RoomRegistry::new());
        let games = GameEngine::new(rooms.clone(), players.clone(), placement);
        Self {
            players,
            rooms,
            games,
        }
    }

    pub fn players(&self) -> &PlayerStore {
        &self.players
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    pub fn games(&self) -> &GameEngine {
        &self.games
    }

    pub fn register(&self, name: impl Into<String>) -> Registration {
        let player = self.players.register(name);
        Registration {
            player,
            rooms: self.room_views(&self.rooms.rooms()),
            leaderboard: self.players.leaderboard(),
        }
    }

    /// Resolve occupant names. Unknown ids are shown with an empty name.
    pub fn room_views(&self, rooms: &[Room]) -> Vec<RoomView> {
        rooms
            .iter()
            .map(|room| RoomView {
                room_id: room.id,
                occupants: room
                    .occupants
                    .iter()
                    .map(|&id| RoomOccupant {
                        id,
                        name: self.players.name(id).unwrap_or_default(),
                    })
                    .collect(),
            })
            .collect()
    }
}

impl Default for Lobby {
    fn default() -> Self {
        Self::new(PlacementPolicy::default())
    }
}
