//! Identity and leaderboard store.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::common::{recover, PlayerId, ServerError, ServerResult};

/// Public view of a registered player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub wins: u32,
}

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub wins: u32,
}

#[derive(Debug, Default)]
struct Registry {
    // Registration order; leaderboard ties keep it.
    players: Vec<Player>,
    index: HashMap<PlayerId, usize>,
}

/// Owns every player record, including win counts.
#[derive(Debug, Default)]
pub struct PlayerStore {
    inner: RwLock<Registry>,
}

impl PlayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new player with zero wins under a fresh id.
    pub fn register(&self, name: impl Into<String>) -> Player {
        let player = Player {
            id: PlayerId::new(),
            name: name.into(),
            wins: 0,
        };
        let mut registry = recover(self.inner.write());
        let slot = registry.players.len();
        registry.index.insert(player.id, slot);
        registry.players.push(player.clone());
        player
    }

    pub fn get(&self, id: PlayerId) -> ServerResult<Player> {
        let registry = recover(self.inner.read());
        registry
            .index
            .get(&id)
            .map(|&slot| registry.players[slot].clone())
            .ok_or(ServerError::UnknownPlayer(id))
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        recover(self.inner.read()).index.contains_key(&id)
    }

    pub fn name(&self, id: PlayerId) -> ServerResult<String> {
        self.get(id).map(|p| p.name)
    }

    /// Credit one win to `id`, returning the new total.
    pub fn increment_wins(&self, id: PlayerId) -> ServerResult<u32> {
        let mut registry = recover(self.inner.write());
        let slot = *registry
            .index
            .get(&id)
            .ok_or(ServerError::UnknownPlayer(id))?;
        let player = &mut registry.players[slot];
        player.wins = player.wins.saturating_add(1);
        Ok(player.wins)
    }

    /// Players with at least one win, most wins first.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let registry = recover(self.inner.read());
        let mut entries: Vec<LeaderboardEntry> = registry
            .players
            .iter()
            .filter(|p| p.wins > 0)
            .map(|p| LeaderboardEntry {
                name: p.name.clone(),
                wins: p.wins,
            })
            .collect();
        // Stable, so equal counts stay in registration order.
        entries.sort_by(|a, b| b.wins.cmp(&a.wins));
        entries
    }

    pub fn len(&self) -> usize {
        recover(self.inner.read()).players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
