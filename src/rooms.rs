//! Registry of open rooms waiting for a second player.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::common::{recover, Outcome, PlayerId, RoomId, ServerError, ServerResult};

/// Seats in a room; a full room is promoted to a game.
pub const ROOM_CAPACITY: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    /// In join order, at most [`ROOM_CAPACITY`], never repeated.
    pub occupants: Vec<PlayerId>,
}

impl Room {
    pub fn contains(&self, player: PlayerId) -> bool {
        self.occupants.contains(&player)
    }

    pub fn is_full(&self) -> bool {
        self.occupants.len() >= ROOM_CAPACITY
    }
}

/// Owns all open rooms, listed in creation order.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: Mutex<Vec<Room>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a room holding `player`, unless they already wait in one.
    /// Returns the room list either way.
    pub fn create_or_join_room(&self, player: PlayerId) -> Vec<Room> {
        let mut rooms = recover(self.rooms.lock());
        if !rooms.iter().any(|r| r.contains(player)) {
            rooms.push(Room {
                id: RoomId::new(),
                occupants: vec![player],
            });
        }
        rooms.clone()
    }

    /// Seat `player` in `room`. Refused when the player is already seated
    /// there or the room is full. Any other room the player was waiting in
    /// is closed.
    pub fn join_room(&self, room: RoomId, player: PlayerId) -> ServerResult<Outcome<Vec<Room>>> {
        let mut rooms = recover(self.rooms.lock());
        let target = rooms
            .iter_mut()
            .find(|r| r.id == room)
            .ok_or(ServerError::UnknownRoom(room))?;
        if target.contains(player) || target.is_full() {
            return Ok(Outcome::Rejected);
        }
        target.occupants.push(player);
        rooms.retain(|r| r.id == room || !r.contains(player));
        Ok(Outcome::Applied(rooms.clone()))
    }

    /// Close every room `player` is waiting in. Returns the remaining list
    /// if anything was closed.
    pub fn leave(&self, player: PlayerId) -> Option<Vec<Room>> {
        let mut rooms = recover(self.rooms.lock());
        let before = rooms.len();
        rooms.retain(|r| r.is_full() || !r.contains(player));
        (rooms.len() != before).then(|| rooms.clone())
    }

    /// The player who opened `room`, if anyone is seated.
    pub fn peek_first_occupant(&self, room: RoomId) -> ServerResult<Option<PlayerId>> {
        self.with_room(room, |r| r.occupants.first().copied())
    }

    pub fn room(&self, room: RoomId) -> ServerResult<Room> {
        self.with_room(room, Room::clone)
    }

    /// Delete `room` and return the remaining list.
    pub fn remove(&self, room: RoomId) -> ServerResult<Vec<Room>> {
        let mut rooms = recover(self.rooms.lock());
        let slot = rooms
            .iter()
            .position(|r| r.id == room)
            .ok_or(ServerError::UnknownRoom(room))?;
        rooms.remove(slot);
        Ok(rooms.clone())
    }

    /// Remove a full room in one step, returning it with the remaining list.
    /// The room is left in place when it is not full.
    pub fn take_full(&self, room: RoomId) -> ServerResult<(Room, Vec<Room>)> {
        let mut rooms = recover(self.rooms.lock());
        let slot = rooms
            .iter()
            .position(|r| r.id == room)
            .ok_or(ServerError::UnknownRoom(room))?;
        if !rooms[slot].is_full() {
            return Err(ServerError::RoomNotReady {
                room,
                occupants: rooms[slot].occupants.len(),
            });
        }
        let taken = rooms.remove(slot);
        Ok((taken, rooms.clone()))
    }

    pub fn rooms(&self) -> Vec<Room> {
        recover(self.rooms.lock()).clone()
    }

    fn with_room<T>(&self, room: RoomId, f: impl FnOnce(&Room) -> T) -> ServerResult<T> {
        let rooms = recover(self.rooms.lock());
        rooms
            .iter()
            .find(|r| r.id == room)
            .map(f)
            .ok_or(ServerError::UnknownRoom(room))
    }
}
