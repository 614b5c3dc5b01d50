//! Room index: connections grouped by world, independent of session.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};

use worldcast_domain::ConnectionId;

#[derive(Debug, Default)]
struct Room {
    members: HashSet<ConnectionId>,
    /// Set when the last member left; cleared on re-join
    emptied_at: Option<DateTime<Utc>>,
}

/// World URL -> room membership.
///
/// Rooms are created lazily on first join. An emptied room is kept until
/// [`RoomIndex::sweep_empty`] finds it has stayed empty for the grace period.
#[derive(Debug, Default)]
pub struct RoomIndex {
    rooms: HashMap<String, Room>,
}

impl RoomIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent add.
    pub fn join(&mut self, world: &str, connection_id: ConnectionId) {
        let room = self.rooms.entry(world.to_string()).or_default();
        room.members.insert(connection_id);
        room.emptied_at = None;
    }

    /// Remove a member; returns whether it was present.
    pub fn leave(&mut self, world: &str, connection_id: ConnectionId, now: DateTime<Utc>) -> bool {
        let Some(room) = self.rooms.get_mut(world) else {
            return false;
        };
        let removed = room.members.remove(&connection_id);
        if removed && room.members.is_empty() {
            room.emptied_at = Some(now);
        }
        removed
    }

    pub fn contains(&self, world: &str, connection_id: ConnectionId) -> bool {
        self.rooms
            .get(world)
            .is_some_and(|room| room.members.contains(&connection_id))
    }

    pub fn members(&self, world: &str) -> impl Iterator<Item = ConnectionId> + '_ {
        self.rooms
            .get(world)
            .into_iter()
            .flat_map(|room| room.members.iter().copied())
    }

    /// Drop rooms that have been empty for at least `grace`. Returns the
    /// worlds removed.
    pub fn sweep_empty(&mut self, now: DateTime<Utc>, grace: Duration) -> Vec<String> {
        let expired: Vec<String> = self
            .rooms
            .iter()
            .filter(|(_, room)| {
                room.members.is_empty()
                    && room
                        .emptied_at
                        .is_some_and(|at| now.signed_duration_since(at) >= grace)
            })
            .map(|(world, _)| world.clone())
            .collect();

        for world in &expired {
            self.rooms.remove(world);
        }
        expired
    }

    pub fn has_room(&self, world: &str) -> bool {
        self.rooms.contains_key(world)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORLD: &str = "https://worlds.example/w1";

    #[test]
    fn join_is_idempotent() {
        let mut rooms = RoomIndex::new();
        let id = ConnectionId::new();
        rooms.join(WORLD, id);
        rooms.join(WORLD, id);
        assert_eq!(rooms.members(WORLD).count(), 1);
        assert!(rooms.contains(WORLD, id));
    }

    #[test]
    fn empty_room_survives_until_grace_elapses() {
        let mut rooms = RoomIndex::new();
        let id = ConnectionId::new();
        let start = Utc::now();
        rooms.join(WORLD, id);
        assert!(rooms.leave(WORLD, id, start));

        assert!(rooms
            .sweep_empty(start + Duration::minutes(9), Duration::minutes(10))
            .is_empty());
        assert!(rooms.has_room(WORLD));

        let removed = rooms.sweep_empty(start + Duration::minutes(10), Duration::minutes(10));
        assert_eq!(removed, vec![WORLD.to_string()]);
        assert!(!rooms.has_room(WORLD));
    }

    #[test]
    fn rejoin_cancels_pending_deletion() {
        let mut rooms = RoomIndex::new();
        let id = ConnectionId::new();
        let start = Utc::now();
        rooms.join(WORLD, id);
        rooms.leave(WORLD, id, start);
        rooms.join(WORLD, id);

        assert!(rooms
            .sweep_empty(start + Duration::hours(1), Duration::minutes(10))
            .is_empty());
        assert!(rooms.contains(WORLD, id));
    }

    #[test]
    fn leave_unknown_member_is_noop() {
        let mut rooms = RoomIndex::new();
        assert!(!rooms.leave(WORLD, ConnectionId::new(), Utc::now()));
        assert!(rooms.is_empty());
    }
}
