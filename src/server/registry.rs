use std::collections::HashMap;

use crate::api::message::{PlayerId, PlayerRecord, Roster};

#[derive(Debug, Default)]
pub struct Registry {
    players: HashMap<PlayerId, PlayerRecord>,
}

impl Registry {
    pub fn put(&mut self, id: PlayerId, record: PlayerRecord) -> Option<PlayerRecord> {
        debug_assert_eq!(id, record.id, "record stored under a foreign id");
        self.players.insert(id, record)
    }

    pub fn get(&self, id: &PlayerId) -> Option<&PlayerRecord> {
        self.players.get(id)
    }

    pub fn get_mut(&mut self, id: &PlayerId) -> Option<&mut PlayerRecord> {
        self.players.get_mut(id)
    }

    pub fn remove(&mut self, id: &PlayerId) -> Option<PlayerRecord> {
        self.players.remove(id)
    }

    pub fn snapshot(&self) -> Roster {
        self.players.clone()
    }

    pub fn ids(&self) -> impl Iterator<Item = &PlayerId> {
        self.players.keys()
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.players.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
