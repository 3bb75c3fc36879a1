use std::collections::HashMap;

use crate::api::message::{OutputMessage, PlayerId, PlayerRecord, Position};

#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    Roster(Vec<PlayerRecord>),
    PlayerJoined(PlayerRecord),
    PlayerMoved { id: PlayerId, position: Position },
    PlayerLeft { id: PlayerId },
    Disconnected,
}

impl RelayEvent {
    pub(crate) fn from_message(own_id: &PlayerId, message: OutputMessage) -> Option<Self> {
        match message {
            OutputMessage::Connected { .. } => None,
            OutputMessage::CurrentPlayers(roster) => Some(RelayEvent::Roster(
                roster
                    .into_values()
                    .filter(|record| &record.id != own_id)
                    .collect(),
            )),
            OutputMessage::NewPlayer(record) if &record.id == own_id => None,
            OutputMessage::NewPlayer(record) => Some(RelayEvent::PlayerJoined(record)),
            OutputMessage::PlayerMoved { id, position } => {
                Some(RelayEvent::PlayerMoved { id, position })
            }
            OutputMessage::PlayerDisconnected { id } => Some(RelayEvent::PlayerLeft { id }),
            OutputMessage::GenericError { description } => {
                log::warn!("Relay rejected a message: {description}");
                None
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct RemotePlayers {
    players: HashMap<PlayerId, PlayerRecord>,
}

impl RemotePlayers {
    pub fn apply(&mut self, event: &RelayEvent) {
        match event {
            RelayEvent::Roster(records) => {
                self.players = records
                    .iter()
                    .map(|record| (record.id.clone(), record.clone()))
                    .collect();
            }
            RelayEvent::PlayerJoined(record) => {
                self.players.insert(record.id.clone(), record.clone());
            }
            RelayEvent::PlayerMoved { id, position } => {
                if let Some(record) = self.players.get_mut(id) {
                    record.position = *position;
                }
            }
            RelayEvent::PlayerLeft { id } => {
                self.players.remove(id);
            }
            RelayEvent::Disconnected => self.players.clear(),
        }
    }

    pub fn get(&self, id: &PlayerId) -> Option<&PlayerRecord> {
        self.players.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.players.values()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::message::Roster;

    fn record(id: &str) -> PlayerRecord {
        PlayerRecord {
            id: PlayerId::from(id),
            username: id.to_uppercase(),
            position: Position::new(0.0, 1.0, 0.0),
            color: "#0000FF".to_string(),
        }
    }

    #[test]
    fn own_record_is_filtered_from_the_roster() {
        let me = PlayerId::from("me");
        let roster: Roster = [record("me"), record("other")]
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect();

        let event = RelayEvent::from_message(&me, OutputMessage::CurrentPlayers(roster));

        assert_eq!(event, Some(RelayEvent::Roster(vec![record("other")])));
    }

    #[test]
    fn bookkeeping_messages_are_not_events() {
        let me = PlayerId::from("me");
        assert_eq!(
            RelayEvent::from_message(&me, OutputMessage::Connected { id: me.clone() }),
            None
        );
        assert_eq!(
            RelayEvent::from_message(
                &me,
                OutputMessage::GenericError {
                    description: "bad".to_string()
                }
            ),
            None
        );
        assert_eq!(
            RelayEvent::from_message(&me, OutputMessage::NewPlayer(record("me"))),
            None
        );
    }

    #[test]
    fn mirror_follows_events() {
        let mut players = RemotePlayers::default();
        players.apply(&RelayEvent::Roster(vec![record("a"), record("b")]));
        assert_eq!(players.len(), 2);

        players.apply(&RelayEvent::PlayerJoined(record("c")));
        players.apply(&RelayEvent::PlayerMoved {
            id: PlayerId::from("a"),
            position: Position::new(5.0, 1.0, 3.0),
        });
        players.apply(&RelayEvent::PlayerMoved {
            id: PlayerId::from("ghost"),
            position: Position::new(9.0, 9.0, 9.0),
        });
        players.apply(&RelayEvent::PlayerLeft {
            id: PlayerId::from("b"),
        });

        assert_eq!(players.len(), 2);
        assert_eq!(
            players.get(&PlayerId::from("a")).unwrap().position,
            Position::new(5.0, 1.0, 3.0)
        );
        assert!(players.get(&PlayerId::from("b")).is_none());
        assert!(players.get(&PlayerId::from("ghost")).is_none());

        players.apply(&RelayEvent::Disconnected);
        assert!(players.is_empty());
    }
}
