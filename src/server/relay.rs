use std::{
    marker::PhantomData,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use rand::{SeedableRng, rngs::StdRng};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
    api::{
        message::{InputMessage, OutputMessage, PlayerId, Position, Roster},
        schema::{Deserialize, Schema, Serialize},
    },
    server::{bootstrap, protocol::SessionManager, registry::Registry},
};

struct RelayState {
    registry: Registry,
    rng: StdRng,
}

pub struct Relay<S: Schema> {
    // Held for the whole mutate-then-broadcast sequence of every event.
    state: Mutex<RelayState>,
    sessions: Arc<SessionManager>,
    _schema: PhantomData<fn() -> S>,
}

impl<S> Relay<S>
where
    S: Schema,
    OutputMessage: Serialize<S>,
    InputMessage: Deserialize<S>,
{
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self::with_rng(sessions, StdRng::from_os_rng())
    }

    pub fn with_rng(sessions: Arc<SessionManager>, rng: StdRng) -> Self {
        Self {
            state: Mutex::new(RelayState {
                registry: Registry::default(),
                rng,
            }),
            sessions,
            _schema: PhantomData,
        }
    }

    pub fn open(&self, id: &PlayerId) -> UnboundedReceiver<Vec<u8>> {
        let rx = self.sessions.connect(id.clone());
        self.send(id, &OutputMessage::Connected { id: id.clone() });
        rx
    }

    pub fn process_message(&self, id: &PlayerId, raw_message: &[u8]) {
        match <InputMessage as Deserialize<S>>::deserialize(raw_message) {
            Ok(InputMessage::Join { username }) => self.join(id, username),
            Ok(InputMessage::Movement(position)) => self.movement(id, position),
            Err(err) => {
                log::warn!("Dropping frame from {id}: {err}");
                self.send(
                    id,
                    &OutputMessage::GenericError {
                        description: err.to_string(),
                    },
                );
            }
        }
    }

    pub fn join(&self, id: &PlayerId, username: Option<String>) {
        let mut state = self.lock();
        let RelayState { registry, rng } = &mut *state;

        let record = bootstrap::spawn(id.clone(), username, rng);
        if let Some(previous) = registry.put(id.clone(), record.clone()) {
            log::debug!("{id} joined again, replacing record of {}", previous.username);
        }
        log::info!("Player joined: {} ({id})", record.username);

        self.send(id, &OutputMessage::CurrentPlayers(registry.snapshot()));
        self.broadcast(registry, id, &OutputMessage::NewPlayer(record));
    }

    pub fn movement(&self, id: &PlayerId, position: Position) {
        let mut state = self.lock();
        let Some(record) = state.registry.get_mut(id) else {
            log::trace!("Ignoring movement from unjoined connection {id}");
            return;
        };
        record.position = position;
        log::trace!("{id} moved to ({}, {}, {})", position.x, position.y, position.z);

        self.broadcast(
            &state.registry,
            id,
            &OutputMessage::PlayerMoved {
                id: id.clone(),
                position,
            },
        );
    }

    /// Closing a connection that never joined is silent.
    pub fn disconnect(&self, id: &PlayerId) {
        {
            let mut state = self.lock();
            if let Some(record) = state.registry.remove(id) {
                log::info!("Player disconnected: {} ({id})", record.username);
                self.broadcast(
                    &state.registry,
                    id,
                    &OutputMessage::PlayerDisconnected { id: id.clone() },
                );
            }
        }
        self.sessions.disconnect(id);
    }

    pub fn roster(&self) -> Roster {
        self.lock().registry.snapshot()
    }

    pub fn player_count(&self) -> usize {
        self.lock().registry.len()
    }

    pub fn connection_count(&self) -> usize {
        self.sessions.len()
    }

    fn send(&self, id: &PlayerId, message: &OutputMessage) {
        if let Some(raw_message) = Self::encode(message) {
            self.sessions.send(id, raw_message);
        }
    }

    fn broadcast(&self, registry: &Registry, except: &PlayerId, message: &OutputMessage) {
        if let Some(raw_message) = Self::encode(message) {
            self.sessions
                .send_all(registry.ids().filter(|id| *id != except), &raw_message);
        }
    }

    fn encode(message: &OutputMessage) -> Option<Vec<u8>> {
        match <OutputMessage as Serialize<S>>::serialize(message) {
            Ok(raw_message) => Some(raw_message),
            Err(err) => {
                log::error!("Failed to encode outbound message: {err}");
                None
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, RelayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use std::collections::HashSet;

    use tokio::sync::mpsc::error::TryRecvError;

    use super::*;
    use crate::{
        api::{message::PlayerRecord, schema::json::Json},
        server::bootstrap::{PALETTE, SPAWN_HALF_EXTENT, SPAWN_HEIGHT},
    };

    struct Peer {
        id: PlayerId,
        rx: UnboundedReceiver<Vec<u8>>,
    }

    impl Peer {
        fn open(relay: &Relay<Json>, id: &str) -> Self {
            let id = PlayerId::from(id);
            let mut rx = relay.open(&id);
            assert_eq!(
                decode(rx.try_recv().unwrap()),
                OutputMessage::Connected { id: id.clone() }
            );
            Self { id, rx }
        }

        fn next(&mut self) -> OutputMessage {
            decode(self.rx.try_recv().expect("expected a pending message"))
        }

        fn assert_idle(&mut self) {
            assert!(matches!(self.rx.try_recv(), Err(TryRecvError::Empty)));
        }
    }

    fn decode(raw: Vec<u8>) -> OutputMessage {
        <OutputMessage as Deserialize<Json>>::deserialize(&raw).unwrap()
    }

    fn relay() -> Relay<Json> {
        Relay::with_rng(Arc::new(SessionManager::default()), StdRng::seed_from_u64(42))
    }

    fn joined(peer: &mut Peer) -> Roster {
        match peer.next() {
            OutputMessage::CurrentPlayers(roster) => roster,
            other => panic!("expected roster snapshot, got {other:?}"),
        }
    }

    fn join_raw(username: &str) -> Vec<u8> {
        format!(r#"{{"event":"playerJoin","data":{{"username":"{username}"}}}}"#).into_bytes()
    }

    fn move_raw(x: f64, y: f64, z: f64) -> Vec<u8> {
        format!(r#"{{"event":"playerMovement","data":{{"x":{x},"y":{y},"z":{z}}}}}"#).into_bytes()
    }

    #[test]
    fn alice_and_bob_walkthrough() {
        let relay = relay();
        let mut alice = Peer::open(&relay, "alice-conn");
        let mut bob = Peer::open(&relay, "bob-conn");

        relay.process_message(&alice.id, &join_raw("Alice"));
        let roster = joined(&mut alice);
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[&alice.id].username, "Alice");
        bob.assert_idle();

        relay.process_message(&bob.id, &join_raw("Bob"));
        let roster = joined(&mut bob);
        let ids: HashSet<_> = roster.keys().cloned().collect();
        assert_eq!(ids, HashSet::from([alice.id.clone(), bob.id.clone()]));
        match alice.next() {
            OutputMessage::NewPlayer(record) => {
                assert_eq!(record.id, bob.id);
                assert_eq!(record.username, "Bob");
            }
            other => panic!("expected newPlayer, got {other:?}"),
        }

        relay.process_message(&alice.id, &move_raw(5.0, 1.0, 3.0));
        assert_eq!(
            bob.next(),
            OutputMessage::PlayerMoved {
                id: alice.id.clone(),
                position: Position::new(5.0, 1.0, 3.0),
            }
        );
        alice.assert_idle();
        assert_eq!(
            relay.roster()[&alice.id].position,
            Position::new(5.0, 1.0, 3.0)
        );

        relay.disconnect(&alice.id);
        assert_eq!(
            bob.next(),
            OutputMessage::PlayerDisconnected {
                id: alice.id.clone()
            }
        );
        assert!(!relay.roster().contains_key(&alice.id));
        assert_eq!(relay.player_count(), 1);
        assert_eq!(relay.connection_count(), 1);
    }

    #[test]
    fn unjoined_connections_are_invisible() {
        let relay = relay();
        let mut lurker = Peer::open(&relay, "lurker");
        let mut alice = Peer::open(&relay, "alice");

        relay.process_message(&lurker.id, &move_raw(1.0, 1.0, 1.0));
        assert_eq!(relay.player_count(), 0);

        relay.join(&alice.id, Some("Alice".to_string()));
        joined(&mut alice);
        relay.movement(&alice.id, Position::new(2.0, 1.0, 2.0));

        lurker.assert_idle();
        alice.assert_idle();

        relay.disconnect(&lurker.id);
        alice.assert_idle();
        assert_eq!(relay.player_count(), 1);
    }

    #[test]
    fn departure_reaches_every_remaining_player_once() {
        let relay = relay();
        let mut peers: Vec<Peer> = ["a", "b", "c", "d"]
            .into_iter()
            .map(|id| Peer::open(&relay, id))
            .collect();

        for i in 0..peers.len() {
            let id = peers[i].id.clone();
            relay.join(&id, None);
            joined(&mut peers[i]);
            for earlier in peers.iter_mut().take(i) {
                assert!(matches!(earlier.next(), OutputMessage::NewPlayer(r) if r.id == id));
            }
        }

        let leaving = peers.remove(0);
        relay.disconnect(&leaving.id);

        for peer in peers.iter_mut() {
            assert_eq!(
                peer.next(),
                OutputMessage::PlayerDisconnected {
                    id: leaving.id.clone()
                }
            );
            peer.assert_idle();
        }

        relay.disconnect(&leaving.id);
        for peer in peers.iter_mut() {
            peer.assert_idle();
        }
    }

    #[test]
    fn registry_matches_joined_and_open_connections() {
        let relay = relay();
        let ids: Vec<PlayerId> = (0..6).map(|i| PlayerId::from(format!("p{i}"))).collect();
        let _receivers: Vec<_> = ids.iter().map(|id| relay.open(id)).collect();

        for id in &ids[..4] {
            relay.join(id, None);
        }
        relay.movement(&ids[4], Position::new(1.0, 1.0, 1.0));
        relay.disconnect(&ids[1]);
        relay.disconnect(&ids[5]);
        relay.join(&ids[2], Some("again".to_string()));

        let roster = relay.roster();
        let expected: HashSet<_> = [&ids[0], &ids[2], &ids[3]].into_iter().cloned().collect();
        assert_eq!(roster.keys().cloned().collect::<HashSet<_>>(), expected);
        assert_eq!(roster[&ids[2]].username, "again");
    }

    #[test]
    fn spawns_follow_the_rules() {
        let relay = relay();
        for i in 0..50 {
            let id = PlayerId::from(format!("conn{i}"));
            let _rx = relay.open(&id);
            relay.join(&id, None);
        }

        for PlayerRecord {
            id,
            username,
            position,
            color,
        } in relay.roster().into_values()
        {
            assert!(position.x.abs() <= SPAWN_HALF_EXTENT);
            assert!(position.z.abs() <= SPAWN_HALF_EXTENT);
            assert_eq!(position.y, SPAWN_HEIGHT);
            assert!(PALETTE.contains(&color.as_str()));
            assert_eq!(username, format!("Guest_{}", &id.as_str()[..4]));
        }
    }

    #[test]
    fn malformed_frames_only_answer_the_sender() {
        let relay = relay();
        let mut alice = Peer::open(&relay, "alice");
        let mut bob = Peer::open(&relay, "bob");
        relay.join(&alice.id, None);
        joined(&mut alice);
        relay.join(&bob.id, None);
        joined(&mut bob);
        alice.next();

        relay.process_message(&alice.id, br#"{"event":"playerMovement","data":{"x":1}}"#);

        assert!(matches!(alice.next(), OutputMessage::GenericError { .. }));
        bob.assert_idle();
        assert_eq!(relay.roster()[&alice.id].position.y, SPAWN_HEIGHT);
    }

    #[test]
    fn closed_peer_does_not_block_others() {
        let relay = relay();
        let mut alice = Peer::open(&relay, "alice");
        let bob = Peer::open(&relay, "bob");
        let mut carol = Peer::open(&relay, "carol");
        for peer in [&alice.id, &bob.id, &carol.id] {
            relay.join(peer, None);
        }
        let bob_id = bob.id.clone();
        drop(bob);
        while alice.rx.try_recv().is_ok() {}
        while carol.rx.try_recv().is_ok() {}

        relay.movement(&alice.id, Position::new(0.5, 1.0, 0.5));

        assert!(matches!(carol.next(), OutputMessage::PlayerMoved { .. }));
        assert!(relay.roster().contains_key(&bob_id));
    }
}
