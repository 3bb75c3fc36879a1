use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::{
    api::{
        message::{InputMessage, OutputMessage, PlayerId},
        schema::{Deserialize, Schema, Serialize},
    },
    server::{RelayServerResult, relay::Relay},
};

#[cfg(feature = "ws")]
pub mod ws;

pub trait NetworkProtocol {
    fn run<S>(self, relay: Arc<Relay<S>>) -> impl Future<Output = RelayServerResult> + Send
    where
        S: Schema,
        OutputMessage: Serialize<S>,
        InputMessage: Deserialize<S>;
}

#[derive(Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<PlayerId, UnboundedSender<Vec<u8>>>>,
}

impl SessionManager {
    pub fn connect(&self, id: PlayerId) -> UnboundedReceiver<Vec<u8>> {
        let (tx, rx) = mpsc::unbounded_channel::<Vec<u8>>();
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, tx);
        rx
    }

    pub fn disconnect(&self, id: &PlayerId) {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }

    pub fn send(&self, id: &PlayerId, message: Vec<u8>) {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        match sessions.get(id) {
            Some(session) => {
                if session.send(message).is_err() {
                    log::debug!("Outbound channel of {id} is closed, dropping message");
                }
            }
            None => log::debug!("No session for {id}, dropping message"),
        }
    }

    pub fn send_all<'a>(&self, ids: impl Iterator<Item = &'a PlayerId>, message: &[u8]) {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        for id in ids {
            match sessions.get(id) {
                Some(session) => {
                    if session.send(message.to_vec()).is_err() {
                        log::debug!("Outbound channel of {id} is closed, skipping peer");
                    }
                }
                None => log::debug!("No session for {id}, skipping peer"),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
