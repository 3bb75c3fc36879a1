use std::sync::Arc;

use crate::{
    api::{
        message::{InputMessage, OutputMessage},
        schema::{Deserialize, Schema, Serialize},
    },
    server::{
        error::RelayServerError,
        protocol::{NetworkProtocol, SessionManager},
        relay::Relay,
    },
};

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod relay;
#[cfg(feature = "ws")]
pub mod status;

pub type RelayServerResult = Result<(), RelayServerError>;

pub struct RelayServer<N, S>
where
    N: NetworkProtocol,
    S: Schema,
{
    protocol: N,
    relay: Arc<Relay<S>>,
}

impl<N, S> RelayServer<N, S>
where
    N: NetworkProtocol,
    S: Schema,
    OutputMessage: Serialize<S>,
    InputMessage: Deserialize<S>,
{
    pub fn new(protocol: N, _schema: S) -> Self {
        Self::with_relay(protocol, Arc::new(Relay::new(Arc::new(SessionManager::default()))))
    }

    pub fn with_relay(protocol: N, relay: Arc<Relay<S>>) -> Self {
        Self { protocol, relay }
    }

    pub fn relay(&self) -> &Arc<Relay<S>> {
        &self.relay
    }

    pub async fn run(self) -> RelayServerResult {
        self.protocol.run(self.relay).await
    }
}
