use std::marker::PhantomData;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::{
    api::{
        message::{InputMessage, OutputMessage, PlayerId, Position},
        schema::{Deserialize, Schema, Serialize},
    },
    client::{
        error::RelayClientError,
        protocol::{ClientProtocol, InboundAction},
        state::RelayEvent,
    },
};

pub mod error;
pub mod protocol;
pub mod state;
pub mod throttle;

pub type RelayClientResult = Result<(), RelayClientError>;

pub struct RelayClient<S: Schema> {
    id: PlayerId,
    action_tx: UnboundedSender<InboundAction>,
    _schema: PhantomData<fn() -> S>,
}

impl<S> RelayClient<S>
where
    S: Schema,
    InputMessage: Serialize<S>,
    OutputMessage: Deserialize<S>,
{
    pub async fn connect<P: ClientProtocol>(
        protocol: P,
        _schema: S,
    ) -> Result<(Self, UnboundedReceiver<RelayEvent>), RelayClientError> {
        let handle = protocol.run::<S>().await?;
        Ok((
            Self {
                id: handle.id,
                action_tx: handle.action_tx,
                _schema: PhantomData,
            },
            handle.event_rx,
        ))
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    pub fn join(&self, username: impl Into<String>) -> RelayClientResult {
        self.try_send(&InputMessage::Join {
            username: Some(username.into()),
        })
    }

    pub fn join_as_guest(&self) -> RelayClientResult {
        self.try_send(&InputMessage::Join { username: None })
    }

    pub fn submit_position(&self, position: Position) -> RelayClientResult {
        self.try_send(&InputMessage::Movement(position))
    }

    pub fn disconnect(self) {}

    fn try_send(&self, message: &InputMessage) -> RelayClientResult {
        let raw_message = <InputMessage as Serialize<S>>::serialize(message)?;
        self.action_tx
            .send(InboundAction::Raw(raw_message))
            .map_err(|_| RelayClientError::NotRunning)
    }
}

impl<S> Drop for RelayClient<S>
where
    S: Schema,
{
    fn drop(&mut self) {
        let _ = self.action_tx.send(InboundAction::Stop);
    }
}
