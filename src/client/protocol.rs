use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::{
    api::{
        message::{InputMessage, OutputMessage, PlayerId},
        schema::{Deserialize, Schema, Serialize},
    },
    client::{error::RelayClientError, state::RelayEvent},
};

#[cfg(feature = "ws")]
pub mod ws;

pub enum InboundAction {
    Raw(Vec<u8>),
    Stop,
}

pub struct ClientProtocolHandle {
    pub(crate) id: PlayerId,
    pub(crate) action_tx: UnboundedSender<InboundAction>,
    pub(crate) event_rx: UnboundedReceiver<RelayEvent>,
}

pub trait ClientProtocol {
    fn run<S>(self) -> impl Future<Output = Result<ClientProtocolHandle, RelayClientError>>
    where
        S: Schema,
        InputMessage: Serialize<S>,
        OutputMessage: Deserialize<S>;
}
