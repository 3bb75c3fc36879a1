use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc::unbounded_channel;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Bytes, Message},
};

use crate::{
    api::{
        message::{InputMessage, OutputMessage},
        schema::{Deserialize, Schema, SchemaType, Serialize},
    },
    client::{
        error::RelayClientError,
        protocol::{ClientProtocol, ClientProtocolHandle, InboundAction},
        state::RelayEvent,
    },
};

pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct WebSocketClientProtocol {
    pub url: String,
    pub handshake_timeout: Duration,
}

impl WebSocketClientProtocol {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}

impl ClientProtocol for WebSocketClientProtocol {
    async fn run<S>(self) -> Result<ClientProtocolHandle, RelayClientError>
    where
        S: Schema,
        InputMessage: Serialize<S>,
        OutputMessage: Deserialize<S>,
    {
        log::info!("Connecting to relay at {}", self.url);
        let (stream, _) = connect_async(self.url.as_str()).await?;
        let (mut ws_writer, mut ws_receiver) = stream.split();

        let id = tokio::time::timeout(self.handshake_timeout, async {
            while let Some(message) = ws_receiver.next().await {
                match decode::<S>(message?) {
                    Some(OutputMessage::Connected { id }) => return Ok(id),
                    Some(other) => log::debug!("Ignoring {other:?} before id assignment"),
                    None => {}
                }
            }
            Err(RelayClientError::NoHandshake)
        })
        .await
        .map_err(|_| RelayClientError::HandshakeTimeout)??;
        log::info!("Connected to relay as {id}");

        let (action_tx, mut action_rx) = unbounded_channel::<InboundAction>();
        let (event_tx, event_rx) = unbounded_channel::<RelayEvent>();

        tokio::spawn({
            let own_id = id.clone();
            async move {
                loop {
                    tokio::select! {
                        action = action_rx.recv() => match action {
                            Some(InboundAction::Raw(data)) => {
                                if ws_writer.send(into_message::<S>(data)).await.is_err() {
                                    break;
                                }
                            }
                            Some(InboundAction::Stop) | None => {
                                let _ = ws_writer.close().await;
                                break;
                            }
                        },
                        frame = ws_receiver.next() => match frame {
                            Some(Ok(message)) => {
                                if let Some(event) = decode::<S>(message)
                                    .and_then(|output| RelayEvent::from_message(&own_id, output))
                                    && event_tx.send(event).is_err()
                                {
                                    log::debug!("Event receiver dropped, ignoring relay events");
                                }
                            }
                            Some(Err(err)) => {
                                log::warn!("Relay connection failed: {err}");
                                break;
                            }
                            None => break,
                        },
                    }
                }
                log::info!("Disconnected from relay");
                let _ = event_tx.send(RelayEvent::Disconnected);
            }
        });

        Ok(ClientProtocolHandle {
            id,
            action_tx,
            event_rx,
        })
    }
}

fn decode<S>(message: Message) -> Option<OutputMessage>
where
    S: Schema,
    OutputMessage: Deserialize<S>,
{
    let raw_message: Vec<u8> = match message {
        Message::Text(text) => Bytes::from(text).into(),
        Message::Binary(bytes) => bytes.into(),
        _ => return None,
    };

    match <OutputMessage as Deserialize<S>>::deserialize(&raw_message) {
        Ok(output) => Some(output),
        Err(err) => {
            log::error!("Ignored relay message: {err}");
            None
        }
    }
}

fn into_message<S: Schema>(data: Vec<u8>) -> Message {
    match S::schema_type() {
        SchemaType::Text => match String::from_utf8(data) {
            Ok(text) => Message::Text(text.into()),
            Err(err) => Message::Binary(err.into_bytes().into()),
        },
        SchemaType::Binary => Message::Binary(data.into()),
    }
}
