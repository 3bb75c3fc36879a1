use serde_json::Value;

use crate::api::{
    error::SchemaError,
    message::{InputMessage, OutputMessage, PlayerId, PlayerRecord, Position, Roster},
    schema::{Deserialize, Schema, SchemaType, Serialize},
};

#[derive(Debug, Default, Clone, Copy)]
pub struct Json {}

impl Schema for Json {
    fn schema_type() -> SchemaType {
        SchemaType::Text
    }
}

// Events

const PLAYER_JOIN: &str = "playerJoin";
const PLAYER_MOVEMENT: &str = "playerMovement";

const CONNECTED: &str = "connected";
const CURRENT_PLAYERS: &str = "currentPlayers";
const NEW_PLAYER: &str = "newPlayer";
const PLAYER_MOVED: &str = "playerMoved";
const PLAYER_DISCONNECTED: &str = "playerDisconnected";
const ERROR: &str = "error";

const USERNAME: &str = "username";

#[derive(serde::Serialize)]
struct OutgoingFrame<'a, T: serde::Serialize> {
    event: &'a str,
    data: T,
}

#[derive(serde::Deserialize)]
struct IncomingFrame {
    event: String,
    #[serde(default)]
    data: Value,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct IdPayload<I> {
    id: I,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct MovedPayload<I> {
    id: I,
    #[serde(flatten)]
    position: Position,
}

#[derive(serde::Serialize)]
struct JoinPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct ErrorPayload<D> {
    description: D,
}

fn encode<T: serde::Serialize>(event: &str, data: T) -> Result<Vec<u8>, SchemaError> {
    serde_json::to_vec(&OutgoingFrame { event, data })
        .map_err(|err| SchemaError::Encode(err.to_string()))
}

fn decode_frame(buf: &[u8]) -> Result<IncomingFrame, SchemaError> {
    serde_json::from_slice(buf).map_err(|err| SchemaError::Malformed(err.to_string()))
}

fn payload<T: serde::de::DeserializeOwned>(event: &str, data: Value) -> Result<T, SchemaError> {
    serde_json::from_value(data).map_err(|err| SchemaError::InvalidPayload {
        event: event.to_string(),
        reason: err.to_string(),
    })
}

impl Serialize<Json> for InputMessage {
    fn serialize(&self) -> Result<Vec<u8>, SchemaError> {
        match self {
            InputMessage::Join { username } => encode(
                PLAYER_JOIN,
                JoinPayload {
                    username: username.as_deref(),
                },
            ),
            InputMessage::Movement(position) => encode(PLAYER_MOVEMENT, position),
        }
    }
}

impl Deserialize<Json> for InputMessage {
    fn deserialize(buf: &[u8]) -> Result<Self, SchemaError> {
        let frame = decode_frame(buf)?;
        match frame.event.as_str() {
            // A username that is absent or not a string falls back to a guest name later on.
            PLAYER_JOIN => Ok(InputMessage::Join {
                username: frame
                    .data
                    .get(USERNAME)
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }),
            PLAYER_MOVEMENT => Ok(InputMessage::Movement(payload(
                PLAYER_MOVEMENT,
                frame.data,
            )?)),
            _ => Err(SchemaError::UnknownEvent(frame.event)),
        }
    }
}

impl Serialize<Json> for OutputMessage {
    fn serialize(&self) -> Result<Vec<u8>, SchemaError> {
        match self {
            OutputMessage::Connected { id } => encode(CONNECTED, IdPayload { id }),
            OutputMessage::CurrentPlayers(players) => encode(CURRENT_PLAYERS, players),
            OutputMessage::NewPlayer(record) => encode(NEW_PLAYER, record),
            OutputMessage::PlayerMoved { id, position } => encode(
                PLAYER_MOVED,
                MovedPayload {
                    id,
                    position: *position,
                },
            ),
            OutputMessage::PlayerDisconnected { id } => {
                encode(PLAYER_DISCONNECTED, IdPayload { id })
            }
            OutputMessage::GenericError { description } => {
                encode(ERROR, ErrorPayload { description })
            }
        }
    }
}

impl Deserialize<Json> for OutputMessage {
    fn deserialize(buf: &[u8]) -> Result<Self, SchemaError> {
        let frame = decode_frame(buf)?;
        let event = frame.event.as_str();
        match event {
            CONNECTED => {
                let IdPayload { id } = payload::<IdPayload<PlayerId>>(event, frame.data)?;
                Ok(OutputMessage::Connected { id })
            }
            CURRENT_PLAYERS => Ok(OutputMessage::CurrentPlayers(payload::<Roster>(
                event, frame.data,
            )?)),
            NEW_PLAYER => Ok(OutputMessage::NewPlayer(payload::<PlayerRecord>(
                event, frame.data,
            )?)),
            PLAYER_MOVED => {
                let MovedPayload { id, position } =
                    payload::<MovedPayload<PlayerId>>(event, frame.data)?;
                Ok(OutputMessage::PlayerMoved { id, position })
            }
            PLAYER_DISCONNECTED => {
                let IdPayload { id } = payload::<IdPayload<PlayerId>>(event, frame.data)?;
                Ok(OutputMessage::PlayerDisconnected { id })
            }
            ERROR => {
                let ErrorPayload { description } =
                    payload::<ErrorPayload<String>>(event, frame.data)?;
                Ok(OutputMessage::GenericError { description })
            }
            _ => Err(SchemaError::UnknownEvent(frame.event)),
        }
    }
}
