use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        ConnectInfo, State, WebSocketUpgrade,
        ws::{Message, WebSocket, rejection::WebSocketUpgradeRejection},
    },
    http::{HeaderMap, StatusCode, header::ORIGIN},
    response::{IntoResponse, Response},
    routing::get,
};
use futures::{SinkExt, StreamExt, stream::SplitSink};
use tokio::{
    net::TcpListener,
    sync::mpsc::UnboundedReceiver,
    time::{MissedTickBehavior, interval, timeout},
};

use crate::{
    api::{
        message::{InputMessage, OutputMessage, PlayerId},
        schema::{Deserialize, Schema, SchemaType, Serialize},
    },
    server::{
        RelayServerResult,
        config::{OriginPattern, ServerConfig},
        error::RelayServerError,
        protocol::NetworkProtocol,
        relay::Relay,
        status::{self, RelayStatus},
    },
};

struct ConnectionSettings {
    allowed_origins: Vec<OriginPattern>,
    ping_interval: Duration,
    idle_timeout: Duration,
}

struct RelayApp<S: Schema> {
    relay: Arc<Relay<S>>,
    settings: ConnectionSettings,
}

pub struct WebSocketProtocol {
    listener: TcpListener,
    settings: ConnectionSettings,
}

impl WebSocketProtocol {
    pub async fn bind(config: &ServerConfig) -> Result<Self, RelayServerError> {
        let addr = config.listen_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| RelayServerError::Bind { addr, source })?;

        Ok(Self {
            listener,
            settings: ConnectionSettings {
                allowed_origins: config.allowed_origins.clone(),
                ping_interval: config.ping_interval(),
                idle_timeout: config.idle_timeout(),
            },
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, RelayServerError> {
        Ok(self.listener.local_addr()?)
    }
}

impl NetworkProtocol for WebSocketProtocol {
    async fn run<S>(self, relay: Arc<Relay<S>>) -> RelayServerResult
    where
        S: Schema,
        OutputMessage: Serialize<S>,
        InputMessage: Deserialize<S>,
    {
        log::info!("Relay listening on {}", self.local_addr()?);

        let cors = status::cors_layer(&self.settings.allowed_origins);
        let app = Router::new()
            .route("/", get(accept::<S>))
            .with_state(Arc::new(RelayApp {
                relay,
                settings: self.settings,
            }))
            .layer(cors);

        axum::serve(
            self.listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
        Ok(())
    }
}

async fn accept<S>(
    State(app): State<Arc<RelayApp<S>>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response
where
    S: Schema,
    OutputMessage: Serialize<S>,
    InputMessage: Deserialize<S>,
{
    let Ok(upgrade) = upgrade else {
        let current = RelayStatus::ok(app.relay.player_count(), app.relay.connection_count());
        return Json(current).into_response();
    };

    if !origin_allowed(&app.settings.allowed_origins, &headers) {
        log::warn!("Rejected handshake from {peer}, origin {:?}", headers.get(ORIGIN));
        return (StatusCode::FORBIDDEN, "Origin not allowed").into_response();
    }

    upgrade
        .on_failed_upgrade(move |err| log::debug!("Upgrade from {peer} failed: {err}"))
        .on_upgrade(move |socket| serve_socket(socket, peer, app))
}

async fn serve_socket<S>(socket: WebSocket, peer: SocketAddr, app: Arc<RelayApp<S>>)
where
    S: Schema,
    OutputMessage: Serialize<S>,
    InputMessage: Deserialize<S>,
{
    let id = PlayerId::generate();
    log::info!("Player connected: {id} ({peer})");

    let relay = &app.relay;
    let settings = &app.settings;
    let outbound = relay.open(&id);
    let (write, mut read) = socket.split();
    tokio::spawn(write_loop::<S>(write, outbound, settings.ping_interval));

    loop {
        match timeout(settings.idle_timeout, read.next()).await {
            Ok(Some(Ok(message))) => match message {
                Message::Text(text) => relay.process_message(&id, text.as_str().as_bytes()),
                Message::Binary(bytes) => relay.process_message(&id, &bytes),
                Message::Close(_) => break,
                _ => {}
            },
            Ok(Some(Err(err))) => {
                log::debug!("Read from {id} failed: {err}");
                break;
            }
            Ok(None) => break,
            Err(_) => {
                log::info!("{id} idle for {:?}, dropping", settings.idle_timeout);
                break;
            }
        }
    }

    // Dropping the session closes the outbound channel, which ends the writer.
    relay.disconnect(&id);
    log::info!("Connection closed: {id}");
}

async fn write_loop<S: Schema>(
    mut write: SplitSink<WebSocket, Message>,
    mut outbound: UnboundedReceiver<Vec<u8>>,
    ping_interval: Duration,
) {
    let mut ping = interval(ping_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ping.tick().await;

    loop {
        tokio::select! {
            frame = outbound.recv() => {
                let Some(buffer) = frame else {
                    break;
                };
                let Some(message) = into_message::<S>(buffer) else {
                    continue;
                };
                if write.send(message).await.is_err() {
                    break;
                }
            }
            _ = ping.tick() => {
                if write.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    let _ = write.close().await;
}

fn into_message<S: Schema>(buffer: Vec<u8>) -> Option<Message> {
    match S::schema_type() {
        SchemaType::Text => match String::from_utf8(buffer) {
            Ok(text) => Some(Message::Text(text.into())),
            Err(err) => {
                log::error!("Text schema produced invalid UTF-8: {err}");
                None
            }
        },
        SchemaType::Binary => Some(Message::Binary(buffer.into())),
    }
}

// Browsers always send `Origin`; other clients may omit it and are let through.
fn origin_allowed(allowed_origins: &[OriginPattern], headers: &HeaderMap) -> bool {
    headers
        .get(ORIGIN)
        .is_none_or(|origin| status::is_allowed(allowed_origins, origin))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(origin: Option<&'static str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(origin) = origin {
            headers.insert(ORIGIN, HeaderValue::from_static(origin));
        }
        headers
    }

    #[test]
    fn origin_check() {
        let allowed = ServerConfig::default().allowed_origins;

        assert!(origin_allowed(&allowed, &headers(None)));
        assert!(origin_allowed(&allowed, &headers(Some("http://localhost:5173"))));
        assert!(!origin_allowed(&allowed, &headers(Some("https://evil.example"))));
    }

    #[cfg(feature = "json")]
    #[test]
    fn text_schema_frames() {
        use crate::api::schema::json::Json as JsonSchema;

        assert!(matches!(
            into_message::<JsonSchema>(br#"{"event":"connected"}"#.to_vec()),
            Some(Message::Text(text)) if text.as_str() == r#"{"event":"connected"}"#
        ));
        assert!(into_message::<JsonSchema>(vec![0xff, 0xfe]).is_none());
    }
}
