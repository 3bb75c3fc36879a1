//! Headless player that joins a relay and walks in a circle around the quad.
//!
//! ```text
//! cargo run --example walker -- ws://localhost:3001 Walker
//! ```

use std::time::Duration;

use quadsync::{
    api::{message::Position, schema::json::Json},
    client::{
        RelayClient,
        protocol::ws::WebSocketClientProtocol,
        state::{RelayEvent, RemotePlayers},
        throttle::MovementThrottle,
    },
};

const FRAME: Duration = Duration::from_millis(16);
const RADIUS: f64 = 6.0;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let url = args
        .next()
        .unwrap_or_else(|| "ws://localhost:3001".to_string());
    let username = args.next().unwrap_or_else(|| "Walker".to_string());

    let (client, mut events) =
        RelayClient::connect(WebSocketClientProtocol::new(url), Json {}).await?;
    client.join(username)?;

    let mut others = RemotePlayers::default();
    let mut throttle = MovementThrottle::default();
    let mut frame = tokio::time::interval(FRAME);
    let mut angle: f64 = 0.0;

    loop {
        tokio::select! {
            _ = frame.tick() => {
                angle += 0.02;
                let position = Position::new(RADIUS * angle.cos(), 1.0, RADIUS * angle.sin());
                if let Some(position) = throttle.on_frame(position) {
                    client.submit_position(position)?;
                }
            }
            event = events.recv() => {
                let Some(event) = event else {
                    break;
                };
                others.apply(&event);
                match &event {
                    RelayEvent::PlayerJoined(record) => {
                        log::info!("{} joined, {} others around", record.username, others.len());
                    }
                    RelayEvent::PlayerLeft { id } => {
                        log::info!("{id} left, {} others around", others.len());
                    }
                    RelayEvent::Disconnected => break,
                    _ => {}
                }
            }
        }
    }

    Ok(())
}
