use rand::Rng;

use crate::api::message::{PlayerId, PlayerRecord, Position};

pub const PALETTE: [&str; 6] = [
    "#FF0000", "#00FF00", "#0000FF", "#FFFF00", "#FF00FF", "#00FFFF",
];

pub const SPAWN_HALF_EXTENT: f64 = 10.0;
pub const SPAWN_HEIGHT: f64 = 1.0;

const GUEST_PREFIX: &str = "Guest_";
const GUEST_ID_CHARS: usize = 4;

pub fn spawn_position<R: Rng + ?Sized>(rng: &mut R) -> Position {
    Position {
        x: rng.random_range(-SPAWN_HALF_EXTENT..=SPAWN_HALF_EXTENT),
        y: SPAWN_HEIGHT,
        z: rng.random_range(-SPAWN_HALF_EXTENT..=SPAWN_HALF_EXTENT),
    }
}

pub fn pick_color<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    PALETTE[rng.random_range(0..PALETTE.len())]
}

/// Blank or missing names become `Guest_` followed by the first characters of the id.
pub fn resolve_username(id: &PlayerId, username: Option<String>) -> String {
    match username {
        Some(username) if !username.trim().is_empty() => username,
        _ => {
            let short: String = id.as_str().chars().take(GUEST_ID_CHARS).collect();
            format!("{GUEST_PREFIX}{short}")
        }
    }
}

pub fn spawn<R: Rng + ?Sized>(id: PlayerId, username: Option<String>, rng: &mut R) -> PlayerRecord {
    PlayerRecord {
        username: resolve_username(&id, username),
        position: spawn_position(rng),
        color: pick_color(rng).to_string(),
        id,
    }
}
