use axum::http::{HeaderValue, Method, request::Parts};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::server::config::OriginPattern;

pub const STATUS_MESSAGE: &str = "College Simulator Multiplayer Server";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayStatus {
    pub status: &'static str,
    pub players: usize,
    pub connections: usize,
    pub message: &'static str,
}

impl RelayStatus {
    pub fn ok(players: usize, connections: usize) -> Self {
        Self {
            status: "ok",
            players,
            connections,
            message: STATUS_MESSAGE,
        }
    }
}

pub fn cors_layer(allowed_origins: &[OriginPattern]) -> CorsLayer {
    let allowed_origins = allowed_origins.to_vec();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _: &Parts| is_allowed(&allowed_origins, origin),
        ))
        .allow_methods([Method::GET, Method::HEAD])
        .allow_credentials(true)
}

pub(crate) fn is_allowed(allowed_origins: &[OriginPattern], origin: &HeaderValue) -> bool {
    origin
        .to_str()
        .is_ok_and(|origin| OriginPattern::any_matches(allowed_origins, origin))
}
