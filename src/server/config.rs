use std::{fmt::Display, str::FromStr, time::Duration};

use clap::Parser;

use crate::server::error::RelayServerError;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_PING_INTERVAL_SECS: u64 = 25;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_ALLOWED_ORIGINS: [&str; 3] = [
    "https://fun-game-*.vercel.app",
    "http://localhost:5173",
    "http://localhost:3000",
];

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Relays player positions between campus clients")]
pub struct ServerConfig {
    /// Address to bind to
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Origins allowed to open a connection; `*` matches any run of characters
    #[arg(
        long = "allowed-origin",
        env = "ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_values_t = default_allowed_origins()
    )]
    pub allowed_origins: Vec<OriginPattern>,

    /// Seconds between keep-alive pings
    #[arg(long, default_value_t = DEFAULT_PING_INTERVAL_SECS)]
    pub ping_interval_secs: u64,

    /// Seconds without any inbound frame before a peer counts as gone
    #[arg(long, default_value_t = DEFAULT_IDLE_TIMEOUT_SECS)]
    pub idle_timeout_secs: u64,
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs.max(1))
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs.max(1))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            allowed_origins: default_allowed_origins(),
            ping_interval_secs: DEFAULT_PING_INTERVAL_SECS,
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
        }
    }
}

fn default_allowed_origins() -> Vec<OriginPattern> {
    DEFAULT_ALLOWED_ORIGINS
        .iter()
        .map(|pattern| OriginPattern {
            pattern: pattern.to_string(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginPattern {
    pattern: String,
}

impl OriginPattern {
    pub fn matches(&self, origin: &str) -> bool {
        let mut segments = self.pattern.split('*');
        let head = segments.next().unwrap_or_default();
        let Some(mut rest) = origin.strip_prefix(head) else {
            return false;
        };

        let tail: Vec<&str> = segments.collect();
        let Some((last, middle)) = tail.split_last() else {
            return rest.is_empty();
        };

        for segment in middle {
            match rest.find(segment) {
                Some(at) => rest = &rest[at + segment.len()..],
                None => return false,
            }
        }
        rest.ends_with(last)
    }

    pub fn any_matches(patterns: &[OriginPattern], origin: &str) -> bool {
        patterns.iter().any(|pattern| pattern.matches(origin))
    }
}

impl FromStr for OriginPattern {
    type Err = RelayServerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let pattern = value.trim().trim_end_matches('/');
        if pattern.is_empty() || pattern.chars().any(char::is_whitespace) {
            return Err(RelayServerError::InvalidOriginPattern(value.to_string()));
        }
        Ok(Self {
            pattern: pattern.to_string(),
        })
    }
}

impl Display for OriginPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.pattern)
    }
}
