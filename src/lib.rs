//! Player position relay for the walkable campus.

pub mod api;

#[cfg(feature = "client")]
pub mod client;
#[cfg(feature = "server")]
pub mod server;
