use clap::Parser;
use quadsync::{
    api::schema::json::Json,
    server::{
        RelayServer, config::ServerConfig, error::RelayServerError, protocol::ws::WebSocketProtocol,
    },
};

#[tokio::main]
async fn main() -> Result<(), RelayServerError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::parse();
    log::info!(
        "Starting relay on {} ({} allowed origins)",
        config.listen_addr(),
        config.allowed_origins.len()
    );

    let protocol = WebSocketProtocol::bind(&config).await?;
    RelayServer::new(protocol, Json {}).run().await
}
