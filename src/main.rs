//! Process entry point (glue/config row, §6).

use clap::Parser;

use arena_server::config::ServerConfig;
use arena_server::lobby::Lobby;
use arena_server::net::http::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = ServerConfig::parse();
    log::info!(
        "starting arena-server: tick_rate={}Hz world={}x{} listen={}",
        config.tick_rate,
        config.world_width,
        config.world_height,
        config.listen_addr
    );

    let lobby = Lobby::new(config.tunables(), config.max_global_players, config.max_players_per_match);

    tokio::spawn(lobby.clone().spawn_cull_task(config.match_cull_interval()));

    let state = AppState { lobby };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    log::info!("listening on {}", config.listen_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
