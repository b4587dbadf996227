//! HTTP routing (glue/config row, §6): `/game/:match_id` and the spectator
//! route, plus a lobby-listing endpoint. Grounded in
//! `echo-session-ws-gateway`'s axum router setup.

use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use base64::Engine;
use serde::Deserialize;

use crate::lobby::Lobby;
use crate::session::messages::ConfigChange;

use super::gateway::WebSocketTransport;

#[derive(Clone)]
pub struct AppState {
    pub lobby: Arc<Lobby>,
}

#[derive(Debug, Deserialize)]
pub struct JoinQuery {
    /// Optional base64-JSON deep-link config (§6), applied as the initial
    /// `configChange` once the socket opens.
    pub config: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/game/{match_id}", get(join_match))
        .route("/spectate/{match_id}", get(spectate_match))
        .route("/matches", get(list_matches))
        .route("/matches/{mode}/find", get(find_or_join_mode))
        .with_state(state)
}

/// Lobby-listing glue (§6, "HTTP endpoints serving... lobby listings"):
/// resolves a mode name to a joinable match id, creating one if none has
/// spare capacity (§4.10 `findOrJoin`). Clients call this first, then open
/// the game socket at `/game/<matchId>` with the returned id.
async fn find_or_join_mode(Path(mode): Path<String>, State(state): State<AppState>) -> impl IntoResponse {
    match crate::lobby::default_mode_factory(&mode) {
        Some(mode) => {
            // Only consumed if `find_or_join` actually creates a match; the
            // match's own per-tick determinism (§4.6) only needs this seed
            // to be stable *within* the match, not reproducible across runs.
            let seed = std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).map(|d| d.as_nanos() as u64).unwrap_or(1);
            let match_id = state.lobby.find_or_join(mode, seed).await;
            axum::Json(serde_json::json!({ "matchId": match_id.0 })).into_response()
        }
        None => (axum::http::StatusCode::NOT_FOUND, format!("unknown mode: {mode}")).into_response(),
    }
}

/// Decodes the `?config=` deep-link query param (§6: "optionally
/// base64-JSON in the URL query for deep-links") into the same
/// `ConfigChange` shape an inbound `configChange` frame carries. Malformed
/// or absent deep-links fall back to waiting for an explicit frame, per
/// the input-error policy of §7 ("drop the single frame... keep the
/// endpoint") applied to a bad query param instead of a bad frame.
fn decode_deep_link(query: &JoinQuery) -> Option<ConfigChange> {
    let encoded = query.config.as_deref()?;
    let bytes = base64::engine::general_purpose::STANDARD.decode(encoded).ok()?;
    serde_json::from_slice(&bytes).ok()
}

async fn join_match(
    Path(match_id): Path<u64>,
    Query(query): Query<JoinQuery>,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let deep_link = decode_deep_link(&query);
    let (read_deadline, write_deadline) = (state.lobby.tunables().read_deadline, state.lobby.tunables().write_deadline);
    ws.on_upgrade(move |socket| async move {
        let transport = WebSocketTransport::with_deadlines(socket, read_deadline, write_deadline);
        state.lobby.run_player_session(crate::lobby::MatchId(match_id), transport, deep_link).await;
    })
}

async fn spectate_match(
    Path(match_id): Path<u64>,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let (read_deadline, write_deadline) = (state.lobby.tunables().read_deadline, state.lobby.tunables().write_deadline);
    ws.on_upgrade(move |socket| async move {
        let transport = WebSocketTransport::with_deadlines(socket, read_deadline, write_deadline);
        state.lobby.run_spectator_session(crate::lobby::MatchId(match_id), transport).await;
    })
}

async fn list_matches(State(state): State<AppState>) -> impl IntoResponse {
    axum::Json(state.lobby.list().await)
}
