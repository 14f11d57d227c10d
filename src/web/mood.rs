use crate::domain::playlist::{self, Mood, PlaylistEntry};
use crate::error::AppError;
use crate::services::music::PlaylistMetadata;
use crate::state::SharedState;
use crate::web::session::UserSession;
use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct PlaylistRequest {
    mood: String,
    intensity: u8,
}

#[derive(Debug, Serialize)]
struct PlaylistResponse {
    mood: &'static str,
    intensity: u8,
    playlist_id: &'static str,
    name: &'static str,
    description: &'static str,
    /// Catalog decoration when the music API is reachable; the
    /// selection itself never depends on it.
    metadata: Option<PlaylistMetadata>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/playlist", post(select_playlist))
        .with_state(state)
}

/// Both misses are the same kind of miss: an unknown mood and an
/// out-of-range intensity each name a table entry that does not exist.
fn resolve_playlist(
    mood_raw: &str,
    intensity: u8,
) -> Result<(Mood, &'static PlaylistEntry), AppError> {
    let mood = Mood::try_from(mood_raw)
        .map_err(|_| AppError::NotFound(format!("unknown mood: {mood_raw}")))?;
    let entry = playlist::select(mood, intensity).ok_or_else(|| {
        AppError::NotFound(format!("no playlist for {}/{intensity}", mood.as_str()))
    })?;
    Ok((mood, entry))
}

async fn select_playlist(
    UserSession(_user_id): UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<PlaylistRequest>,
) -> Result<Json<PlaylistResponse>, AppError> {
    let (mood, entry) = resolve_playlist(&payload.mood, payload.intensity)?;

    let metadata = state.music.playlist_metadata(entry.external_id).await;

    Ok(Json(PlaylistResponse {
        mood: mood.as_str(),
        intensity: payload.intensity,
        playlist_id: entry.external_id,
        name: entry.name,
        description: entry.description,
        metadata,
    }))
}
