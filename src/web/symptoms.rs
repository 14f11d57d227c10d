use crate::db;
use crate::error::AppError;
use crate::state::SharedState;
use crate::web::session::UserSession;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

const PAIN_LEVEL_RANGE: std::ops::RangeInclusive<i16> = 0..=10;

#[derive(Debug, Deserialize)]
struct SymptomPayload {
    entry_date: NaiveDate,
    flow_level: Option<String>,
    mood: Option<String>,
    pain_level: Option<i16>,
    notes: Option<String>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", post(upsert_entry))
        .route("/log", get(list_entries))
        .route("/:date", get(get_entry))
        .with_state(state)
}

/// One diary row per day; resubmitting a date overwrites that day's
/// entry in place.
async fn upsert_entry(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<SymptomPayload>,
) -> Result<Json<db::SymptomEntry>, AppError> {
    if let Some(pain) = payload.pain_level {
        if !PAIN_LEVEL_RANGE.contains(&pain) {
            return Err(AppError::Validation(format!(
                "pain_level must be between {} and {}, got {pain}",
                PAIN_LEVEL_RANGE.start(),
                PAIN_LEVEL_RANGE.end()
            )));
        }
    }

    let entry = db::upsert_symptom_entry(
        &state.pool,
        user_id,
        payload.entry_date,
        payload.flow_level.as_deref(),
        payload.mood.as_deref(),
        payload.pain_level,
        payload.notes.as_deref(),
    )
    .await?;

    Ok(Json(entry))
}

async fn get_entry(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<db::SymptomEntry>, AppError> {
    let entry = db::get_symptom_entry(&state.pool, user_id, date)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no symptom entry for {date}")))?;
    Ok(Json(entry))
}

async fn list_entries(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<Vec<db::SymptomEntry>>, AppError> {
    let entries = db::list_symptom_entries(&state.pool, user_id).await?;
    Ok(Json(entries))
}
