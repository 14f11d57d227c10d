use crate::db;
use crate::domain::cycle::{self, CyclePhase};
use crate::error::AppError;
use crate::state::SharedState;
use crate::web::session::UserSession;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct CycleStatusResponse {
    survey_completed: bool,
    cycle_length: i32,
    period_length: i32,
    last_period_date: Option<NaiveDate>,
    cycle_day: Option<i64>,
    phase: Option<&'static str>,
    next_period: Option<NaiveDate>,
    ovulation_start: Option<NaiveDate>,
    ovulation_end: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct SettingsPayload {
    cycle_length: Option<i64>,
    period_length: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct PeriodDatesPayload {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/settings", post(update_settings))
        .route("/period-dates", post(update_period_dates))
        .with_state(state)
}

/// Today's cycle position derived from the profile lengths and the
/// latest recorded period date. Without a period date the response is
/// the incomplete shape: profile fields only, derived fields null.
async fn status(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<CycleStatusResponse>, AppError> {
    let user = db::find_user_by_id(&state.pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".into()))?;

    let last_period = db::latest_survey(&state.pool, user_id)
        .await?
        .and_then(|survey| survey.last_period_date);

    let Some(last_period) = last_period else {
        return Ok(Json(CycleStatusResponse {
            survey_completed: user.survey_completed,
            cycle_length: user.cycle_length,
            period_length: user.period_length,
            last_period_date: None,
            cycle_day: None,
            phase: None,
            next_period: None,
            ovulation_start: None,
            ovulation_end: None,
        }));
    };

    let today = Utc::now().date_naive();
    let snapshot = cycle::snapshot(
        last_period,
        user.cycle_length as i64,
        user.period_length as i64,
        today,
    );
    let prediction = cycle::predict(last_period, user.cycle_length as i64);

    Ok(Json(CycleStatusResponse {
        survey_completed: user.survey_completed,
        cycle_length: user.cycle_length,
        period_length: user.period_length,
        last_period_date: Some(last_period),
        cycle_day: Some(snapshot.cycle_day),
        phase: snapshot.phase.as_ref().map(CyclePhase::as_str),
        next_period: Some(prediction.next_period),
        ovulation_start: Some(prediction.ovulation_start),
        ovulation_end: Some(prediction.ovulation_end),
    }))
}

async fn update_settings(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<SettingsPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = db::find_user_by_id(&state.pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".into()))?;

    let cycle_length = payload.cycle_length.unwrap_or(user.cycle_length as i64);
    let period_length = payload.period_length.unwrap_or(user.period_length as i64);
    cycle::validate_lengths(cycle_length, period_length)?;

    db::update_cycle_settings(
        &state.pool,
        user_id,
        payload.cycle_length.map(|v| v as i32),
        payload.period_length.map(|v| v as i32),
    )
    .await?;

    Ok(Json(serde_json::json!({
        "cycle_length": cycle_length,
        "period_length": period_length,
    })))
}

async fn update_period_dates(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<PeriodDatesPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    if payload.end_date < payload.start_date {
        return Err(AppError::Validation(
            "end_date must not precede start_date".into(),
        ));
    }

    db::update_period_dates(&state.pool, user_id, payload.start_date, payload.end_date).await?;

    Ok(Json(serde_json::json!({
        "start_date": payload.start_date,
        "end_date": payload.end_date,
    })))
}
