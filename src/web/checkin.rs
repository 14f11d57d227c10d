use crate::db::{self, CheckinOutcome};
use crate::domain::streak;
use crate::error::AppError;
use crate::state::SharedState;
use crate::web::session::UserSession;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
struct DayRecord {
    logged_in: bool,
    checked_in: bool,
    checkin_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct CheckinDataResponse {
    week_start: NaiveDate,
    week_end: NaiveDate,
    records: BTreeMap<NaiveDate, DayRecord>,
    total_logins: i64,
    current_streak: u32,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    check_date: NaiveDate,
    is_new_login: bool,
    is_checked_in: bool,
}

#[derive(Debug, Serialize)]
struct DailyCheckinResponse {
    check_date: NaiveDate,
    is_checked_in: bool,
    already_checked_in: bool,
    checkin_time: Option<DateTime<Utc>>,
    current_streak: u32,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/data", get(checkin_data))
        .route("/login", post(login))
        .route("/daily", post(daily))
        .with_state(state)
}

/// Current ISO week (Monday through Sunday) of check-in records plus
/// the running totals the habit view shows.
async fn checkin_data(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<CheckinDataResponse>, AppError> {
    let today = Utc::now().date_naive();
    let (week_start, week_end) = streak::iso_week_bounds(today);

    let checkins = db::get_checkins_between(&state.pool, user_id, week_start, week_end).await?;
    let mut records = BTreeMap::new();
    for checkin in checkins {
        records.insert(
            checkin.check_date,
            DayRecord {
                logged_in: true,
                checked_in: checkin.is_checked_in,
                checkin_time: checkin.checkin_time,
            },
        );
    }

    let total_logins = db::count_logins(&state.pool, user_id).await?;
    let current_streak = db::current_streak(&state.pool, user_id, today).await?;

    Ok(Json(CheckinDataResponse {
        week_start,
        week_end,
        records,
        total_logins,
        current_streak,
    }))
}

/// Idempotent for the day: the first call creates today's row, every
/// later call reports the existing one.
async fn login(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<LoginResponse>, AppError> {
    let today = Utc::now().date_naive();
    let outcome = db::record_login(&state.pool, user_id, today).await?;

    Ok(Json(LoginResponse {
        check_date: outcome.checkin.check_date,
        is_new_login: outcome.is_new_login,
        is_checked_in: outcome.checkin.is_checked_in,
    }))
}

/// Completes today's check-in. Repeats (including racing duplicates)
/// fold into a success that reports the original check-in time.
async fn daily(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<DailyCheckinResponse>, AppError> {
    let today = Utc::now().date_naive();
    let outcome = db::record_checkin(&state.pool, user_id, today).await?;

    let (checkin, already) = match outcome {
        CheckinOutcome::Completed(checkin) => (checkin, false),
        CheckinOutcome::AlreadyCheckedIn(checkin) => (checkin, true),
    };

    let current_streak = db::current_streak(&state.pool, user_id, today).await?;

    Ok(Json(DailyCheckinResponse {
        check_date: checkin.check_date,
        is_checked_in: checkin.is_checked_in,
        already_checked_in: already,
        checkin_time: checkin.checkin_time,
        current_streak,
    }))
}
