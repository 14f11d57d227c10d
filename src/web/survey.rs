use crate::db::{self, NewSurvey};
use crate::domain::survey::{risk_profile, RiskScore, RISK_RULES_VERSION};
use crate::error::AppError;
use crate::state::SharedState;
use crate::web::session::UserSession;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct SurveyPayload {
    age: Option<i32>,
    last_period_date: Option<String>,
    period_duration: Option<String>,
    cycle_length_band: Option<String>,
    period_regularity: Option<String>,
    hair_growth: Option<String>,
    acne: Option<String>,
    hair_thinning: Option<String>,
    weight_gain: Option<String>,
    sugar_craving: Option<String>,
    family_history: Option<String>,
    fertility: Option<String>,
    mood_swings: Option<String>,
}

#[derive(Debug, Serialize)]
struct RiskProfileResponse {
    rules_version: &'static str,
    risks: Vec<RiskScore>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", post(submit))
        .route("/risk-profile", get(get_risk_profile))
        .with_state(state)
}

/// Accepts ISO dates and the legacy "14 Jan 2024" form clients still
/// send.
fn parse_survey_date(raw: &str) -> Result<NaiveDate, AppError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d %b %Y"))
        .map_err(|_| AppError::Validation(format!("unrecognized date: {trimmed}")))
}

async fn submit(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<SurveyPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    let raw_date = payload
        .last_period_date
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| AppError::Validation("last_period_date is required".into()))?;
    let last_period_date = parse_survey_date(raw_date)?;

    let survey = NewSurvey {
        age: payload.age,
        last_period_date: Some(last_period_date),
        period_duration: payload.period_duration,
        cycle_length_band: payload.cycle_length_band,
        period_regularity: payload.period_regularity,
        hair_growth: payload.hair_growth,
        acne: payload.acne,
        hair_thinning: payload.hair_thinning,
        weight_gain: payload.weight_gain,
        sugar_craving: payload.sugar_craving,
        family_history: payload.family_history,
        fertility: payload.fertility,
        mood_swings: payload.mood_swings,
    };

    let survey_id = db::insert_survey(&state.pool, user_id, &survey).await?;

    Ok(Json(serde_json::json!({
        "survey_id": survey_id,
        "survey_completed": true,
    })))
}

/// Risk categories triggered by the latest submission. No submission
/// yet is not an error; the profile is simply empty.
async fn get_risk_profile(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<RiskProfileResponse>, AppError> {
    let risks = match db::latest_survey(&state.pool, user_id).await? {
        Some(survey) => risk_profile(&survey.answers()),
        None => Vec::new(),
    };

    Ok(Json(RiskProfileResponse {
        rules_version: RISK_RULES_VERSION,
        risks,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_dates_parse() {
        assert_eq!(
            parse_survey_date("2024-01-14").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 14).unwrap()
        );
    }

    #[test]
    fn legacy_day_month_year_parses() {
        assert_eq!(
            parse_survey_date("14 Jan 2024").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 14).unwrap()
        );
    }

    #[test]
    fn junk_dates_are_rejected() {
        assert!(parse_survey_date("soonish").is_err());
        assert!(parse_survey_date("14/01/2024").is_err());
    }
}
