use crate::domain::matcher::{self, MatchSource};
use crate::error::AppError;
use crate::state::SharedState;
use crate::taxonomy::{self, PoseItem, RemedyItem};
use crate::web::session::UserSession;
use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct PoseRequest {
    symptoms: Vec<String>,
    /// Caller-supplied catalog overrides the loaded one for this
    /// request; the bundled fallback still applies on no match.
    #[serde(default)]
    catalog: Option<Vec<PoseItem>>,
}

#[derive(Debug, Deserialize)]
struct RemedyRequest {
    symptoms: Vec<String>,
    #[serde(default)]
    catalog: Option<Vec<RemedyItem>>,
}

#[derive(Debug, Deserialize)]
struct AiRequest {
    symptoms: Vec<String>,
}

#[derive(Debug, Serialize)]
struct PoseResponse {
    poses: Vec<PoseItem>,
    source: &'static str,
}

#[derive(Debug, Serialize)]
struct RemedyResponse {
    remedies: Vec<RemedyItem>,
    source: &'static str,
}

#[derive(Debug, Serialize)]
struct AiResponse {
    poses: Vec<PoseItem>,
    pose_source: &'static str,
    remedies: Vec<RemedyItem>,
    remedy_source: &'static str,
}

fn source_str(source: MatchSource) -> &'static str {
    match source {
        MatchSource::Generative => "generative",
        MatchSource::Catalog => "catalog",
        MatchSource::Fallback => "fallback",
    }
}

fn require_symptoms(symptoms: &[String]) -> Result<(), AppError> {
    if matcher::normalize_tags(symptoms).is_empty() {
        return Err(AppError::Validation(
            "at least one symptom is required".into(),
        ));
    }
    Ok(())
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/yoga", post(yoga))
        .route("/remedies", post(remedies))
        .route("/ai", post(ai))
        .with_state(state)
}

async fn yoga(
    UserSession(_user_id): UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<PoseRequest>,
) -> Result<Json<PoseResponse>, AppError> {
    require_symptoms(&payload.symptoms)?;
    let tags = matcher::normalize_tags(&payload.symptoms);

    let catalog: &[PoseItem] = match &payload.catalog {
        Some(supplied) => supplied,
        None => &state.taxonomy.poses,
    };

    let tier1 = matcher::match_poses(&tags, catalog);
    let (poses, source) = if tier1.is_empty() {
        (
            matcher::fallback_poses(&tags, taxonomy::fallback()),
            MatchSource::Fallback,
        )
    } else {
        (tier1, MatchSource::Catalog)
    };

    Ok(Json(PoseResponse {
        poses,
        source: source_str(source),
    }))
}

async fn remedies(
    UserSession(_user_id): UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<RemedyRequest>,
) -> Result<Json<RemedyResponse>, AppError> {
    require_symptoms(&payload.symptoms)?;
    let tags = matcher::normalize_tags(&payload.symptoms);

    let catalog: &[RemedyItem] = match &payload.catalog {
        Some(supplied) => supplied,
        None => &state.taxonomy.remedies,
    };

    let tier1 = matcher::match_remedies(&tags, catalog);
    let (remedies, source) = if tier1.is_empty() {
        (
            matcher::fallback_remedies(&tags, taxonomy::fallback()),
            MatchSource::Fallback,
        )
    } else {
        (tier1, MatchSource::Catalog)
    };

    Ok(Json(RemedyResponse {
        remedies,
        source: source_str(source),
    }))
}

/// Generative recommendations. The reply is resolved at the service
/// boundary; anything unusable degrades to the bundled fallback, so
/// this endpoint never fails on external-service trouble.
async fn ai(
    UserSession(_user_id): UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<AiRequest>,
) -> Result<Json<AiResponse>, AppError> {
    require_symptoms(&payload.symptoms)?;

    let reply = state.genai.recommendations(&payload.symptoms).await;
    let outcome = matcher::resolve_generative(reply, &payload.symptoms, taxonomy::fallback());

    Ok(Json(AiResponse {
        poses: outcome.poses,
        pose_source: source_str(outcome.pose_source),
        remedies: outcome.remedies,
        remedy_source: source_str(outcome.remedy_source),
    }))
}
