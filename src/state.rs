use crate::services::genai::GenAiService;
use crate::services::music::MusicService;
use crate::taxonomy::TaxonomyStore;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub taxonomy: Arc<TaxonomyStore>,
    pub genai: Arc<GenAiService>,
    pub music: Arc<MusicService>,
    pub session_key: Vec<u8>,
}

pub type SharedState = Arc<AppState>;
