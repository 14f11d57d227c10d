use anyhow::Result;
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A yoga pose tagged with the symptoms it relieves.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PoseItem {
    pub name: String,
    pub duration: String,
    pub steps: Vec<String>,
    pub benefits: Vec<String>,
    pub relieves_symptoms: Vec<String>,
    pub precautions: Vec<String>,
}

/// A remedy tagged with symptom categories and/or a single badge.
/// Absent fields deserialize to empty values so matching never has to
/// deal with missing data.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RemedyItem {
    #[serde(alias = "title")]
    pub name: String,
    #[serde(deserialize_with = "string_or_seq")]
    pub category: Vec<String>,
    pub badge: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub benefits: String,
    pub best_time_to_consume: String,
    pub precautions: Vec<String>,
    pub image: String,
}

// Catalog data in the wild carries `category` both as a bare string and
// as a list; accept either.
fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values,
    })
}

#[derive(Deserialize, Default)]
struct RecipesFile {
    #[serde(default)]
    remedies: Vec<RemedyItem>,
}

/// Read-only pose and remedy catalogs, loaded once at startup.
#[derive(Debug, Default)]
pub struct TaxonomyStore {
    pub poses: Vec<PoseItem>,
    pub remedies: Vec<RemedyItem>,
}

impl TaxonomyStore {
    /// Load `yoga.json` (a pose array) and `recipes.json`
    /// (`{"remedies": [...]}`) from `dir`. A missing or unparseable file
    /// leaves that catalog empty; the bundled fallback still answers.
    pub fn load(dir: &Path) -> Self {
        let poses = match std::fs::read_to_string(dir.join("yoga.json")) {
            Ok(raw) => match serde_json::from_str::<Vec<PoseItem>>(&raw) {
                Ok(poses) => poses,
                Err(err) => {
                    tracing::warn!("yoga.json is not a valid pose catalog: {err}");
                    Vec::new()
                }
            },
            Err(err) => {
                tracing::warn!("yoga.json not loaded: {err}");
                Vec::new()
            }
        };

        let remedies = match std::fs::read_to_string(dir.join("recipes.json")) {
            Ok(raw) => match serde_json::from_str::<RecipesFile>(&raw) {
                Ok(file) => file.remedies,
                Err(err) => {
                    tracing::warn!("recipes.json is not a valid remedy catalog: {err}");
                    Vec::new()
                }
            },
            Err(err) => {
                tracing::warn!("recipes.json not loaded: {err}");
                Vec::new()
            }
        };

        tracing::info!(
            poses = poses.len(),
            remedies = remedies.len(),
            "taxonomy catalogs loaded"
        );
        TaxonomyStore { poses, remedies }
    }
}

/// Bundled last-resort catalog, keyed by normalized symptom tag.
#[derive(Debug, Deserialize)]
pub struct FallbackCatalog {
    pub version: String,
    pub poses: HashMap<String, Vec<PoseItem>>,
    pub remedies: HashMap<String, Vec<RemedyItem>>,
}

/// Tag whose entries answer when nothing else matches.
pub const FALLBACK_DEFAULT_TAG: &str = "cramps";

static FALLBACK: Lazy<FallbackCatalog> = Lazy::new(|| {
    serde_json::from_str(include_str!("fallback_catalog.json"))
        .expect("bundled fallback catalog is valid JSON")
});

pub fn fallback() -> &'static FallbackCatalog {
    &FALLBACK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_fallback_parses_and_covers_the_default_tag() {
        let fb = fallback();
        assert!(!fb.version.is_empty());
        assert!(!fb.poses[FALLBACK_DEFAULT_TAG].is_empty());
        assert!(!fb.remedies[FALLBACK_DEFAULT_TAG].is_empty());
    }

    #[test]
    fn remedy_category_accepts_string_or_list() {
        let single: RemedyItem =
            serde_json::from_str(r#"{"name":"Ginger Tea","category":"cramps"}"#).unwrap();
        assert_eq!(single.category, vec!["cramps"]);

        let many: RemedyItem =
            serde_json::from_str(r#"{"name":"Ginger Tea","category":["cramps","bloating"]}"#)
                .unwrap();
        assert_eq!(many.category.len(), 2);
    }

    #[test]
    fn remedy_title_aliases_to_name() {
        let remedy: RemedyItem = serde_json::from_str(r#"{"title":"Ajwain Kadha"}"#).unwrap();
        assert_eq!(remedy.name, "Ajwain Kadha");
        assert!(remedy.badge.is_empty());
    }

    #[test]
    fn missing_directory_yields_empty_catalogs() {
        let store = TaxonomyStore::load(Path::new("/nonexistent/taxonomy"));
        assert!(store.poses.is_empty());
        assert!(store.remedies.is_empty());
    }
}
