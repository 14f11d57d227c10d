use serde::Deserialize;
use std::collections::{HashMap, HashSet};

use crate::taxonomy::{FallbackCatalog, PoseItem, RemedyItem, TaxonomyStore, FALLBACK_DEFAULT_TAG};

pub const MAX_POSES: usize = 6;
pub const MAX_REMEDIES: usize = 4;

/// Which table produced a match list. Internal detail: callers of the
/// recommendation endpoints always see a plain success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    Generative,
    Catalog,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub poses: Vec<PoseItem>,
    pub pose_source: MatchSource,
    pub remedies: Vec<RemedyItem>,
    pub remedy_source: MatchSource,
}

/// Generative-service output, resolved into a known shape at the
/// service boundary before it reaches the matcher.
#[derive(Debug, Clone)]
pub enum GenAiReply {
    Structured(RecommendationPayload),
    FreeText(String),
    Malformed,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RecommendationPayload {
    pub yoga_asanas: Vec<PoseItem>,
    pub ayurvedic_remedies: Vec<RemedyItem>,
}

pub fn normalize_tag(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn normalize_tags(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|tag| normalize_tag(tag))
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Tier 1 pose matching: a pose matches when its normalized relief-tag
/// set intersects the requested set. Catalog order, first-occurrence
/// dedup on name, capped.
pub fn match_poses(tags: &[String], catalog: &[PoseItem]) -> Vec<PoseItem> {
    let requested: HashSet<&str> = tags.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    let mut matches = Vec::new();

    for pose in catalog {
        if matches.len() >= MAX_POSES {
            break;
        }
        let hit = pose
            .relieves_symptoms
            .iter()
            .any(|tag| requested.contains(normalize_tag(tag).as_str()));
        if hit && seen.insert(normalize_tag(&pose.name)) {
            matches.push(pose.clone());
        }
    }
    matches
}

/// Tier 1 remedy matching: category-set intersection or exact badge
/// equality.
pub fn match_remedies(tags: &[String], catalog: &[RemedyItem]) -> Vec<RemedyItem> {
    let requested: HashSet<&str> = tags.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    let mut matches = Vec::new();

    for remedy in catalog {
        if matches.len() >= MAX_REMEDIES {
            break;
        }
        let category_hit = remedy
            .category
            .iter()
            .any(|tag| requested.contains(normalize_tag(tag).as_str()));
        let badge_hit = {
            let badge = normalize_tag(&remedy.badge);
            !badge.is_empty() && requested.contains(badge.as_str())
        };
        if (category_hit || badge_hit) && seen.insert(normalize_tag(&remedy.name)) {
            matches.push(remedy.clone());
        }
    }
    matches
}

fn fallback_from<T: Clone>(
    tags: &[String],
    table: &HashMap<String, Vec<T>>,
    name_of: fn(&T) -> &str,
    cap: usize,
) -> Vec<T> {
    let mut seen = HashSet::new();
    let mut picked = Vec::new();

    for tag in tags {
        if let Some(entries) = table.get(tag) {
            for entry in entries {
                if picked.len() >= cap {
                    return picked;
                }
                if seen.insert(normalize_tag(name_of(entry))) {
                    picked.push(entry.clone());
                }
            }
        }
    }

    if picked.is_empty() {
        if let Some(entries) = table.get(FALLBACK_DEFAULT_TAG) {
            picked.extend(entries.iter().take(cap).cloned());
        }
    }
    picked
}

pub fn fallback_poses(tags: &[String], fb: &FallbackCatalog) -> Vec<PoseItem> {
    fallback_from(tags, &fb.poses, |p| p.name.as_str(), MAX_POSES)
}

pub fn fallback_remedies(tags: &[String], fb: &FallbackCatalog) -> Vec<RemedyItem> {
    fallback_from(tags, &fb.remedies, |r| r.name.as_str(), MAX_REMEDIES)
}

/// Two-tier matching over the loaded catalogs. Each list falls back to
/// the bundled table independently when its Tier-1 result is empty, so
/// the outcome is never entirely empty.
pub fn recommend(raw_tags: &[String], store: &TaxonomyStore, fb: &FallbackCatalog) -> MatchOutcome {
    let tags = normalize_tags(raw_tags);

    let tier1_poses = match_poses(&tags, &store.poses);
    let (poses, pose_source) = if tier1_poses.is_empty() {
        (fallback_poses(&tags, fb), MatchSource::Fallback)
    } else {
        (tier1_poses, MatchSource::Catalog)
    };

    let tier1_remedies = match_remedies(&tags, &store.remedies);
    let (remedies, remedy_source) = if tier1_remedies.is_empty() {
        (fallback_remedies(&tags, fb), MatchSource::Fallback)
    } else {
        (tier1_remedies, MatchSource::Catalog)
    };

    MatchOutcome {
        poses,
        pose_source,
        remedies,
        remedy_source,
    }
}

/// Fold a resolved generative reply into a match outcome. Anything
/// other than a usable structured payload degrades to the bundled
/// fallback; the caller still reports success.
pub fn resolve_generative(
    reply: GenAiReply,
    raw_tags: &[String],
    fb: &FallbackCatalog,
) -> MatchOutcome {
    let tags = normalize_tags(raw_tags);

    if let GenAiReply::Structured(payload) = reply {
        if !payload.yoga_asanas.is_empty() || !payload.ayurvedic_remedies.is_empty() {
            let mut seen = HashSet::new();
            let poses: Vec<PoseItem> = payload
                .yoga_asanas
                .into_iter()
                .filter(|p| seen.insert(normalize_tag(&p.name)))
                .take(MAX_POSES)
                .collect();
            let mut seen = HashSet::new();
            let remedies: Vec<RemedyItem> = payload
                .ayurvedic_remedies
                .into_iter()
                .filter(|r| seen.insert(normalize_tag(&r.name)))
                .take(MAX_REMEDIES)
                .collect();
            return MatchOutcome {
                poses,
                pose_source: MatchSource::Generative,
                remedies,
                remedy_source: MatchSource::Generative,
            };
        }
    }

    MatchOutcome {
        poses: fallback_poses(&tags, fb),
        pose_source: MatchSource::Fallback,
        remedies: fallback_remedies(&tags, fb),
        remedy_source: MatchSource::Fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy;

    fn pose(name: &str, relieves: &[&str]) -> PoseItem {
        PoseItem {
            name: name.to_string(),
            relieves_symptoms: relieves.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn remedy(name: &str, categories: &[&str], badge: &str) -> RemedyItem {
        RemedyItem {
            name: name.to_string(),
            category: categories.iter().map(|s| s.to_string()).collect(),
            badge: badge.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn matching_is_insensitive_to_case_and_whitespace() {
        let catalog = vec![pose("Child's Pose", &["Cramps", "stress"])];
        let messy = match_poses(&normalize_tags(&["Cramps ".to_string()]), &catalog);
        let clean = match_poses(&normalize_tags(&["cramps".to_string()]), &catalog);
        assert_eq!(messy.len(), 1);
        assert_eq!(messy[0].name, clean[0].name);
    }

    #[test]
    fn matches_keep_catalog_order_and_drop_duplicate_names() {
        let catalog = vec![
            pose("Cat-Cow", &["back pain"]),
            pose("Child's Pose", &["cramps"]),
            pose("cat-cow", &["cramps"]),
        ];
        let tags = normalize_tags(&["cramps".into(), "back pain".into()]);
        let matches = match_poses(&tags, &catalog);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].name, "Cat-Cow");
        assert_eq!(matches[1].name, "Child's Pose");
    }

    #[test]
    fn remedy_matches_on_badge_equality() {
        let catalog = vec![
            remedy("Ginger Tea", &[], "cramps"),
            remedy("Mint Water", &["bloating"], ""),
        ];
        let matches = match_remedies(&normalize_tags(&["cramps".into()]), &catalog);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "Ginger Tea");
    }

    #[test]
    fn absent_tag_lists_match_nothing_without_panicking() {
        let catalog = vec![pose("Untagged", &[])];
        assert!(match_poses(&normalize_tags(&["cramps".into()]), &catalog).is_empty());
        let remedies = vec![remedy("Untagged", &[], "")];
        assert!(match_remedies(&normalize_tags(&["cramps".into()]), &remedies).is_empty());
    }

    #[test]
    fn empty_catalog_falls_back_to_bundled_table() {
        let store = TaxonomyStore::default();
        let outcome = recommend(&["cramps".to_string()], &store, taxonomy::fallback());
        assert_eq!(outcome.pose_source, MatchSource::Fallback);
        assert_eq!(outcome.remedy_source, MatchSource::Fallback);
        assert!(!outcome.poses.is_empty() && outcome.poses.len() <= MAX_POSES);
        assert!(!outcome.remedies.is_empty() && outcome.remedies.len() <= MAX_REMEDIES);
    }

    #[test]
    fn unknown_symptom_gets_the_default_fallback_entries() {
        let fb = taxonomy::fallback();
        let poses = fallback_poses(&normalize_tags(&["itchy elbow".into()]), fb);
        assert!(!poses.is_empty());
        let expected: Vec<&str> = fb.poses[FALLBACK_DEFAULT_TAG]
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert!(expected.contains(&poses[0].name.as_str()));
    }

    #[test]
    fn tier_one_wins_when_the_catalog_has_a_match() {
        let store = TaxonomyStore {
            poses: vec![pose("Catalog Pose", &["cramps"])],
            remedies: vec![remedy("Catalog Remedy", &["cramps"], "")],
        };
        let outcome = recommend(&["cramps".to_string()], &store, taxonomy::fallback());
        assert_eq!(outcome.pose_source, MatchSource::Catalog);
        assert_eq!(outcome.remedy_source, MatchSource::Catalog);
        assert_eq!(outcome.poses[0].name, "Catalog Pose");
    }

    #[test]
    fn structured_reply_is_used_and_capped() {
        let payload = RecommendationPayload {
            yoga_asanas: (0..10).map(|i| pose(&format!("Pose {i}"), &[])).collect(),
            ayurvedic_remedies: (0..10)
                .map(|i| remedy(&format!("Remedy {i}"), &[], ""))
                .collect(),
        };
        let outcome = resolve_generative(
            GenAiReply::Structured(payload),
            &["cramps".to_string()],
            taxonomy::fallback(),
        );
        assert_eq!(outcome.pose_source, MatchSource::Generative);
        assert_eq!(outcome.poses.len(), MAX_POSES);
        assert_eq!(outcome.remedies.len(), MAX_REMEDIES);
    }

    #[test]
    fn malformed_and_free_text_replies_degrade_to_fallback() {
        for reply in [GenAiReply::Malformed, GenAiReply::FreeText("namaste".into())] {
            let outcome =
                resolve_generative(reply, &["cramps".to_string()], taxonomy::fallback());
            assert_eq!(outcome.pose_source, MatchSource::Fallback);
            assert!(!outcome.poses.is_empty());
        }
    }

    #[test]
    fn empty_structured_reply_counts_as_no_result() {
        let outcome = resolve_generative(
            GenAiReply::Structured(RecommendationPayload::default()),
            &["cramps".to_string()],
            taxonomy::fallback(),
        );
        assert_eq!(outcome.pose_source, MatchSource::Fallback);
    }
}
