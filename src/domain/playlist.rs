use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const PLAYLIST_TABLE_VERSION: &str = "2024.1";
pub const INTENSITY_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Happy,
    Sad,
    Angry,
    Energetic,
    Content,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Angry => "angry",
            Mood::Energetic => "energetic",
            Mood::Content => "content",
        }
    }
}

impl TryFrom<&str> for Mood {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "happy" => Ok(Mood::Happy),
            "sad" => Ok(Mood::Sad),
            "angry" => Ok(Mood::Angry),
            "energetic" => Ok(Mood::Energetic),
            "content" => Ok(Mood::Content),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub external_id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

const fn entry(
    external_id: &'static str,
    name: &'static str,
    description: &'static str,
) -> PlaylistEntry {
    PlaylistEntry {
        external_id,
        name,
        description,
    }
}

static PLAYLISTS: Lazy<HashMap<(Mood, u8), PlaylistEntry>> = Lazy::new(|| {
    let rows: [(Mood, [PlaylistEntry; 5]); 5] = [
        (
            Mood::Happy,
            [
                entry("37i9dQZF1DXdPec7aLTmlC", "Happy Hits", "Light and cheerful tunes"),
                entry("37i9dQZF1DX3rxVfibe1L0", "Mood Booster", "Songs to lift your spirits"),
                entry("37i9dQZF1DX0XUsuxWHRQd", "RapCaviar", "High-energy hip-hop"),
                entry("37i9dQZF1DX4dyzvuaRJ0n", "mint", "Fresh dance and electronic"),
                entry("37i9dQZF1DX4SBhb3fqCJd", "Are & Be", "The best in R&B right now"),
            ],
        ),
        (
            Mood::Sad,
            [
                entry("37i9dQZF1DX7qK8ma5wgG1", "Sad Songs", "Gentle melancholic melodies"),
                entry("37i9dQZF1DWVV27DiNWxkR", "Sad Indie", "Indie songs for rainy days"),
                entry("37i9dQZF1DX3YSRoSdA634", "Life Sucks", "Emo and alternative for tough times"),
                entry("37i9dQZF1DX3YSRoSdA634", "Life Sucks", "Emo and alternative for tough times"),
                entry("37i9dQZF1DX3YSRoSdA634", "Life Sucks", "Emo and alternative for tough times"),
            ],
        ),
        (
            Mood::Angry,
            [
                entry("37i9dQZF1DX0vHZ8elq0UK", "Rock This", "Classic rock anthems"),
                entry("37i9dQZF1DX1s9knjP51Oa", "Calm Vibes", "Soothing instrumental music"),
                entry("37i9dQZF1DX4sWSpwq3LiO", "Rock Classics", "Legendary rock tracks"),
                entry("37i9dQZF1DX5wgkQjaJeZO", "Thrash Metal", "High-intensity metal"),
                entry("37i9dQZF1DX5wgkQjaJeZO", "Thrash Metal", "High-intensity metal"),
            ],
        ),
        (
            Mood::Energetic,
            [
                entry("37i9dQZF1DX9tPFwDMOaN1", "Energy Booster", "Upbeat tracks to get you moving"),
                entry("37i9dQZF1DX76Wlfdnj7AP", "Beast Mode", "High-energy workout music"),
                entry("37i9dQZF1DX0XUsuxWHRQd", "RapCaviar", "The hottest hip-hop tracks"),
                entry("37i9dQZF1DX8f6LHxMjnzD", "Punk Rock", "Fast and furious punk anthems"),
                entry("37i9dQZF1DX8f6LHxMjnzD", "Punk Rock", "Fast and furious punk anthems"),
            ],
        ),
        (
            Mood::Content,
            [
                entry("37i9dQZF1DX4WYpdgoIcn6", "Chill Hits", "Relaxed vibes for easy listening"),
                entry("37i9dQZF1DX4WYpdgoIcn6", "Chill Hits", "Relaxed vibes for easy listening"),
                entry("37i9dQZF1DWU0ScTcjJBdj", "Relax & Unwind", "Soothing sounds to calm your mind"),
                entry("37i9dQZF1DWU0ScTcjJBdj", "Relax & Unwind", "Soothing sounds to calm your mind"),
                entry("37i9dQZF1DWU0ScTcjJBdj", "Relax & Unwind", "Soothing sounds to calm your mind"),
            ],
        ),
    ];

    let mut table = HashMap::new();
    for (mood, entries) in rows {
        for (idx, entry) in entries.into_iter().enumerate() {
            table.insert((mood, idx as u8 + 1), entry);
        }
    }
    table
});

/// Static lookup; `None` for unknown mood/intensity combinations, which
/// the web layer surfaces as not-found.
pub fn select(mood: Mood, intensity: u8) -> Option<&'static PlaylistEntry> {
    if !INTENSITY_RANGE.contains(&intensity) {
        return None;
    }
    PLAYLISTS.get(&(mood, intensity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_mood_covers_all_five_intensities() {
        for mood in [Mood::Happy, Mood::Sad, Mood::Angry, Mood::Energetic, Mood::Content] {
            for intensity in 1..=5 {
                assert!(select(mood, intensity).is_some(), "{mood:?}/{intensity}");
            }
        }
    }

    #[test]
    fn out_of_range_intensity_is_not_found() {
        assert!(select(Mood::Happy, 0).is_none());
        assert!(select(Mood::Happy, 6).is_none());
    }

    #[test]
    fn mood_parse_is_case_insensitive() {
        assert_eq!(Mood::try_from(" Happy "), Ok(Mood::Happy));
        assert!(Mood::try_from("melancholic").is_err());
    }

    #[test]
    fn known_lookup_returns_expected_entry() {
        let entry = select(Mood::Happy, 2).unwrap();
        assert_eq!(entry.name, "Mood Booster");
        assert_eq!(entry.external_id, "37i9dQZF1DX3rxVfibe1L0");
    }
}
