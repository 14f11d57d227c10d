use serde::Serialize;
use serde_json::Value;
use tokio::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Extra playlist details fetched from the music catalog API. The
/// static mood table is authoritative for the selection itself; this
/// only decorates the response and any failure degrades to `None`.
#[derive(Debug, Clone, Serialize)]
pub struct PlaylistMetadata {
    pub name: String,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub track_count: Option<i64>,
    pub owner: Option<String>,
    pub sample_tracks: Vec<String>,
}

const SAMPLE_TRACK_LIMIT: usize = 5;

#[derive(Clone)]
pub struct MusicService {
    client: reqwest::Client,
    api_base: String,
    api_token: Option<String>,
}

impl MusicService {
    pub fn from_env() -> Self {
        let api_base = std::env::var("SPOTIFY_API_BASE")
            .unwrap_or_else(|_| "https://api.spotify.com/v1".to_string());
        let api_token = std::env::var("SPOTIFY_API_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());
        Self {
            client: reqwest::Client::new(),
            api_base,
            api_token,
        }
    }

    pub async fn playlist_metadata(&self, external_id: &str) -> Option<PlaylistMetadata> {
        let token = self.api_token.as_ref()?;
        let url = format!("{}/playlists/{}", self.api_base, external_id);

        let response = match self
            .client
            .get(&url)
            .bearer_auth(token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(err) => {
                tracing::warn!("playlist metadata request failed: {err}");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!(
                "playlist metadata request for {external_id} returned {}",
                response.status()
            );
            return None;
        }

        let value: Value = match response.json().await {
            Ok(v) => v,
            Err(err) => {
                tracing::warn!("playlist metadata body unreadable: {err}");
                return None;
            }
        };

        extract_metadata(&value)
    }
}

fn extract_metadata(value: &Value) -> Option<PlaylistMetadata> {
    let name = value.get("name")?.as_str()?.to_string();
    Some(PlaylistMetadata {
        name,
        url: value
            .pointer("/external_urls/spotify")
            .and_then(Value::as_str)
            .map(str::to_string),
        image_url: value
            .pointer("/images/0/url")
            .and_then(Value::as_str)
            .map(str::to_string),
        track_count: value.pointer("/tracks/total").and_then(Value::as_i64),
        owner: value
            .pointer("/owner/display_name")
            .and_then(Value::as_str)
            .map(str::to_string),
        sample_tracks: value
            .pointer("/tracks/items")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.pointer("/track/name").and_then(Value::as_str))
                    .take(SAMPLE_TRACK_LIMIT)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
    })
}
