use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;

use super::{check_status, PlaylistSource};
use crate::config::SpotifyConfig;
use crate::errors::AppError;
use crate::models::PlaylistSummary;

/// Refresh this long before the provider-reported expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Fields requested from the playlist endpoint.
const PLAYLIST_FIELDS: &str =
    "id,name,description,images(url),external_urls(spotify),owner(display_name),tracks(total)";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct SpotifyPlaylist {
    id: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    images: Vec<SpotifyImage>,
    #[serde(default)]
    external_urls: ExternalUrls,
    #[serde(default)]
    owner: Option<SpotifyOwner>,
    #[serde(default)]
    tracks: Option<TrackTotal>,
}

#[derive(Debug, Deserialize)]
struct SpotifyImage {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalUrls {
    #[serde(default)]
    spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpotifyOwner {
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrackTotal {
    total: u32,
}

impl From<SpotifyPlaylist> for PlaylistSummary {
    fn from(p: SpotifyPlaylist) -> Self {
        let spotify_url = p
            .external_urls
            .spotify
            .unwrap_or_else(|| format!("https://open.spotify.com/playlist/{}", p.id));
        Self {
            embed_url: format!("https://open.spotify.com/embed/playlist/{}", p.id),
            image_url: p.images.into_iter().next().map(|i| i.url),
            description: p.description.unwrap_or_default(),
            owner: p
                .owner
                .and_then(|o| o.display_name)
                .unwrap_or_else(|| "Spotify".to_string()),
            track_count: p.tracks.map(|t| t.total).unwrap_or(0),
            id: p.id,
            name: p.name,
            spotify_url,
        }
    }
}

/// When a token issued at `issued_at` expires. An unrepresentable lifetime
/// counts as already expired, so the token is used once and then refetched.
fn expiry(issued_at: Instant, expires_in: u64) -> Instant {
    issued_at
        .checked_add(Duration::from_secs(expires_in))
        .unwrap_or(issued_at)
}

/// A client-credentials access token and when it stops being usable.
#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self, now: Instant) -> bool {
        now + EXPIRY_MARGIN < self.expires_at
    }
}

/// Spotify Web API client with an in-memory token cache.
pub struct SpotifyClient {
    client: Client,
    client_id: String,
    client_secret: String,
    accounts_url: String,
    api_url: String,
    token: RwLock<Option<AccessToken>>,
}

impl SpotifyClient {
    pub fn new(config: &SpotifyConfig) -> Self {
        Self {
            client: Client::new(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            accounts_url: config.accounts_url.trim_end_matches('/').to_string(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        }
    }

    /// Return the cached token, fetching a new one only when it has expired.
    async fn access_token(&self) -> Result<String, AppError> {
        if let Some(token) = self.token.read().await.as_ref() {
            if token.is_fresh(Instant::now()) {
                return Ok(token.value.clone());
            }
        }

        let token = self.request_token().await?;
        let value = token.value.clone();
        *self.token.write().await = Some(token);
        Ok(value)
    }

    async fn request_token(&self) -> Result<AccessToken, AppError> {
        tracing::debug!("Requesting Spotify access token");
        let requested_at = Instant::now();

        let response = self
            .client
            .post(format!("{}/api/token", self.accounts_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        let token: TokenResponse = check_status("Spotify accounts", response)
            .await?
            .json()
            .await?;

        Ok(AccessToken {
            expires_at: expiry(requested_at, token.expires_in),
            value: token.access_token,
        })
    }

    async fn fetch_playlist(&self, token: &str, id: &str) -> Result<PlaylistSummary, AppError> {
        let response = self
            .client
            .get(format!("{}/v1/playlists/{}", self.api_url, id))
            .bearer_auth(token)
            .query(&[("fields", PLAYLIST_FIELDS)])
            .send()
            .await?;
        let playlist: SpotifyPlaylist = check_status("Spotify API", response)
            .await?
            .json()
            .await?;
        Ok(playlist.into())
    }
}

#[async_trait]
impl PlaylistSource for SpotifyClient {
    async fn playlists(&self, ids: &[String]) -> Result<Vec<PlaylistSummary>, AppError> {
        let token = self.access_token().await?;
        let mut playlists = Vec::with_capacity(ids.len());
        for id in ids {
            playlists.push(self.fetch_playlist(&token, id).await?);
        }
        Ok(playlists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, routing::get, routing::post, Json, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_huge_expires_in_does_not_overflow() {
        let now = Instant::now();
        let expires_at = expiry(now, u64::MAX);
        assert_eq!(expires_at, now);
        let token = AccessToken {
            value: "t".into(),
            expires_at,
        };
        assert!(!token.is_fresh(now));

        assert_eq!(expiry(now, 3600), now + Duration::from_secs(3600));
    }

    #[test]
    fn test_token_freshness_margin() {
        let now = Instant::now();
        let token = AccessToken {
            value: "t".into(),
            expires_at: now + Duration::from_secs(3600),
        };
        assert!(token.is_fresh(now));
        assert!(!token.is_fresh(now + Duration::from_secs(3540)));
        assert!(!token.is_fresh(now + Duration::from_secs(4000)));
    }

    #[test]
    fn test_reshape_fills_display_fields() {
        let raw: SpotifyPlaylist = serde_json::from_value(serde_json::json!({
            "id": "37i9dQZF1DX8NTLI2TtZa6",
            "name": "Deep Focus",
            "description": "Keep calm and focus.",
            "images": [{ "url": "https://i.scdn.co/image/a" }, { "url": "https://i.scdn.co/image/b" }],
            "external_urls": { "spotify": "https://open.spotify.com/playlist/37i9dQZF1DX8NTLI2TtZa6" },
            "owner": { "display_name": "Spotify" },
            "tracks": { "total": 150 }
        }))
        .unwrap();

        let summary = PlaylistSummary::from(raw);
        assert_eq!(summary.name, "Deep Focus");
        assert_eq!(summary.image_url.as_deref(), Some("https://i.scdn.co/image/a"));
        assert_eq!(
            summary.embed_url,
            "https://open.spotify.com/embed/playlist/37i9dQZF1DX8NTLI2TtZa6"
        );
        assert_eq!(summary.track_count, 150);
    }

    async fn mock_spotify(token_calls: Arc<AtomicUsize>, expires_in: u64) -> String {
        let app = Router::new()
            .route(
                "/api/token",
                post(move || {
                    let token_calls = token_calls.clone();
                    async move {
                        let n = token_calls.fetch_add(1, Ordering::SeqCst);
                        Json(serde_json::json!({
                            "access_token": format!("token-{}", n),
                            "token_type": "Bearer",
                            "expires_in": expires_in
                        }))
                    }
                }),
            )
            .route(
                "/v1/playlists/{id}",
                get(|Path(id): Path<String>| async move {
                    Json(serde_json::json!({
                        "id": id,
                        "name": format!("Playlist {}", id),
                        "images": [],
                        "tracks": { "total": 12 }
                    }))
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(base_url: &str) -> SpotifyClient {
        SpotifyClient::new(&SpotifyConfig {
            client_id: "id".into(),
            client_secret: "secret".into(),
            playlist_ids: vec![],
            accounts_url: base_url.to_string(),
            api_url: base_url.to_string(),
        })
    }

    #[tokio::test]
    async fn test_token_reused_while_fresh() {
        let token_calls = Arc::new(AtomicUsize::new(0));
        let base_url = mock_spotify(token_calls.clone(), 3600).await;
        let spotify = client(&base_url);

        let ids = vec!["a".to_string(), "b".to_string()];
        let first = spotify.playlists(&ids).await.unwrap();
        let second = spotify.playlists(&ids[..1]).await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(first[1].name, "Playlist b");
        assert_eq!(first[0].owner, "Spotify");
        assert_eq!(second[0].track_count, 12);
        assert_eq!(token_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_token_refreshed() {
        let token_calls = Arc::new(AtomicUsize::new(0));
        // Shorter than the refresh margin, so every call refreshes
        let base_url = mock_spotify(token_calls.clone(), 30).await;
        let spotify = client(&base_url);

        let ids = vec!["a".to_string()];
        spotify.playlists(&ids).await.unwrap();
        spotify.playlists(&ids).await.unwrap();

        assert_eq!(token_calls.load(Ordering::SeqCst), 2);
    }
}
