//! Spotify playlist endpoint.

use axum::extract::State;

use super::{success, ApiResult, QueryParams};
use crate::config::parse_id_list;
use crate::errors::AppError;
use crate::models::{PlaylistQuery, PlaylistSummary};
use crate::AppState;

/// GET /api/spotify/playlists - Playlist summaries for `?ids=` or the configured set.
pub async fn list_playlists(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<PlaylistQuery>,
) -> ApiResult<Vec<PlaylistSummary>> {
    let source = state
        .playlists
        .as_ref()
        .ok_or_else(|| AppError::Internal("Spotify is not configured".to_string()))?;

    let ids = match query.ids.as_deref().map(parse_id_list) {
        Some(ids) if !ids.is_empty() => ids,
        _ => state
            .config
            .spotify
            .as_ref()
            .map(|s| s.playlist_ids.clone())
            .unwrap_or_default(),
    };
    if ids.is_empty() {
        return success(Vec::new());
    }

    let playlists = source.playlists(&ids).await?;
    success(playlists)
}
