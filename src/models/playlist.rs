//! Spotify playlist display model.

use serde::{Deserialize, Serialize};

/// A playlist reshaped for the study-music page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub spotify_url: String,
    pub embed_url: String,
    pub owner: String,
    pub track_count: u32,
}

/// Query parameters for the playlist endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct PlaylistQuery {
    /// Comma-separated Spotify playlist ids
    pub ids: Option<String>,
}
