//! Configuration module for the Study Simple backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.
//! Provider credentials are optional; a missing credential disables that adapter.

use std::env;
use std::net::{AddrParseError, SocketAddr};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Store connection string
    pub database_url: String,
    /// Upper bound on pooled store connections
    pub db_max_connections: u32,
    /// Key guarding moderation routes (open when unset)
    pub admin_key: Option<String>,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Public site URL, used for links in outgoing email
    pub site_url: String,
    /// Body size cap for routes that accept image uploads
    pub max_upload_bytes: usize,
    pub cloudinary: Option<CloudinaryConfig>,
    pub email: Option<EmailConfig>,
    pub spotify: Option<SpotifyConfig>,
}

/// Default upload cap: 50 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Image host credentials.
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
    pub base_url: String,
}

/// Transactional email provider settings.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub api_key: String,
    pub from: String,
    pub base_url: String,
}

/// Spotify client-credentials settings.
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Playlists served when a request names none
    pub playlist_ids: Vec<String>,
    pub accounts_url: String,
    pub api_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AddrParseError> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:./data/study-simple.sqlite".to_string());

        let db_max_connections = env::var("STUDY_DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        let admin_key = non_empty_var("STUDY_ADMIN_KEY");

        let bind_addr = env::var("STUDY_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()?;

        let log_level = env::var("STUDY_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let site_url = env::var("STUDY_SITE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let max_upload_bytes = env::var("STUDY_MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        let cloudinary = match (
            non_empty_var("CLOUDINARY_CLOUD_NAME"),
            non_empty_var("CLOUDINARY_API_KEY"),
            non_empty_var("CLOUDINARY_API_SECRET"),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret,
                folder: env::var("CLOUDINARY_FOLDER")
                    .unwrap_or_else(|_| "study-simple".to_string()),
                base_url: "https://api.cloudinary.com".to_string(),
            }),
            _ => None,
        };

        let email = match (non_empty_var("RESEND_API_KEY"), non_empty_var("EMAIL_FROM")) {
            (Some(api_key), Some(from)) => Some(EmailConfig {
                api_key,
                from,
                base_url: "https://api.resend.com".to_string(),
            }),
            _ => None,
        };

        let spotify = match (
            non_empty_var("SPOTIFY_CLIENT_ID"),
            non_empty_var("SPOTIFY_CLIENT_SECRET"),
        ) {
            (Some(client_id), Some(client_secret)) => Some(SpotifyConfig {
                client_id,
                client_secret,
                playlist_ids: parse_id_list(&env::var("SPOTIFY_PLAYLIST_IDS").unwrap_or_default()),
                accounts_url: "https://accounts.spotify.com".to_string(),
                api_url: "https://api.spotify.com".to_string(),
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            db_max_connections,
            admin_key,
            bind_addr,
            log_level,
            site_url,
            max_upload_bytes,
            cloudinary,
            email,
            spotify,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Split a comma-separated id list, dropping blanks.
pub fn parse_id_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
