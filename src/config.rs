//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development.

use crate::models::Identity;
use std::env;
use std::path::PathBuf;

const DEFAULT_SESSION_FILE: &str = ".club-hub/session.json";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP project ID hosting the Firestore database
    pub gcp_project_id: String,
    /// Use the in-memory store instead of Firestore
    pub offline: bool,
    /// Where the identity provider keeps a durable session
    pub session_file: PathBuf,
    /// Optional override for the bundled fallback clubs
    pub fallback_clubs_path: Option<PathBuf>,
    /// Identity returned by the local provider's interactive sign-in
    pub dev_identity: Option<Identity>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let offline = match env::var("CLUB_HUB_OFFLINE") {
            Ok(v) => parse_bool("CLUB_HUB_OFFLINE", &v)?,
            Err(_) => false,
        };

        Ok(Self {
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            offline,
            session_file: env::var("SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_SESSION_FILE)),
            fallback_clubs_path: env::var("FALLBACK_CLUBS_PATH").ok().map(PathBuf::from),
            dev_identity: dev_identity_from_env(),
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            offline: true,
            session_file: env::temp_dir().join("club-hub-test-session.json"),
            fallback_clubs_path: None,
            dev_identity: Some(Identity {
                uid: "dev-user".to_string(),
                email: Some("dev@example.com".to_string()),
                display_name: Some("Dev User".to_string()),
                photo_url: None,
            }),
        }
    }
}

/// Build the development identity; `DEV_USER_ID` is the only required field.
fn dev_identity_from_env() -> Option<Identity> {
    let uid = env::var("DEV_USER_ID").ok()?.trim().to_string();
    if uid.is_empty() {
        return None;
    }
    Some(Identity {
        uid,
        email: env::var("DEV_USER_EMAIL").ok(),
        display_name: env::var("DEV_USER_NAME").ok(),
        photo_url: env::var("DEV_USER_PHOTO_URL").ok(),
    })
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::Invalid {
            name,
            value: other.to_string(),
        }),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}
