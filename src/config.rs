//! Application configuration loaded from environment variables.
//!
//! Third-party API keys are optional at startup. A missing key surfaces as a
//! "misconfigured" upstream error when the corresponding service is called.

use std::env;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Which record store backs history and search data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

impl StoreBackend {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid("STORE_BACKEND", raw.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Firebase/GCP project ID (Firestore + ID token audience)
    pub firebase_project_id: String,
    /// Record store implementation
    pub store_backend: StoreBackend,

    // --- Secrets ---
    /// HS256 secret for locally issued tokens; switches off Firebase JWKS verification
    pub auth_shared_secret: Option<Vec<u8>>,
    pub openweather_api_key: Option<String>,
    pub google_maps_api_key: Option<String>,
    pub youtube_api_key: Option<String>,

    /// OpenWeatherMap base URL (overridable for tests)
    pub openweather_base_url: String,
}

impl Config {
    /// Config for tests: in-memory store, shared-secret auth, no upstream keys.
    pub fn test_default() -> Self {
        Self {
            port: DEFAULT_PORT,
            frontend_url: "http://localhost:3000".to_string(),
            firebase_project_id: "test-project".to_string(),
            store_backend: StoreBackend::Memory,
            auth_shared_secret: Some(b"test_jwt_key_32_bytes_minimum!!".to_vec()),
            openweather_api_key: Some("test_openweather_key".to_string()),
            google_maps_api_key: None,
            youtube_api_key: None,
            openweather_base_url: DEFAULT_OPENWEATHER_BASE_URL.to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store_backend = env::var("STORE_BACKEND")
            .map(|raw| StoreBackend::parse(&raw))
            .unwrap_or(Ok(StoreBackend::Firestore))?;

        let auth_shared_secret = optional_secret("AUTH_SHARED_SECRET").map(String::into_bytes);

        // The project id is only optional when nothing talks to Firebase.
        let firebase_project_id = match env::var("FIREBASE_PROJECT_ID") {
            Ok(id) => id.trim().to_string(),
            Err(_)
                if store_backend == StoreBackend::Memory && auth_shared_secret.is_some() =>
            {
                "local-dev".to_string()
            }
            Err(_) => return Err(ConfigError::Missing("FIREBASE_PROJECT_ID")),
        };

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .unwrap_or(DEFAULT_PORT),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            firebase_project_id,
            store_backend,
            auth_shared_secret,
            openweather_api_key: optional_secret("OPENWEATHER_API_KEY"),
            google_maps_api_key: optional_secret("GOOGLE_MAPS_API_KEY"),
            youtube_api_key: optional_secret("YOUTUBE_API_KEY"),
            openweather_base_url: env::var("OPENWEATHER_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_OPENWEATHER_BASE_URL.to_string()),
        })
    }
}

/// Read a secret, treating empty values as absent.
fn optional_secret(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
