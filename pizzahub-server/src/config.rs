//! Service configuration

use std::fmt;
use std::path::PathBuf;

use pizzahub_core::TransitionPolicy;

/// Secret used when JWT_SECRET is unset. Only suitable for development.
pub const FALLBACK_JWT_SECRET: &str = "secret";

#[derive(Clone)]
pub struct Config {
    /// Port to listen on
    pub port: u16,

    /// HS256 signing secret for session tokens
    pub jwt_secret: String,

    /// SQLite database file. In-memory stores when unset.
    pub database_path: Option<String>,

    /// Base for uploaded image URLs. Taken from the Host header when unset.
    pub public_base_url: Option<String>,

    /// Directory uploaded images are written to and served from
    pub uploads_dir: PathBuf,

    /// Which status changes admins may make
    pub status_policy: TransitionPolicy,

    /// Seed demo accounts and a sample menu on startup
    pub seed_demo_data: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 4000,
            jwt_secret: FALLBACK_JWT_SECRET.to_string(),
            database_path: None,
            public_base_url: None,
            uploads_dir: PathBuf::from("uploads"),
            status_policy: TransitionPolicy::default(),
            seed_demo_data: false,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("jwt_secret", &"<redacted>")
            .field("database_path", &self.database_path)
            .field("public_base_url", &self.public_base_url)
            .field("uploads_dir", &self.uploads_dir)
            .field("status_policy", &self.status_policy)
            .field("seed_demo_data", &self.seed_demo_data)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());
        let defaults = Self::default();

        let port = match get("PORT").map(|s| s.parse::<u16>()) {
            Some(Ok(port)) => port,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Ignoring invalid PORT");
                defaults.port
            }
            None => defaults.port,
        };

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET is not set, using the insecure development secret");
            defaults.jwt_secret.clone()
        });

        let policy_setting = get("ORDER_STATUS_POLICY").map(|s| s.parse::<TransitionPolicy>());
        let status_policy = match policy_setting {
            Some(Ok(policy)) => policy,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Ignoring invalid ORDER_STATUS_POLICY");
                defaults.status_policy
            }
            None => defaults.status_policy,
        };

        let seed_demo_data = get("SEED_DEMO_DATA")
            .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            port,
            jwt_secret,
            database_path: get("DATABASE_PATH"),
            public_base_url: get("PUBLIC_BASE_URL").map(|s| s.trim_end_matches('/').to_string()),
            uploads_dir: get("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.uploads_dir),
            status_policy,
            seed_demo_data,
        }
    }
}
