use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
    /// Externally visible origin, used for absolute pagination links
    pub public_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    pub path: String,
}

impl Database {
    pub fn is_in_memory(&self) -> bool {
        self.path.trim().eq_ignore_ascii_case(":memory:")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Media {
    /// Directory served read-only under `/media`
    pub root: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Auth {
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    pub media: Media,
    pub auth: Auth,
    pub seed_demo_data: bool,
}

/// Environment variable -> settings key
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("HOST", "server.host"),
    ("PORT", "server.port"),
    ("PUBLIC_URL", "server.public_url"),
    ("DATABASE_PATH", "database.path"),
    ("MEDIA_ROOT", "media.root"),
    ("MEDIA_URL", "media.base_url"),
    ("SEED_DEMO_DATA", "seed_demo_data"),
];

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // settings.toml is optional; look next to the binary's working dir
        // and in the server crate for development runs
        let config_file_name = "settings.toml";
        for path in [
            PathBuf::from(config_file_name),
            PathBuf::from("instaclone-server").join(config_file_name),
        ] {
            if path.exists() {
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        builder = builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("server.public_url", "http://localhost:8000")?
            .set_default("database.path", "instaclone.db")?
            .set_default("media.root", "media")?
            .set_default("media.base_url", "http://localhost:8000/media")?
            .set_default("auth.access_ttl_minutes", 60)?
            .set_default("auth.refresh_ttl_days", 7)?
            .set_default("seed_demo_data", false)?;

        // Environment variables win over the file
        for (var, key) in ENV_OVERRIDES {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_override(*key, value)?;
            }
        }

        let s = builder.build()?;
        s.try_deserialize()
    }

    pub fn access_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.auth.access_ttl_minutes)
    }

    pub fn refresh_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.auth.refresh_ttl_days)
    }
}
