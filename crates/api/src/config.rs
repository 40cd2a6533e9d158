//! Server settings.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `QYNNOVEL_`-prefixed environment variables using `__` between sections
//! (`QYNNOVEL_SERVER__PORT=9000`, `QYNNOVEL_DATABASE__URL=postgres://...`).

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Environment variable naming the settings file.
pub const CONFIG_PATH_VAR: &str = "QYNNOVEL_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "qynnovel.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub database: DatabaseSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Origin allowed to call the API from a browser.
    pub cors_origin: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Root directory of chapter content.
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// PostgreSQL connection string. Without one, metadata is kept in memory.
    #[serde(default)]
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Settings {
    /// Load from the file named by `QYNNOVEL_CONFIG`, or `qynnovel.toml`.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    /// Load from `path`. A missing file is not an error.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.cors_origin", "http://localhost:3000")?
            .set_default("storage.path", "./storage")?
            .set_default("database.max_connections", 10)?
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("QYNNOVEL")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.toml");

        let settings = Settings::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.storage.path, "./storage");
        assert_eq!(settings.server.cors_origin, "http://localhost:3000");
        assert_eq!(settings.database.max_connections, 10);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("qynnovel.toml");
        std::fs::write(
            &path,
            r#"
[server]
host = "0.0.0.0"
port = 9090

[storage]
path = "/var/lib/qynnovel"

[database]
url = "postgres://qyn@localhost/qynnovel"
"#,
        )
        .unwrap();

        let settings = Settings::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(settings.bind_address(), "0.0.0.0:9090");
        assert_eq!(settings.storage.path, "/var/lib/qynnovel");
        assert_eq!(
            settings.database.url.as_deref(),
            Some("postgres://qyn@localhost/qynnovel")
        );
        assert_eq!(settings.database.max_connections, 10);
    }
}
