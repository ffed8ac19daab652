use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::providers::gemini::DEFAULT_MODEL;

pub const APP_ID: &str = "com.nexora.Nexora";
pub const APP_NAME: &str = "Nexora";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_STATIC_DIR: &str = "public";
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: Option<String>,
    pub static_dir: PathBuf,
    pub persona_file: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(port) => port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT: {}", port))?,
            None => DEFAULT_PORT,
        };

        let api_key = var("GEMINI_API_KEY");
        if api_key.is_none() {
            tracing::warn!("GEMINI_API_KEY is not set; generation requests will fail");
        }

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            api_key,
            model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: var("GEMINI_BASE_URL"),
            static_dir: var("NEXORA_STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
            persona_file: var("NEXORA_PERSONA_FILE").map(PathBuf::from),
        })
    }

    /// Host and port to listen on. The host may be a name such as
    /// `localhost`; resolution happens at bind time.
    pub fn bind_target(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub data_dir: Option<PathBuf>,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            api_url: var("NEXORA_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            data_dir: var("NEXORA_DATA_DIR").map(PathBuf::from),
        }
    }

    /// Database location: `NEXORA_DATA_DIR` when set, else the XDG default.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.join("nexora.db")),
            None => crate::services::Database::default_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_server_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(config.static_dir, PathBuf::from("public"));
        assert_eq!(config.api_key, None);
        assert_eq!(config.bind_target(), ("0.0.0.0", 3000));
    }

    #[test]
    fn test_server_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_MODEL", "gemini-2.0-flash"),
            ("NEXORA_PERSONA_FILE", "persona.txt"),
        ]))
        .unwrap();
        assert_eq!(config.bind_target(), ("127.0.0.1", 8080));
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.persona_file, Some(PathBuf::from("persona.txt")));
    }

    #[tokio::test]
    async fn test_host_name_binds() {
        let config =
            ServerConfig::from_lookup(lookup(&[("HOST", "localhost"), ("PORT", "0")])).unwrap();
        let listener = tokio::net::TcpListener::bind(config.bind_target())
            .await
            .unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        assert!(ServerConfig::from_lookup(lookup(&[("PORT", "http")])).is_err());
    }

    #[test]
    fn test_client_config() {
        let config = ClientConfig::from_lookup(lookup(&[]));
        assert_eq!(config.api_url, "http://localhost:3000");

        let config = ClientConfig::from_lookup(lookup(&[("NEXORA_DATA_DIR", "/tmp/nexora")]));
        assert_eq!(
            config.database_path().unwrap(),
            PathBuf::from("/tmp/nexora/nexora.db")
        );
    }
}
