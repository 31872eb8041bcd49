use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::matching::embeddings::resolve_local_model;
use crate::matching::errors::ConfigError;

pub const CONFIG_ENV: &str = "MENTOR_MATCH_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.json";

// structs define

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub embeddings: EmbeddingsConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Источники, которым разрешены запросы с cookies из браузера
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Local,
    Remote,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingsConfig {
    pub backend: Backend,
    pub model: String,
    pub url: Option<String>,
    pub timeout_secs: u64,
    /// Сколько экземпляров локальной модели держать в памяти
    pub instances: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

// Impl block

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
        }
    }
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        EmbeddingsConfig {
            backend: Backend::Local,
            model: "all-MiniLM-L6-v2".to_string(),
            url: None,
            timeout_secs: 30,
            instances: 1,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig { path: PathBuf::from("users.json") }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl AppConfig {
    /// Первый аргумент командной строки, затем `MENTOR_MATCH_CONFIG`,
    /// затем `config.json`.
    pub fn config_path() -> PathBuf {
        std::env::args()
            .nth(1)
            .or_else(|| std::env::var(CONFIG_ENV).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
            .into()
    }

    /// Читает и проверяет файл конфигурации. Нет файла - значения по умолчанию.
    pub fn load(path: &Path) -> Result<AppConfig, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(?path, "config file not found, using defaults");
                return Ok(AppConfig::default());
            }
            Err(source) => return Err(ConfigError::Io { path: path.to_path_buf(), source }),
        };

        AppConfig::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<AppConfig, ConfigError> {
        let config: AppConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // с credentials браузер не примет `*`
        if self.server.cors_origins.iter().any(|origin| origin.trim() == "*") {
            return Err(ConfigError::WildcardOrigin);
        }
        if self.embeddings.instances == 0 {
            return Err(ConfigError::NoModelInstances);
        }

        match self.embeddings.backend {
            Backend::Local if resolve_local_model(&self.embeddings.model).is_none() => {
                Err(ConfigError::UnknownModel(self.embeddings.model.clone()))
            }
            Backend::Remote if self.embeddings.url.is_none() => {
                Err(ConfigError::MissingRemoteUrl)
            }
            _ => Ok(()),
        }
    }
}
