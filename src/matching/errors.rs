use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Ошибки модели эмбеддингов. Повторов здесь нет.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding model error: {0}")]
    Model(String),
    #[error("embedding service request failed: {0}")]
    Transport(String),
    #[error("embedding service returned status {0}")]
    Status(u16),
    #[error("embedding service timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed embedding response: {0}")]
    MalformedResponse(String),
    #[error("embedding model returned {got} vectors for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },
    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

#[derive(Debug, Error)]
pub enum RankError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    EmbeddingService(#[from] EmbeddingError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user '{0}' not found")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to read user documents from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse user documents: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown local embedding model '{0}'")]
    UnknownModel(String),
    #[error("remote embedding backend requires `embeddings.url`")]
    MissingRemoteUrl,
    #[error("`server.cors_origins` must list explicit origins, `*` is not allowed")]
    WildcardOrigin,
    #[error("`embeddings.instances` must be at least 1")]
    NoModelInstances,
}

/// Всё, чем может закончиться запрос рекомендаций
#[derive(Debug, Error)]
pub enum MatchError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Rank(#[from] RankError),
    #[error("ranking task failed: {0}")]
    Task(String),
}
