use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::time::Duration;

use fastembed::{EmbeddingModel as FastEmbedKind, InitOptions, TextEmbedding};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::matching::config::{Backend, EmbeddingsConfig};
use crate::matching::errors::EmbeddingError;

/// Текст -> вектор, от этого зависит ранжировщик.
///
/// `encode` синхронный и возвращает по вектору на вход, в порядке входа.
pub trait EmbeddingModel: Send + Sync {
    fn model_name(&self) -> &str;
    fn encode(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Локальная модель, которой для кодирования нужен `&mut self`
pub trait LocalEncoder: Send {
    fn embed_batch(&mut self, batch: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

// structs define

/// Модель в процессе. Держит несколько экземпляров, чтобы параллельные
/// запросы не ждали друг друга на одной блокировке.
pub struct FastEmbedModel<E = TextEmbedding> {
    name: String,
    handles: Vec<Mutex<E>>,
    next: AtomicUsize,
}

/// Клиент к модели за HTTP
pub struct RemoteEmbeddingModel {
    client: Client,
    url: String,
    model: String,
    timeout_duration: Duration,
    runtime: Handle,
}

#[derive(Serialize)]
struct EncodeRequest<'a> {
    model: &'a str,
    inputs: &'a [String],
}

#[derive(Deserialize)]
struct EncodeResponse {
    embeddings: Vec<Vec<f32>>,
}

// Impl block

//  FastEmbedModel impl

impl LocalEncoder for TextEmbedding {
    fn embed_batch(&mut self, batch: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.embed(batch, None).map_err(|e| EmbeddingError::Model(e.to_string()))
    }
}

impl FastEmbedModel<TextEmbedding> {
    /// Загружает `instances` экземпляров модели (скачивается при первом запуске).
    pub fn try_new(name: &str, instances: usize) -> Result<FastEmbedModel, EmbeddingError> {
        let kind = resolve_local_model(name)
            .ok_or_else(|| EmbeddingError::Model(format!("unknown model '{}'", name)))?;

        let handles = (0..instances)
            .map(|_| {
                let options = InitOptions::new(kind.clone()).with_show_download_progress(false);
                TextEmbedding::try_new(options).map_err(|e| EmbeddingError::Model(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        info!(model = name, instances, "local embedding model loaded");

        FastEmbedModel::with_handles(name, handles)
    }
}

impl<E: LocalEncoder> FastEmbedModel<E> {
    pub fn with_handles(
        name: &str,
        handles: Vec<E>,
    ) -> Result<FastEmbedModel<E>, EmbeddingError> {
        if handles.is_empty() {
            return Err(EmbeddingError::Model(
                "at least one model instance is required".to_string(),
            ));
        }

        Ok(FastEmbedModel {
            name: name.to_string(),
            handles: handles.into_iter().map(Mutex::new).collect(),
            next: AtomicUsize::new(0),
        })
    }

    pub fn instances(&self) -> usize {
        self.handles.len()
    }

    /// Первый свободный экземпляр, начиная с очередного по кругу; если все
    /// заняты, ждём стартовый.
    fn acquire(&self) -> Result<MutexGuard<'_, E>, EmbeddingError> {
        let poisoned = || EmbeddingError::Model("embedding model lock poisoned".to_string());
        let count = self.handles.len();
        let start = self.next.fetch_add(1, Ordering::Relaxed) % count;

        for offset in 0..count {
            match self.handles[(start + offset) % count].try_lock() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::WouldBlock) => continue,
                Err(TryLockError::Poisoned(_)) => return Err(poisoned()),
            }
        }

        self.handles[start].lock().map_err(|_| poisoned())
    }
}

impl<E: LocalEncoder> EmbeddingModel for FastEmbedModel<E> {
    fn model_name(&self) -> &str {
        &self.name
    }

    #[tracing::instrument(name = "fastembed_encode", skip_all, fields(batch = batch.len()))]
    fn encode(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        self.acquire()?.embed_batch(batch.to_vec())
    }
}

//  RemoteEmbeddingModel impl

impl RemoteEmbeddingModel {
    /// Создаётся внутри рантайма tokio. `encode` блокируется на нём,
    /// поэтому вызывать его нужно из блокирующего потока (`spawn_blocking`).
    pub fn new(
        url: String,
        model: String,
        timeout_duration: Duration,
    ) -> Result<RemoteEmbeddingModel, EmbeddingError> {
        let client = Client::builder()
            .timeout(timeout_duration)
            .build()
            .map_err(|e| EmbeddingError::Transport(e.to_string()))?;
        let runtime =
            Handle::try_current().map_err(|e| EmbeddingError::Model(e.to_string()))?;

        Ok(RemoteEmbeddingModel { client, url, model, timeout_duration, runtime })
    }

    async fn request(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let response = self
            .client
            .post(&self.url)
            .json(&EncodeRequest { model: &self.model, inputs: batch })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout(self.timeout_duration)
                } else {
                    EmbeddingError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmbeddingError::Status(status.as_u16()));
        }

        let body: EncodeResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::MalformedResponse(e.to_string()))?;

        Ok(body.embeddings)
    }
}

impl EmbeddingModel for RemoteEmbeddingModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    #[tracing::instrument(
        name = "remote_encode",
        skip_all,
        fields(batch = batch.len(), url = %self.url)
    )]
    fn encode(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        debug!("requesting embeddings");
        self.runtime
            .block_on(timeout(self.timeout_duration, self.request(batch)))
            .map_err(|_| EmbeddingError::Timeout(self.timeout_duration))?
    }
}

// utils func

/// Имя модели из конфигурации -> модель fastembed.
pub fn resolve_local_model(name: &str) -> Option<FastEmbedKind> {
    match name {
        "all-MiniLM-L6-v2" => Some(FastEmbedKind::AllMiniLML6V2),
        "all-MiniLM-L12-v2" => Some(FastEmbedKind::AllMiniLML12V2),
        "bge-small-en-v1.5" => Some(FastEmbedKind::BGESmallENV15),
        _ => None,
    }
}

pub fn create_embedding_model(
    config: &EmbeddingsConfig,
) -> Result<Arc<dyn EmbeddingModel>, EmbeddingError> {
    match config.backend {
        Backend::Local => {
            let model = FastEmbedModel::<TextEmbedding>::try_new(&config.model, config.instances)?;
            Ok(Arc::new(model))
        }
        Backend::Remote => {
            let url = config.url.clone().ok_or_else(|| {
                EmbeddingError::Transport("no embedding service url configured".to_string())
            })?;
            Ok(Arc::new(RemoteEmbeddingModel::new(
                url,
                config.model.clone(),
                Duration::from_secs(config.timeout_secs),
            )?))
        }
    }
}
