use std::cmp::Ordering;
use std::sync::Arc;

use tracing::debug;

use crate::matching::embeddings::EmbeddingModel;
use crate::matching::errors::{EmbeddingError, RankError};
use crate::matching::objects::{Candidate, ScoredCandidate};
use crate::matching::similarity::cosine_similarity;

/// Ранжирует кандидатов по косинусному сходству эмбеддингов навыков с целью.
///
/// Состояния нет, каждый вызов заново кодирует тексты через переданную модель.
pub struct SimilarityRanker {
    model: Arc<dyn EmbeddingModel>,
}

impl SimilarityRanker {
    pub fn new(model: Arc<dyn EmbeddingModel>) -> SimilarityRanker {
        SimilarityRanker { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Оценивает каждого кандидата относительно `target_skill_text` и сортирует
    /// по убыванию. Равные оценки сохраняют входной порядок.
    ///
    /// Пустой пул даёт пустой результат, модель при этом не вызывается.
    #[tracing::instrument(name = "rank", skip_all, fields(candidates = candidates.len()))]
    pub fn rank(
        &self,
        target_skill_text: &str,
        candidates: &[Candidate],
    ) -> Result<Vec<ScoredCandidate>, RankError> {
        if candidates.is_empty() {
            debug!("empty candidate pool");
            return Ok(Vec::new());
        }

        if let Some(position) = candidates.iter().position(|c| c.entity.id.trim().is_empty()) {
            return Err(RankError::InvalidInput(format!(
                "candidate at position {} has no identifier",
                position
            )));
        }

        let target_embedding = self
            .encode(&[target_skill_text.to_string()])?
            .pop()
            .unwrap_or_default();

        let texts: Vec<String> = candidates.iter().map(|c| c.skill_text.clone()).collect();
        let candidate_embeddings = self.encode(&texts)?;

        let expected = target_embedding.len();
        if let Some(embedding) = candidate_embeddings.iter().find(|e| e.len() != expected) {
            return Err(
                EmbeddingError::DimensionMismatch { expected, got: embedding.len() }.into()
            );
        }

        let mut scored: Vec<ScoredCandidate> = candidates
            .iter()
            .zip(&candidate_embeddings)
            .map(|(candidate, embedding)| {
                candidate.score(cosine_similarity(&target_embedding, embedding))
            })
            .collect();

        // sort_by стабильна, оценки конечны
        scored.sort_by(|a, b| {
            b.similarity_score.partial_cmp(&a.similarity_score).unwrap_or(Ordering::Equal)
        });

        debug!(top = ?scored.first().map(|s| s.similarity_score), "candidates ranked");
        Ok(scored)
    }

    /// Один вызов модели: по вектору на вход, без NaN и бесконечностей.
    fn encode(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let embeddings = self.model.encode(batch)?;

        if embeddings.len() != batch.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: batch.len(),
                got: embeddings.len(),
            });
        }
        if embeddings.iter().flatten().any(|value| !value.is_finite()) {
            return Err(EmbeddingError::MalformedResponse(
                "embedding contains non-finite values".to_string(),
            ));
        }

        Ok(embeddings)
    }
}
