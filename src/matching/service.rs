use tracing::info;

use crate::matching::errors::MatchError;
use crate::matching::objects::{Candidate, Pool, ScoredCandidate};
use crate::matching::ranker::SimilarityRanker;
use crate::matching::store::{EntityFilter, EntityStore};

/// Находит цель и её пул в хранилище и ранжирует пул.
///
/// Сама цель в свой пул не попадает.
#[tracing::instrument(skip(store, ranker))]
pub fn recommend(
    store: &dyn EntityStore,
    ranker: &SimilarityRanker,
    target_id: &str,
    pool: Pool,
) -> Result<Vec<ScoredCandidate>, MatchError> {
    let target = store.fetch_entity(target_id)?;

    let filter = EntityFilter::user_type(pool.user_type()).excluding(&target.id);
    let candidates: Vec<Candidate> =
        store.list_entities(&filter)?.into_iter().map(Candidate::new).collect();

    let ranked = ranker.rank(&target.skill_text(), &candidates)?;
    info!(target = %target.id, results = ranked.len(), "recommendations computed");

    Ok(ranked)
}
