//! Hybrid recommendations
//!
//! Runs the collaborative and content-based engines independently and
//! interleaves their outputs: one unseen id from each list in turn until
//! the limit is met. The merge order is the final order; scores are not
//! recombined. Any failure anywhere in the pipeline degrades to the
//! popularity ranker, never to an error.

use crate::collaborative::CollaborativeFiltering;
use crate::content_based::ContentBasedFiltering;
use crate::popularity::PopularityRanker;
use crate::store::ListingStore;
use crate::RecoConfig;
use anyhow::Result;
use tracing::{info, warn};
use uuid::Uuid;

/// Hybrid recommendation engine
pub struct HybridRecommender<'a, S> {
    store: &'a S,
    config: &'a RecoConfig,
}

impl<'a, S: ListingStore> HybridRecommender<'a, S> {
    pub fn new(store: &'a S, config: &'a RecoConfig) -> Self {
        Self { store, config }
    }

    /// Ranked listing ids for the user in merge order
    pub async fn recommend(&self, user_id: Uuid, limit: usize) -> Result<Vec<Uuid>> {
        let popularity = PopularityRanker::new(self.store);

        match self.recommend_inner(user_id, limit).await {
            Ok(ids) if !ids.is_empty() => Ok(ids),
            Ok(_) => {
                info!(%user_id, "hybrid merge produced no ids, serving popular listings");
                popularity.top_ids(Some(user_id), limit).await
            }
            Err(error) => {
                warn!(%user_id, %error, "hybrid pipeline failed, serving popular listings");
                popularity.top_ids(Some(user_id), limit).await
            }
        }
    }

    async fn recommend_inner(&self, user_id: Uuid, limit: usize) -> Result<Vec<Uuid>> {
        let collaborative = CollaborativeFiltering::new(self.store, self.config)
            .recommend(user_id, limit)
            .await?;
        let content = ContentBasedFiltering::new(self.store, self.config)
            .recommend(user_id, limit)
            .await?;

        Ok(interleave(&collaborative, &content, limit))
    }
}

/// Strict alternation of unseen ids, collaborative first.
///
/// Each pass consumes one position from each list whether or not it was
/// admitted, so duplicates are skipped without stalling the other list.
pub fn interleave(collaborative: &[Uuid], content: &[Uuid], limit: usize) -> Vec<Uuid> {
    let mut combined: Vec<Uuid> = Vec::new();
    let mut i = 0;
    let mut j = 0;

    while combined.len() < limit && (i < collaborative.len() || j < content.len()) {
        if i < collaborative.len() && !combined.contains(&collaborative[i]) {
            combined.push(collaborative[i]);
        }
        i += 1;

        if combined.len() >= limit {
            break;
        }

        if j < content.len() && !combined.contains(&content[j]) {
            combined.push(content[j]);
        }
        j += 1;
    }

    combined
}
