//! Public recommendation surface
//!
//! The facade the marketplace web layer calls into: algorithm dispatch,
//! interaction recording, and profile introspection. Explicit algorithm
//! requests surface their failures; the "for you" feed degrades to
//! popularity instead.

use crate::collaborative::CollaborativeFiltering;
use crate::content_based::{gather_user_history, ContentBasedFiltering};
use crate::hybrid::HybridRecommender;
use crate::popularity::PopularityRanker;
use crate::profile::PreferenceProfile;
use crate::store::{InteractionFilter, ListingStore};
use crate::RecoConfig;
use auto_gateway_core::{AutoGatewayError, InteractionEvent, InteractionType, Result};
use chrono::{DateTime, Utc};
use std::str::FromStr;
use tracing::{info, warn};
use uuid::Uuid;

/// Selectable recommendation algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Collaborative,
    Content,
    Hybrid,
}

impl FromStr for Algorithm {
    type Err = AutoGatewayError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "collaborative" => Ok(Algorithm::Collaborative),
            "content" => Ok(Algorithm::Content),
            "hybrid" => Ok(Algorithm::Hybrid),
            other => Err(AutoGatewayError::invalid_input(format!(
                "unknown algorithm '{}': use 'collaborative', 'content' or 'hybrid'",
                other
            ))),
        }
    }
}

/// Recommendation service facade over a listing store
pub struct Recommender<S> {
    store: S,
    config: RecoConfig,
}

impl<S: ListingStore> Recommender<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, RecoConfig::default())
    }

    pub fn with_config(store: S, config: RecoConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &RecoConfig {
        &self.config
    }

    /// Run one explicitly requested algorithm.
    ///
    /// Unlike [`for_you`](Self::for_you), failures surface to the caller as
    /// an internal error rather than degrading to popularity.
    pub async fn recommend(
        &self,
        user_id: Uuid,
        algorithm: Algorithm,
        limit: usize,
    ) -> Result<Vec<Uuid>> {
        info!(%user_id, ?algorithm, limit, "generating recommendations");
        let mut ids = self
            .dispatch(user_id, algorithm, limit)
            .await
            .map_err(|e| AutoGatewayError::internal(e.to_string()))?;
        ids.truncate(limit);
        Ok(ids)
    }

    /// Run an algorithm selected by name ("collaborative", "content",
    /// "hybrid"); unknown names are an invalid-input error
    pub async fn recommend_named(
        &self,
        user_id: Uuid,
        algorithm: &str,
        limit: usize,
    ) -> Result<Vec<Uuid>> {
        let algorithm = algorithm.parse::<Algorithm>()?;
        self.recommend(user_id, algorithm, limit).await
    }

    /// The personalized "for you" feed.
    ///
    /// Users with no interactions and no favorites get the popularity
    /// ranking directly; everyone else gets the requested algorithm
    /// (hybrid by default). Never surfaces a pipeline failure: anything
    /// unexpected degrades to popularity output.
    pub async fn for_you(
        &self,
        user_id: Uuid,
        algorithm: Option<Algorithm>,
        limit: usize,
    ) -> Result<Vec<Uuid>> {
        match self.for_you_inner(user_id, algorithm, limit).await {
            Ok(ids) => Ok(ids),
            Err(error) => {
                warn!(%user_id, %error, "for-you pipeline failed, serving popular listings");
                PopularityRanker::new(&self.store)
                    .top_ids(Some(user_id), limit)
                    .await
                    .map_err(|e| AutoGatewayError::internal(e.to_string()))
            }
        }
    }

    async fn for_you_inner(
        &self,
        user_id: Uuid,
        algorithm: Option<Algorithm>,
        limit: usize,
    ) -> anyhow::Result<Vec<Uuid>> {
        let has_interactions = !self
            .store
            .get_interactions(InteractionFilter::for_user(user_id))
            .await?
            .is_empty();
        let has_favorites = !self.store.get_favorites(Some(user_id)).await?.is_empty();

        if !has_interactions && !has_favorites {
            info!(%user_id, "cold-start user, serving popular listings");
            return PopularityRanker::new(&self.store)
                .top_ids(Some(user_id), limit)
                .await;
        }

        let mut ids = self
            .dispatch(user_id, algorithm.unwrap_or(Algorithm::Hybrid), limit)
            .await?;
        ids.truncate(limit);
        Ok(ids)
    }

    /// Engines run at their internal limit so re-ranking has a full pool to
    /// work with; callers trim afterwards.
    async fn dispatch(
        &self,
        user_id: Uuid,
        algorithm: Algorithm,
        limit: usize,
    ) -> anyhow::Result<Vec<Uuid>> {
        let engine_limit = self.config.engine_limit.max(limit);
        match algorithm {
            Algorithm::Collaborative => {
                CollaborativeFiltering::new(&self.store, &self.config)
                    .recommend(user_id, engine_limit)
                    .await
            }
            Algorithm::Content => {
                ContentBasedFiltering::new(&self.store, &self.config)
                    .recommend(user_id, engine_limit)
                    .await
            }
            Algorithm::Hybrid => {
                HybridRecommender::new(&self.store, &self.config)
                    .recommend(user_id, engine_limit)
                    .await
            }
        }
    }

    /// Record a tracking event against a listing.
    ///
    /// View and click events upsert a view row; contact and favorite events
    /// upsert their own rows; unfavorite deletes the favorite row,
    /// idempotently. The referenced listing must exist.
    pub async fn record_interaction(
        &self,
        user_id: Uuid,
        listing_id: Uuid,
        event: InteractionEvent,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let listing = self
            .store
            .get_listing(listing_id)
            .await
            .map_err(|e| AutoGatewayError::internal(e.to_string()))?;
        if listing.is_none() {
            return Err(AutoGatewayError::not_found("listing", listing_id));
        }

        let result = match event {
            InteractionEvent::View | InteractionEvent::Click => self
                .store
                .upsert_interaction(user_id, listing_id, InteractionType::View, 1.0, now)
                .await
                .map(|_| ()),
            InteractionEvent::Contact => self
                .store
                .upsert_interaction(user_id, listing_id, InteractionType::Contact, 1.0, now)
                .await
                .map(|_| ()),
            InteractionEvent::Favorite => self
                .store
                .upsert_interaction(user_id, listing_id, InteractionType::Favorite, 1.0, now)
                .await
                .map(|_| ()),
            InteractionEvent::Unfavorite => self
                .store
                .delete_interaction(user_id, listing_id, InteractionType::Favorite)
                .await,
        };

        result.map_err(|e| AutoGatewayError::internal(e.to_string()))
    }

    /// Build the user's preference profile for diagnostics
    pub async fn build_preference_profile(&self, user_id: Uuid) -> Result<PreferenceProfile> {
        let history = gather_user_history(&self.store, user_id)
            .await
            .map_err(|e| AutoGatewayError::internal(e.to_string()))?;
        Ok(PreferenceProfile::build(
            &history.learning,
            &history.favorite_ids,
            &history.contacted_ids,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!(
            "collaborative".parse::<Algorithm>().unwrap(),
            Algorithm::Collaborative
        );
        assert_eq!("content".parse::<Algorithm>().unwrap(), Algorithm::Content);
        assert_eq!("hybrid".parse::<Algorithm>().unwrap(), Algorithm::Hybrid);

        let err = "als".parse::<Algorithm>().unwrap_err();
        assert!(matches!(err, AutoGatewayError::InvalidInput { .. }));
    }
}
