//! Popularity ranking
//!
//! The universal fallback: listings ordered by aggregate interaction and
//! favorite counts. Serves cold-start users and any engine that cannot
//! produce enough candidates. A pure function of the current counts.

use crate::store::{ListingFilter, ListingStore};
use anyhow::Result;
use auto_gateway_core::Listing;
use tracing::debug;
use uuid::Uuid;

/// Favorites weigh double in the popularity score
const FAVORITE_COUNT_WEIGHT: u64 = 2;

pub struct PopularityRanker<'a, S> {
    store: &'a S,
}

impl<'a, S: ListingStore> PopularityRanker<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Most popular listings, excluding the requesting user's own
    pub async fn top_listings(&self, user: Option<Uuid>, limit: usize) -> Result<Vec<Listing>> {
        let counts = self
            .store
            .count_interactions_and_favorites_per_listing()
            .await?;

        let mut listings = self
            .store
            .get_listings(ListingFilter {
                exclude_owner: user,
                ..ListingFilter::default()
            })
            .await?;

        debug!(candidates = listings.len(), "ranking listings by popularity");

        // Order by score descending, ties broken by recency descending;
        // the store already returns newest-first, so a stable sort keeps
        // the recency tie-break.
        listings.sort_by_key(|listing| {
            let (interactions, favorites) = counts.get(&listing.id).copied().unwrap_or((0, 0));
            std::cmp::Reverse(interactions + FAVORITE_COUNT_WEIGHT * favorites)
        });

        listings.truncate(limit);
        Ok(listings)
    }

    /// Ids of the most popular listings
    pub async fn top_ids(&self, user: Option<Uuid>, limit: usize) -> Result<Vec<Uuid>> {
        let listings = self.top_listings(user, limit).await?;
        Ok(listings.into_iter().map(|l| l.id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use auto_gateway_core::InteractionType;
    use chrono::{Duration, Utc};

    fn listing(brand: &str, owner: Uuid, age_days: i64) -> Listing {
        Listing {
            id: Uuid::new_v4(),
            owner_user_id: owner,
            title: format!("{} test", brand),
            brand: brand.to_string(),
            model: "X".to_string(),
            fuel_type: "petrol".to_string(),
            transmission: "manual".to_string(),
            body_type: None,
            color: None,
            condition_state: "used".to_string(),
            price: 10000,
            year_of_manufacture: 2018,
            mileage: 80000,
            power: 100,
            created_at: Utc::now() - Duration::days(age_days),
        }
    }

    #[tokio::test]
    async fn test_favorites_weigh_double() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let viewed = listing("Audi", owner, 5);
        let favorited = listing("BMW", owner, 5);
        store.insert_listing(viewed.clone());
        store.insert_listing(favorited.clone());

        let now = Utc::now();
        let viewer = Uuid::new_v4();
        // One favorite (score 2) beats one view (score 1)
        store
            .upsert_interaction(viewer, viewed.id, InteractionType::View, 1.0, now)
            .await
            .unwrap();
        store.insert_favorite(viewer, favorited.id, now);

        let ranker = PopularityRanker::new(&store);
        let ids = ranker.top_ids(None, 10).await.unwrap();
        assert_eq!(ids, vec![favorited.id, viewed.id]);
    }

    #[tokio::test]
    async fn test_excludes_own_listings_and_is_idempotent() {
        let store = MemoryStore::new();
        let me = Uuid::new_v4();
        let mine = listing("Audi", me, 1);
        let other = listing("BMW", Uuid::new_v4(), 2);
        store.insert_listing(mine.clone());
        store.insert_listing(other.clone());

        let ranker = PopularityRanker::new(&store);
        let first = ranker.top_ids(Some(me), 10).await.unwrap();
        assert!(!first.contains(&mine.id));

        // Pure function of unchanged data
        let second = ranker.top_ids(Some(me), 10).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_recency_breaks_ties() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let old = listing("Audi", owner, 30);
        let fresh = listing("BMW", owner, 1);
        store.insert_listing(old.clone());
        store.insert_listing(fresh.clone());

        let ranker = PopularityRanker::new(&store);
        let ids = ranker.top_ids(None, 10).await.unwrap();
        assert_eq!(ids, vec![fresh.id, old.id]);
    }
}
