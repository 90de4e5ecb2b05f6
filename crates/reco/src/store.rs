//! Storage access for the recommendation engine
//!
//! The engine is storage-agnostic: everything it needs from the marketplace
//! is behind [`ListingStore`]. [`PostgresStore`](crate::postgres::PostgresStore)
//! implements it against the marketplace schema; [`MemoryStore`] backs tests
//! and embedded use.
//!
//! Favorite rows are written by the marketplace's favorite toggle, not by
//! this engine; the store only reads them.

use crate::scoring;
use anyhow::Result;
use async_trait::async_trait;
use auto_gateway_core::{Favorite, Interaction, InteractionType, Listing};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use uuid::Uuid;

/// Filter for interaction queries; unset fields match everything
#[derive(Debug, Clone, Copy, Default)]
pub struct InteractionFilter {
    pub user_id: Option<Uuid>,
    pub listing_id: Option<Uuid>,
    pub interaction_type: Option<InteractionType>,
}

impl InteractionFilter {
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    fn matches(&self, interaction: &Interaction) -> bool {
        self.user_id.map_or(true, |u| interaction.user_id == u)
            && self.listing_id.map_or(true, |l| interaction.listing_id == l)
            && self
                .interaction_type
                .map_or(true, |t| interaction.interaction_type == t)
    }
}

/// Filter for listing queries
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    /// Restrict to these ids (unordered; callers re-order themselves)
    pub ids: Option<Vec<Uuid>>,
    /// Drop these ids from the result
    pub exclude_ids: Vec<Uuid>,
    /// Drop listings owned by this user
    pub exclude_owner: Option<Uuid>,
}

impl ListingFilter {
    pub fn by_ids(ids: Vec<Uuid>) -> Self {
        Self {
            ids: Some(ids),
            ..Self::default()
        }
    }

    fn matches(&self, listing: &Listing) -> bool {
        self.ids.as_ref().map_or(true, |ids| ids.contains(&listing.id))
            && !self.exclude_ids.contains(&listing.id)
            && self.exclude_owner.map_or(true, |u| listing.owner_user_id != u)
    }
}

/// Per-listing `(interaction_count, favorite_count)` row counts
pub type ListingCounts = HashMap<Uuid, (u64, u64)>;

/// Marketplace data access contract
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// All interaction rows matching the filter
    async fn get_interactions(&self, filter: InteractionFilter) -> Result<Vec<Interaction>>;

    /// Create or update the (user, listing, type) row: add `count_delta`,
    /// refresh the last-interaction timestamp, recompute the derived score.
    async fn upsert_interaction(
        &self,
        user_id: Uuid,
        listing_id: Uuid,
        interaction_type: InteractionType,
        count_delta: f64,
        now: DateTime<Utc>,
    ) -> Result<Interaction>;

    /// Delete the (user, listing, type) row; succeeds when absent
    async fn delete_interaction(
        &self,
        user_id: Uuid,
        listing_id: Uuid,
        interaction_type: InteractionType,
    ) -> Result<()>;

    /// Favorite rows, optionally restricted to one user
    async fn get_favorites(&self, user_id: Option<Uuid>) -> Result<Vec<Favorite>>;

    /// A single listing by id
    async fn get_listing(&self, id: Uuid) -> Result<Option<Listing>>;

    /// Listings matching the filter, newest first
    async fn get_listings(&self, filter: ListingFilter) -> Result<Vec<Listing>>;

    /// Interaction and favorite row counts per listing
    async fn count_interactions_and_favorites_per_listing(&self) -> Result<ListingCounts>;
}

/// In-memory [`ListingStore`] for tests and embedded use
#[derive(Default)]
pub struct MemoryStore {
    listings: DashMap<Uuid, Listing>,
    interactions: DashMap<(Uuid, Uuid, InteractionType), Interaction>,
    favorites: DashMap<(Uuid, Uuid), Favorite>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_listing(&self, listing: Listing) {
        self.listings.insert(listing.id, listing);
    }

    /// Write a Favorite row, as the marketplace's favorite toggle would
    pub fn insert_favorite(&self, user_id: Uuid, listing_id: Uuid, created_at: DateTime<Utc>) {
        self.favorites.insert(
            (user_id, listing_id),
            Favorite {
                user_id,
                listing_id,
                created_at,
            },
        );
    }

    pub fn remove_favorite(&self, user_id: Uuid, listing_id: Uuid) {
        self.favorites.remove(&(user_id, listing_id));
    }

    pub fn interaction_count(&self) -> usize {
        self.interactions.len()
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn get_interactions(&self, filter: InteractionFilter) -> Result<Vec<Interaction>> {
        let mut rows: Vec<Interaction> = self
            .interactions
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by_key(|i| (i.user_id, i.listing_id, i.interaction_type.as_str()));
        Ok(rows)
    }

    async fn upsert_interaction(
        &self,
        user_id: Uuid,
        listing_id: Uuid,
        interaction_type: InteractionType,
        count_delta: f64,
        now: DateTime<Utc>,
    ) -> Result<Interaction> {
        let mut entry = self
            .interactions
            .entry((user_id, listing_id, interaction_type))
            .or_insert_with(|| Interaction {
                user_id,
                listing_id,
                interaction_type,
                interaction_count: 0.0,
                first_interaction: now,
                last_interaction: now,
                interaction_score: 0.0,
            });

        let row = entry.value_mut();
        row.interaction_count += count_delta;
        row.last_interaction = now;
        let elapsed = scoring::elapsed_days(row.first_interaction, now);
        row.interaction_score =
            scoring::interaction_score(interaction_type, row.interaction_count, Some(elapsed));

        Ok(row.clone())
    }

    async fn delete_interaction(
        &self,
        user_id: Uuid,
        listing_id: Uuid,
        interaction_type: InteractionType,
    ) -> Result<()> {
        self.interactions
            .remove(&(user_id, listing_id, interaction_type));
        Ok(())
    }

    async fn get_favorites(&self, user_id: Option<Uuid>) -> Result<Vec<Favorite>> {
        let mut rows: Vec<Favorite> = self
            .favorites
            .iter()
            .filter(|entry| user_id.map_or(true, |u| entry.value().user_id == u))
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by_key(|f| (f.user_id, f.listing_id));
        Ok(rows)
    }

    async fn get_listing(&self, id: Uuid) -> Result<Option<Listing>> {
        Ok(self.listings.get(&id).map(|entry| entry.value().clone()))
    }

    async fn get_listings(&self, filter: ListingFilter) -> Result<Vec<Listing>> {
        let mut rows: Vec<Listing> = self
            .listings
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        // Marketplace default ordering: newest first
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn count_interactions_and_favorites_per_listing(&self) -> Result<ListingCounts> {
        let mut counts: ListingCounts = HashMap::new();
        for entry in self.listings.iter() {
            counts.insert(*entry.key(), (0, 0));
        }
        for entry in self.interactions.iter() {
            counts.entry(entry.value().listing_id).or_insert((0, 0)).0 += 1;
        }
        for entry in self.favorites.iter() {
            counts.entry(entry.value().listing_id).or_insert((0, 0)).1 += 1;
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(brand: &str) -> Listing {
        Listing {
            id: Uuid::new_v4(),
            owner_user_id: Uuid::new_v4(),
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
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_view_upsert_creates_then_increments() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let listing_id = Uuid::new_v4();
        let now = Utc::now();

        let first = store
            .upsert_interaction(user, listing_id, InteractionType::View, 1.0, now)
            .await
            .unwrap();
        assert_eq!(first.interaction_count, 1.0);

        let later = now + chrono::Duration::minutes(5);
        let second = store
            .upsert_interaction(user, listing_id, InteractionType::View, 1.0, later)
            .await
            .unwrap();
        assert_eq!(second.interaction_count, 2.0);
        assert_eq!(second.first_interaction, now);
        assert_eq!(second.last_interaction, later);

        // Still exactly one row for the pair
        assert_eq!(store.interaction_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_interaction_is_idempotent() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let listing_id = Uuid::new_v4();

        store
            .delete_interaction(user, listing_id, InteractionType::Favorite)
            .await
            .unwrap();

        store
            .upsert_interaction(user, listing_id, InteractionType::Favorite, 1.0, Utc::now())
            .await
            .unwrap();
        store
            .delete_interaction(user, listing_id, InteractionType::Favorite)
            .await
            .unwrap();
        assert_eq!(store.interaction_count(), 0);
    }

    #[tokio::test]
    async fn test_listing_filter_exclusions() {
        let store = MemoryStore::new();
        let mine = listing("Audi");
        let owner = mine.owner_user_id;
        let other = listing("BMW");
        store.insert_listing(mine.clone());
        store.insert_listing(other.clone());

        let visible = store
            .get_listings(ListingFilter {
                exclude_owner: Some(owner),
                ..ListingFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, other.id);

        let none = store
            .get_listings(ListingFilter {
                exclude_ids: vec![mine.id, other.id],
                ..ListingFilter::default()
            })
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_counts_per_listing() {
        let store = MemoryStore::new();
        let l = listing("Dacia");
        store.insert_listing(l.clone());
        let user = Uuid::new_v4();
        let now = Utc::now();

        store
            .upsert_interaction(user, l.id, InteractionType::View, 1.0, now)
            .await
            .unwrap();
        store
            .upsert_interaction(user, l.id, InteractionType::Contact, 1.0, now)
            .await
            .unwrap();
        store.insert_favorite(user, l.id, now);

        let counts = store
            .count_interactions_and_favorites_per_listing()
            .await
            .unwrap();
        assert_eq!(counts[&l.id], (2, 1));
    }
}
