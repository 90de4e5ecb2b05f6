//! Collaborative filtering
//!
//! User-based nearest-neighbor filtering over a dense user-listing score
//! matrix rebuilt from the interaction snapshot on every request. Neighbor
//! scores are aggregated into candidate listings, which then pass brand
//! diversity and fuel-preference re-ranking, padded from the content engine
//! when the pool runs short.
//!
//! Delegation chain: too little system-wide data or an unseen user falls
//! through to content-based filtering; any internal failure falls back to
//! the popularity ranker instead of surfacing.

use crate::content_based::ContentBasedFiltering;
use crate::diversity::{cap_brands_with_limit, prioritize_fuel};
use crate::popularity::PopularityRanker;
use crate::store::{InteractionFilter, ListingFilter, ListingStore};
use crate::{scoring, RecoConfig};
use anyhow::{Context, Result};
use auto_gateway_core::Listing;
use chrono::Utc;
use ndarray::Array2;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Collaborative filtering engine
pub struct CollaborativeFiltering<'a, S> {
    store: &'a S,
    config: &'a RecoConfig,
}

impl<'a, S: ListingStore> CollaborativeFiltering<'a, S> {
    pub fn new(store: &'a S, config: &'a RecoConfig) -> Self {
        Self { store, config }
    }

    /// Ranked listing ids for the user, best match first
    pub async fn recommend(&self, user_id: Uuid, limit: usize) -> Result<Vec<Uuid>> {
        match self.recommend_inner(user_id, limit).await {
            Ok(ids) => Ok(ids),
            Err(error) => {
                warn!(%user_id, %error, "collaborative filtering failed, serving popular listings");
                PopularityRanker::new(self.store)
                    .top_ids(Some(user_id), limit)
                    .await
            }
        }
    }

    async fn recommend_inner(&self, user_id: Uuid, limit: usize) -> Result<Vec<Uuid>> {
        let content = ContentBasedFiltering::new(self.store, self.config);

        let interactions = self
            .store
            .get_interactions(InteractionFilter::default())
            .await?;
        if interactions.len() < self.config.min_interactions_for_collaborative {
            info!(
                total = interactions.len(),
                "not enough interactions for collaborative filtering, using content-based"
            );
            return content.recommend(user_id, limit).await;
        }

        let now = Utc::now();

        // Sum time-decayed scores per (user, listing); BTree keys give the
        // matrix a deterministic row/column order.
        let mut user_scores: BTreeMap<Uuid, HashMap<Uuid, f64>> = BTreeMap::new();
        let mut listing_ids: BTreeSet<Uuid> = BTreeSet::new();
        for interaction in &interactions {
            let elapsed = scoring::elapsed_days(interaction.first_interaction, now);
            let score = scoring::interaction_score(
                interaction.interaction_type,
                interaction.interaction_count,
                Some(elapsed),
            );
            *user_scores
                .entry(interaction.user_id)
                .or_default()
                .entry(interaction.listing_id)
                .or_insert(0.0) += score;
            listing_ids.insert(interaction.listing_id);
        }

        if !user_scores.contains_key(&user_id) {
            info!(%user_id, "user has no interactions in the matrix, using content-based");
            return content.recommend(user_id, limit).await;
        }

        let users: Vec<Uuid> = user_scores.keys().copied().collect();
        let columns: HashMap<Uuid, usize> = listing_ids
            .iter()
            .enumerate()
            .map(|(index, id)| (*id, index))
            .collect();

        let mut matrix = Array2::<f64>::zeros((users.len(), columns.len()));
        for (row, user) in users.iter().enumerate() {
            for (listing, score) in &user_scores[user] {
                matrix[[row, columns[listing]]] = *score;
            }
        }

        // L2-normalize rows so highly active users do not dominate
        for mut row in matrix.rows_mut() {
            let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                row.mapv_inplace(|v| v / norm);
            }
        }

        debug!(
            users = users.len(),
            listings = columns.len(),
            "built user-listing score matrix"
        );

        let user_row = users
            .iter()
            .position(|u| *u == user_id)
            .context("requesting user missing from score matrix")?;
        let k = (users.len() / 10)
            .clamp(self.config.min_neighbors, self.config.max_neighbors)
            .min(users.len());

        // Brute-force cosine nearest neighbors; self is excluded after the
        // cut, as the neighbor budget includes it.
        let target = matrix.row(user_row);
        let mut by_distance: Vec<(usize, f64)> = (0..users.len())
            .map(|row| (row, 1.0 - matrix.row(row).dot(&target)))
            .collect();
        by_distance.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let neighbors: Vec<(usize, f64)> = by_distance
            .into_iter()
            .take(k)
            .filter(|(row, _)| *row != user_row)
            .collect();

        if neighbors.is_empty() {
            info!(%user_id, "no similar users found, using content-based");
            return content.recommend(user_id, limit).await;
        }

        // Aggregate neighbor scores for listings the user has not touched
        let own_listings: HashSet<Uuid> = user_scores[&user_id].keys().copied().collect();
        let mut candidate_scores: HashMap<Uuid, f64> = HashMap::new();
        for (row, distance) in &neighbors {
            let weight = 1.0 / (1.0 + distance);
            for (listing, score) in &user_scores[&users[*row]] {
                if !own_listings.contains(listing) {
                    *candidate_scores.entry(*listing).or_insert(0.0) += weight * score;
                }
            }
        }

        let mut ranked: Vec<(Uuid, f64)> = candidate_scores.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        let ranked_ids: Vec<Uuid> = ranked.into_iter().map(|(id, _)| id).collect();

        // Own listings are excluded only here, at the fetch step; the full
        // pool above is needed for neighbor aggregation.
        let mut ordered = self
            .fetch_in_rank_order(&ranked_ids, Some(user_id))
            .await?;

        ordered = cap_brands_with_limit(
            &ordered,
            |l| l.brand.as_str(),
            self.config.max_per_brand,
            limit,
        );

        if let Some(fuel) = self.favorite_fuel_preference(user_id).await? {
            ordered = prioritize_fuel(&ordered, |l| l.fuel_type.as_str(), &fuel);
        }

        let mut ids: Vec<Uuid> = ordered.into_iter().take(limit).map(|l| l.id).collect();

        // Top up from the content engine, preserving order and skipping
        // ids already present
        if ids.len() < limit {
            let padding = content.recommend(user_id, limit - ids.len()).await?;
            for id in padding {
                if ids.len() >= limit {
                    break;
                }
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }

        Ok(ids)
    }

    async fn fetch_in_rank_order(
        &self,
        ranked_ids: &[Uuid],
        exclude_owner: Option<Uuid>,
    ) -> Result<Vec<Listing>> {
        if ranked_ids.is_empty() {
            return Ok(Vec::new());
        }
        let fetched = self
            .store
            .get_listings(ListingFilter {
                ids: Some(ranked_ids.to_vec()),
                exclude_ids: Vec::new(),
                exclude_owner,
            })
            .await?;
        let by_id: HashMap<Uuid, Listing> = fetched.into_iter().map(|l| (l.id, l)).collect();
        Ok(ranked_ids
            .iter()
            .filter_map(|id| by_id.get(id).cloned())
            .collect())
    }

    /// The user's most-favorited fuel type, from Favorite-table rows only
    async fn favorite_fuel_preference(&self, user_id: Uuid) -> Result<Option<String>> {
        let favorites = self.store.get_favorites(Some(user_id)).await?;
        if favorites.is_empty() {
            return Ok(None);
        }

        let favorite_ids: Vec<Uuid> = favorites.iter().map(|f| f.listing_id).collect();
        let listings = self
            .store
            .get_listings(ListingFilter::by_ids(favorite_ids))
            .await?;

        let mut fuel_counts: BTreeMap<String, usize> = BTreeMap::new();
        for listing in &listings {
            *fuel_counts.entry(listing.fuel_type.clone()).or_insert(0) += 1;
        }

        Ok(fuel_counts
            .into_iter()
            .max_by_key(|(_, count)| *count)
            .map(|(fuel, _)| fuel))
    }
}
