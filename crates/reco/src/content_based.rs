//! Content-based filtering
//!
//! Recommends listings whose attributes resemble what the user has viewed,
//! contacted, and favorited. Textual TF-IDF similarity over derived feature
//! strings is blended with attribute-match scores under preference-adaptive
//! weights, boosted for fresh listings, then re-ranked for brand diversity
//! and fuel preference.

use crate::diversity::brand_cap_partition;
use crate::popularity::PopularityRanker;
use crate::profile::PreferenceProfile;
use crate::store::{InteractionFilter, ListingFilter, ListingStore};
use crate::tfidf::{mean_similarity, TfidfVectorizer};
use crate::RecoConfig;
use anyhow::Result;
use auto_gateway_core::{InteractionType, Listing};
use chrono::{DateTime, Utc};
use ndarray::Axis;
use std::collections::HashSet;
use tracing::{debug, info};
use uuid::Uuid;

/// Weight of each non-adaptive factor (transmission, year, mileage, power,
/// body type)
pub(crate) const FIXED_FACTOR_WEIGHT: f64 = 0.05;

/// Adaptive weights over the five preference-sensitive factors.
///
/// Every preset sums to 1.0 together with the five fixed 0.05 factors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FactorWeights {
    pub tfidf: f64,
    pub brand: f64,
    pub model: f64,
    pub fuel: f64,
    pub price: f64,
}

impl FactorWeights {
    /// Select a preset from the profile's dominance flags; fuel wins over
    /// price, price over brand.
    pub(crate) fn for_profile(
        fuel_dominant: bool,
        price_dominant: bool,
        brand_dominant: bool,
    ) -> Self {
        if fuel_dominant {
            Self {
                tfidf: 0.25,
                brand: 0.10,
                model: 0.05,
                fuel: 0.25,
                price: 0.10,
            }
        } else if price_dominant {
            Self {
                tfidf: 0.25,
                brand: 0.10,
                model: 0.05,
                fuel: 0.10,
                price: 0.25,
            }
        } else if brand_dominant {
            Self {
                tfidf: 0.25,
                brand: 0.20,
                model: 0.10,
                fuel: 0.10,
                price: 0.10,
            }
        } else {
            Self {
                tfidf: 0.25,
                brand: 0.15,
                model: 0.05,
                fuel: 0.15,
                price: 0.15,
            }
        }
    }

    #[cfg(test)]
    fn total(&self) -> f64 {
        self.tfidf + self.brand + self.model + self.fuel + self.price + 5.0 * FIXED_FACTOR_WEIGHT
    }
}

/// A user's listing history, split into the signal sets the profile builder
/// and the exclusion rules need
pub(crate) struct UserHistory {
    /// Every listing the user interacted with, in store order
    pub learning: Vec<Listing>,
    /// Union of Favorite rows and favorite-type interactions
    pub favorite_ids: HashSet<Uuid>,
    /// Listings with a contact-type interaction
    pub contacted_ids: HashSet<Uuid>,
}

pub(crate) async fn gather_user_history<S: ListingStore>(
    store: &S,
    user_id: Uuid,
) -> Result<UserHistory> {
    let favorites = store.get_favorites(Some(user_id)).await?;
    let interactions = store
        .get_interactions(InteractionFilter::for_user(user_id))
        .await?;

    let mut favorite_ids: HashSet<Uuid> = favorites.iter().map(|f| f.listing_id).collect();
    favorite_ids.extend(
        interactions
            .iter()
            .filter(|i| i.interaction_type == InteractionType::Favorite)
            .map(|i| i.listing_id),
    );

    let contacted_ids: HashSet<Uuid> = interactions
        .iter()
        .filter(|i| i.interaction_type == InteractionType::Contact)
        .map(|i| i.listing_id)
        .collect();

    let mut learning_ids: Vec<Uuid> = interactions.iter().map(|i| i.listing_id).collect();
    learning_ids.extend(favorites.iter().map(|f| f.listing_id));
    learning_ids.sort_unstable();
    learning_ids.dedup();

    let learning = if learning_ids.is_empty() {
        Vec::new()
    } else {
        store.get_listings(ListingFilter::by_ids(learning_ids)).await?
    };

    Ok(UserHistory {
        learning,
        favorite_ids,
        contacted_ids,
    })
}

/// Textual feature representation of a listing.
///
/// Brand is repeated twice and model three times so they dominate the
/// TF-IDF vocabulary; three derived category tokens fold the numeric
/// attributes into comparable text.
pub(crate) fn feature_string(listing: &Listing) -> String {
    let price_category = if listing.price > 30000 {
        "premium"
    } else if listing.price > 0 && listing.price < 10000 {
        "budget"
    } else {
        "mid-range"
    };

    let year_category = if listing.year_of_manufacture >= 2020 {
        "new"
    } else if listing.year_of_manufacture >= 2015 {
        "recent"
    } else {
        "older"
    };

    let mileage_category = if listing.mileage > 0 && listing.mileage < 50000 {
        "low-mileage"
    } else if listing.mileage > 150000 {
        "high-mileage"
    } else {
        "average-mileage"
    };

    format!(
        "{brand} {brand} {model} {model} {model} {fuel} {transmission} {body} {condition} {price_category} {year_category} {mileage_category}",
        brand = listing.brand,
        model = listing.model,
        fuel = listing.fuel_type,
        transmission = listing.transmission,
        body = listing.body_type.as_deref().unwrap_or(""),
        condition = listing.condition_state,
    )
}

/// 1.0 inside the profile's price band widened by 10%, graded penalty
/// outside; cheaper listings floor at 0.5, pricier ones at 0.3
pub(crate) fn price_match(listing: &Listing, profile: &PreferenceProfile) -> f64 {
    if listing.price <= 0 || profile.price.avg <= 0.0 {
        return 1.0;
    }
    let price = listing.price as f64;
    let lower = profile.price.min.unwrap_or(0.0) * 0.9;
    let upper = profile.price.max.map(|m| m * 1.1).unwrap_or(f64::INFINITY);

    if price < lower {
        (1.0 - (lower - price) / lower).max(0.5)
    } else if price > upper {
        (1.0 - (price - upper) / upper).max(0.3)
    } else {
        1.0
    }
}

pub(crate) fn year_match(listing: &Listing, profile: &PreferenceProfile) -> f64 {
    if listing.year_of_manufacture <= 0 || profile.year.avg <= 0.0 {
        return 1.0;
    }
    let diff = (listing.year_of_manufacture as f64 - profile.year.avg).abs();
    1.0 - (diff / 5.0).min(1.0)
}

/// Asymmetric: mileage above the profile average is penalized more steeply
/// than mileage below it
pub(crate) fn mileage_match(listing: &Listing, profile: &PreferenceProfile) -> f64 {
    if listing.mileage <= 0 || profile.mileage.avg <= 0.0 {
        return 1.0;
    }
    let mileage = listing.mileage as f64;
    let avg = profile.mileage.avg;
    if mileage > avg {
        1.0 - ((mileage - avg) / (avg + 10000.0)).min(1.0)
    } else {
        1.0 - ((avg - mileage) / (avg * 2.0)).min(0.3)
    }
}

pub(crate) fn power_match(listing: &Listing, profile: &PreferenceProfile) -> f64 {
    if listing.power <= 0 || profile.power.avg <= 0.0 {
        return 1.0;
    }
    let diff = (listing.power as f64 - profile.power.avg).abs();
    1.0 - (diff / (profile.power.avg + 20.0)).min(1.0)
}

pub(crate) fn body_type_match(listing: &Listing, profile: &PreferenceProfile) -> f64 {
    match listing.body_type.as_ref().filter(|b| !b.is_empty()) {
        Some(body) if profile.body_types.contains_key(body.as_str()) => 1.0,
        Some(_) => 0.6,
        None => 1.0,
    }
}

pub(crate) fn brand_match(listing: &Listing, profile: &PreferenceProfile) -> f64 {
    if profile.brands.contains_key(listing.brand.as_str()) {
        1.0
    } else {
        0.5
    }
}

pub(crate) fn transmission_match(listing: &Listing, profile: &PreferenceProfile) -> f64 {
    if profile.transmissions.contains_key(listing.transmission.as_str()) {
        1.0
    } else {
        0.7
    }
}

/// 1.0 when the candidate's model appears within one of the dominant
/// brand's preferred "brand model" entries.
///
/// Matching is by substring, so "A3" also hits "Audi A35"; kept as-is to
/// preserve the established ranking behavior.
pub(crate) fn model_match(
    listing: &Listing,
    profile: &PreferenceProfile,
    dominant_brand: Option<&str>,
) -> f64 {
    if let Some(brand) = dominant_brand {
        if listing.brand == brand {
            let preferred = profile.preferred_models_for(brand);
            if preferred
                .iter()
                .any(|entry| entry.contains(listing.model.as_str()))
            {
                return 1.0;
            }
        }
    }
    0.7
}

pub(crate) fn fuel_match(
    listing: &Listing,
    profile: &PreferenceProfile,
    fuel_dominant: bool,
    dominant_fuel: Option<&str>,
) -> f64 {
    if fuel_dominant {
        if Some(listing.fuel_type.as_str()) == dominant_fuel {
            1.0
        } else {
            0.5
        }
    } else if profile.fuel_types.contains_key(listing.fuel_type.as_str()) {
        1.0
    } else {
        0.7
    }
}

/// Up to +20% for listings no older than 30 days
pub(crate) fn freshness_factor(listing: &Listing, now: DateTime<Utc>) -> f64 {
    let age_days = listing.age_days(now);
    1.0 + ((30 - age_days).max(0) as f64 / 30.0) * 0.2
}

#[derive(Debug, Clone)]
struct ScoredCandidate {
    listing: Listing,
    final_score: f64,
}

/// Content-based recommendation engine
pub struct ContentBasedFiltering<'a, S> {
    store: &'a S,
    config: &'a RecoConfig,
}

impl<'a, S: ListingStore> ContentBasedFiltering<'a, S> {
    pub fn new(store: &'a S, config: &'a RecoConfig) -> Self {
        Self { store, config }
    }

    /// Ranked listing ids for the user, best match first
    pub async fn recommend(&self, user_id: Uuid, limit: usize) -> Result<Vec<Uuid>> {
        let popularity = PopularityRanker::new(self.store);

        let history = gather_user_history(self.store, user_id).await?;
        if history.learning.is_empty() {
            info!(%user_id, "no interaction history, serving popular listings");
            return popularity.top_ids(Some(user_id), limit).await;
        }

        let profile = PreferenceProfile::build(
            &history.learning,
            &history.favorite_ids,
            &history.contacted_ids,
        );

        // Favorited listings (either signal) and the user's own listings are
        // never recommended; viewed and contacted ones stay eligible.
        let candidates = self
            .store
            .get_listings(ListingFilter {
                ids: None,
                exclude_ids: history.favorite_ids.iter().copied().collect(),
                exclude_owner: Some(user_id),
            })
            .await?;

        if candidates.len() < self.config.min_content_candidates {
            info!(
                candidates = candidates.len(),
                "candidate pool too small, serving popular listings"
            );
            return popularity.top_ids(Some(user_id), limit).await;
        }

        let now = Utc::now();

        let mut documents: Vec<String> = history.learning.iter().map(feature_string).collect();
        documents.extend(candidates.iter().map(feature_string));

        let mut vectorizer = TfidfVectorizer::new();
        let matrix = vectorizer.fit_transform(&documents);
        let (learning_rows, candidate_rows) =
            matrix.view().split_at(Axis(0), history.learning.len());
        let similarities = mean_similarity(learning_rows, candidate_rows);

        let fuel_dominant = profile.dominant_fuel_preference();
        let dominant_fuel = profile.dominant_fuel().map(|(fuel, _)| fuel.to_string());
        let dominant_brand = profile.dominant_brand().map(|(brand, _)| brand.to_string());
        let weights = FactorWeights::for_profile(
            fuel_dominant,
            profile.dominant_price_preference(),
            profile.dominant_brand_preference(),
        );

        debug!(
            candidates = similarities.len(),
            fuel_dominant,
            vocabulary = vectorizer.vocabulary_size(),
            "scoring content candidates"
        );

        let mut scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .zip(similarities)
            .map(|(listing, tfidf_similarity)| {
                let base_score = weights.tfidf * tfidf_similarity
                    + weights.brand * brand_match(&listing, &profile)
                    + weights.model * model_match(&listing, &profile, dominant_brand.as_deref())
                    + weights.fuel
                        * fuel_match(&listing, &profile, fuel_dominant, dominant_fuel.as_deref())
                    + weights.price * price_match(&listing, &profile)
                    + FIXED_FACTOR_WEIGHT * transmission_match(&listing, &profile)
                    + FIXED_FACTOR_WEIGHT * year_match(&listing, &profile)
                    + FIXED_FACTOR_WEIGHT * mileage_match(&listing, &profile)
                    + FIXED_FACTOR_WEIGHT * power_match(&listing, &profile)
                    + FIXED_FACTOR_WEIGHT * body_type_match(&listing, &profile);

                let final_score = base_score * freshness_factor(&listing, now);
                ScoredCandidate {
                    listing,
                    final_score,
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.final_score
                .partial_cmp(&a.final_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let ranked = match dominant_fuel.as_deref().filter(|_| fuel_dominant) {
            Some(fuel) => self.rerank_with_fuel_reservation(scored, fuel, limit),
            None => {
                let (kept, overflow) =
                    brand_cap_partition(&scored, |c| c.listing.brand.as_str(), self.config.max_per_brand);
                pad_to_limit(kept, overflow, limit)
            }
        };

        Ok(ranked
            .into_iter()
            .take(limit)
            .map(|c| c.listing.id)
            .collect())
    }

    /// Reserve the top slots for the preferred fuel type, then brand-cap the
    /// reserved group and the remainder separately
    fn rerank_with_fuel_reservation(
        &self,
        scored: Vec<ScoredCandidate>,
        fuel: &str,
        limit: usize,
    ) -> Vec<ScoredCandidate> {
        let preferred_count = scored
            .iter()
            .filter(|c| c.listing.fuel_type == fuel)
            .count();
        let reserved = (limit / 2).max(3).min(preferred_count);

        let reserved_group: Vec<ScoredCandidate> = scored
            .iter()
            .filter(|c| c.listing.fuel_type == fuel)
            .take(reserved)
            .cloned()
            .collect();
        let reserved_ids: HashSet<Uuid> = reserved_group.iter().map(|c| c.listing.id).collect();
        let rest: Vec<ScoredCandidate> = scored
            .into_iter()
            .filter(|c| !reserved_ids.contains(&c.listing.id))
            .collect();

        let (mut kept, mut overflow) = brand_cap_partition(
            &reserved_group,
            |c| c.listing.brand.as_str(),
            self.config.max_per_brand,
        );
        let (rest_kept, rest_overflow) =
            brand_cap_partition(&rest, |c| c.listing.brand.as_str(), self.config.max_per_brand);
        kept.extend(rest_kept);
        overflow.extend(rest_overflow);

        pad_to_limit(kept, overflow, limit)
    }
}

fn pad_to_limit(
    mut kept: Vec<ScoredCandidate>,
    overflow: Vec<ScoredCandidate>,
    limit: usize,
) -> Vec<ScoredCandidate> {
    for candidate in overflow {
        if kept.len() >= limit {
            break;
        }
        kept.push(candidate);
    }
    kept
}
