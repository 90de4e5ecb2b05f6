//! User preference profiles
//!
//! Aggregates a user's interacted listings into weighted categorical
//! counters and numeric ranges. Built fresh for every recommendation
//! request; never cached.

use auto_gateway_core::Listing;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Profile weight for a favorited listing
pub const FAVORITE_WEIGHT: f64 = 50.0;
/// Profile weight for a contacted listing
pub const CONTACT_WEIGHT: f64 = 5.0;
/// Profile weight for a merely viewed listing
pub const VIEW_WEIGHT: f64 = 0.01;

/// Counter entries survive pruning with at least this weight
const PRUNE_MIN_WEIGHT: f64 = 2.0;
/// ...or at least this share of the counter's total mass
const PRUNE_MIN_SHARE: f64 = 0.1;

/// Top fuel share above which the fuel preference counts as dominant
const DOMINANT_FUEL_SHARE: f64 = 0.7;
/// Top brand share above which the brand preference counts as dominant
const DOMINANT_BRAND_SHARE: f64 = 0.6;
/// Distinct listings of the top brand required for brand dominance
const DOMINANT_BRAND_MIN_LISTINGS: usize = 2;
/// Price spread below which the price preference counts as dominant
const DOMINANT_PRICE_SPREAD: f64 = 0.3;

/// Weighted min/max/average over one numeric listing attribute
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RangeStats {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: f64,
}

impl RangeStats {
    /// Track extrema; after the first observation, zeros no longer lower
    /// the minimum (absent attributes are stored as zero)
    fn observe(&mut self, value: f64) {
        match self.min {
            None => self.min = Some(value),
            Some(min) if value > 0.0 && value < min => self.min = Some(value),
            _ => {}
        }
        match self.max {
            None => self.max = Some(value),
            Some(max) if value > max => self.max = Some(value),
            _ => {}
        }
    }
}

/// A user's aggregated listing preferences
///
/// Categorical counters hold interaction-weighted masses and are pruned to
/// significant entries; `brand_listing_counts` keeps the raw number of
/// distinct listings per brand (unpruned) for dominance detection.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PreferenceProfile {
    pub brands: HashMap<String, f64>,
    pub models: HashMap<String, f64>,
    pub fuel_types: HashMap<String, f64>,
    pub transmissions: HashMap<String, f64>,
    pub body_types: HashMap<String, f64>,
    pub colors: HashMap<String, f64>,
    pub price: RangeStats,
    pub mileage: RangeStats,
    pub year: RangeStats,
    pub power: RangeStats,
    /// Total weight mass across all listings
    pub total_weight: f64,
    /// Raw count of interacted listings per brand
    pub brand_listing_counts: HashMap<String, usize>,
}

impl PreferenceProfile {
    /// Build a profile from the listings a user interacted with.
    ///
    /// Each listing contributes once, at its strongest classification:
    /// membership in `favorite_ids` (the union of Favorite rows and
    /// favorite-type interactions) wins over `contacted_ids`, which wins
    /// over the view default.
    pub fn build(
        listings: &[Listing],
        favorite_ids: &HashSet<Uuid>,
        contacted_ids: &HashSet<Uuid>,
    ) -> Self {
        let mut profile = Self::default();

        let mut price_sum = 0.0;
        let mut mileage_sum = 0.0;
        let mut year_sum = 0.0;
        let mut power_sum = 0.0;

        for listing in listings {
            let weight = if favorite_ids.contains(&listing.id) {
                FAVORITE_WEIGHT
            } else if contacted_ids.contains(&listing.id) {
                CONTACT_WEIGHT
            } else {
                VIEW_WEIGHT
            };

            profile.total_weight += weight;

            *profile.brands.entry(listing.brand.clone()).or_insert(0.0) += weight;
            *profile
                .models
                .entry(format!("{} {}", listing.brand, listing.model))
                .or_insert(0.0) += weight;
            *profile
                .fuel_types
                .entry(listing.fuel_type.clone())
                .or_insert(0.0) += weight;
            *profile
                .transmissions
                .entry(listing.transmission.clone())
                .or_insert(0.0) += weight;
            if let Some(body_type) = listing.body_type.as_ref().filter(|b| !b.is_empty()) {
                *profile.body_types.entry(body_type.clone()).or_insert(0.0) += weight;
            }
            if let Some(color) = listing.color.as_ref().filter(|c| !c.is_empty()) {
                *profile.colors.entry(color.clone()).or_insert(0.0) += weight;
            }
            *profile
                .brand_listing_counts
                .entry(listing.brand.clone())
                .or_insert(0) += 1;

            let price = listing.price as f64;
            let mileage = listing.mileage as f64;
            let year = listing.year_of_manufacture as f64;
            let power = listing.power as f64;

            price_sum += price * weight;
            mileage_sum += mileage * weight;
            year_sum += year * weight;
            power_sum += power * weight;

            profile.price.observe(price);
            profile.mileage.observe(mileage);
            profile.year.observe(year);
            profile.power.observe(power);
        }

        if profile.total_weight > 0.0 {
            profile.price.avg = price_sum / profile.total_weight;
            profile.mileage.avg = mileage_sum / profile.total_weight;
            profile.year.avg = year_sum / profile.total_weight;
            profile.power.avg = power_sum / profile.total_weight;
        }

        for counter in [
            &mut profile.brands,
            &mut profile.models,
            &mut profile.fuel_types,
            &mut profile.transmissions,
            &mut profile.body_types,
            &mut profile.colors,
        ] {
            prune_counter(counter);
        }

        profile
    }

    /// True for a profile built from no listings (cold start)
    pub fn is_empty(&self) -> bool {
        self.total_weight == 0.0
    }

    /// Brand with the highest weighted count, with its weight
    pub fn dominant_brand(&self) -> Option<(&str, f64)> {
        argmax(&self.brands)
    }

    /// Fuel type with the highest weighted count, with its weight
    pub fn dominant_fuel(&self) -> Option<(&str, f64)> {
        argmax(&self.fuel_types)
    }

    /// The user leans heavily on one brand: its weighted share exceeds 60%
    /// and it covers more than two distinct listings. A single favorited
    /// listing can win the weighted counter outright but is not enough
    /// evidence on its own.
    pub fn dominant_brand_preference(&self) -> bool {
        let Some((brand, weight)) = self.dominant_brand() else {
            return false;
        };
        let total: f64 = self.brands.values().sum();
        if total <= 0.0 {
            return false;
        }
        let listings = self.brand_listing_counts.get(brand).copied().unwrap_or(0);
        listings > DOMINANT_BRAND_MIN_LISTINGS && weight / total > DOMINANT_BRAND_SHARE
    }

    /// The user leans heavily on one fuel type: it is the only one seen, or
    /// its weighted share exceeds 70%
    pub fn dominant_fuel_preference(&self) -> bool {
        if self.fuel_types.is_empty() {
            return false;
        }
        if self.fuel_types.len() == 1 {
            return true;
        }
        let total: f64 = self.fuel_types.values().sum();
        let top = self.dominant_fuel().map(|(_, w)| w).unwrap_or(0.0);
        total > 0.0 && top / total > DOMINANT_FUEL_SHARE
    }

    /// Relative width of the observed price band
    pub fn price_spread(&self) -> f64 {
        match (self.price.min, self.price.max) {
            (Some(min), Some(max)) if self.price.avg > 0.0 => (max - min) / self.price.avg,
            _ => 0.0,
        }
    }

    /// The user shops in a narrow price band
    pub fn dominant_price_preference(&self) -> bool {
        self.price_spread() < DOMINANT_PRICE_SPREAD
    }

    /// "brand model" keys of the given brand with positive weight
    pub fn preferred_models_for(&self, brand: &str) -> Vec<&str> {
        let prefix = format!("{} ", brand);
        let mut models: Vec<&str> = self
            .models
            .iter()
            .filter(|(key, weight)| **weight > 0.0 && key.starts_with(&prefix))
            .map(|(key, _)| key.as_str())
            .collect();
        models.sort_unstable();
        models
    }
}

/// Drop counter entries below both the absolute and relative thresholds
fn prune_counter(counter: &mut HashMap<String, f64>) {
    let total: f64 = counter.values().sum();
    if total <= 0.0 {
        return;
    }
    counter.retain(|_, weight| *weight >= PRUNE_MIN_WEIGHT || *weight / total >= PRUNE_MIN_SHARE);
}

/// Highest-weight entry, ties broken by key for determinism
fn argmax(counter: &HashMap<String, f64>) -> Option<(&str, f64)> {
    counter
        .iter()
        .max_by(|a, b| {
            a.1.partial_cmp(b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.0.cmp(a.0))
        })
        .map(|(key, weight)| (key.as_str(), *weight))
}
