//! Vehicle listing model
//!
//! Listings are read-only from the recommendation engine's point of view:
//! the marketplace web layer owns their lifecycle, the engine only consumes
//! their attributes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A vehicle listing on the marketplace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Listing {
    /// Unique listing identifier
    pub id: Uuid,

    /// Account that published the listing
    pub owner_user_id: Uuid,

    /// Listing title as shown on the marketplace
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    /// Manufacturer name (e.g. "Toyota")
    #[validate(length(min = 1, max = 50))]
    pub brand: String,

    /// Model name within the brand (e.g. "Corolla")
    #[validate(length(min = 1, max = 50))]
    pub model: String,

    /// Fuel type (e.g. "petrol", "diesel", "electric", "hybrid")
    #[validate(length(min = 1, max = 20))]
    pub fuel_type: String,

    /// Transmission type (e.g. "manual", "automatic")
    #[validate(length(min = 1, max = 15))]
    pub transmission: String,

    /// Body type (e.g. "sedan", "suv"), when provided
    pub body_type: Option<String>,

    /// Exterior color, when provided
    pub color: Option<String>,

    /// Condition ("new", "used", "damaged")
    #[validate(length(min = 1, max = 10))]
    pub condition_state: String,

    /// Asking price
    #[validate(range(min = 0))]
    pub price: i64,

    /// Year of manufacture
    #[validate(range(min = 1900, max = 2100))]
    pub year_of_manufacture: i32,

    /// Odometer reading in kilometers
    #[validate(range(min = 0))]
    pub mileage: i64,

    /// Engine power in horsepower
    #[validate(range(min = 0))]
    pub power: i32,

    /// When the listing was published
    pub created_at: DateTime<Utc>,
}

impl Listing {
    /// Age of the listing in whole days at `now`
    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_listing() -> Listing {
        Listing {
            id: Uuid::new_v4(),
            owner_user_id: Uuid::new_v4(),
            title: "Toyota Corolla 2021".to_string(),
            brand: "Toyota".to_string(),
            model: "Corolla".to_string(),
            fuel_type: "petrol".to_string(),
            transmission: "manual".to_string(),
            body_type: Some("sedan".to_string()),
            color: Some("blue".to_string()),
            condition_state: "used".to_string(),
            price: 15000,
            year_of_manufacture: 2021,
            mileage: 42000,
            power: 120,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_listing_validation() {
        let listing = sample_listing();
        assert!(listing.validate().is_ok());

        let mut bad = sample_listing();
        bad.brand = String::new();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_age_days() {
        let mut listing = sample_listing();
        let now = Utc::now();
        listing.created_at = now - chrono::Duration::days(10);
        assert_eq!(listing.age_days(now), 10);
    }
}
