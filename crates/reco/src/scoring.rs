//! Interaction scoring
//!
//! Converts a raw interaction (type, count, recency) into the numeric
//! weight used by the collaborative-filtering matrix and stored on every
//! interaction row. Favoriting a listing is a far stronger signal than
//! contacting the seller, which in turn outweighs any number of casual
//! views; all signals decay with age.

use auto_gateway_core::InteractionType;
use chrono::{DateTime, Utc};

/// Flat score for a favorite, independent of how often it was toggled
pub const FAVORITE_BASE_SCORE: f64 = 50.0;
/// Score per contact event
pub const CONTACT_SCORE_PER_EVENT: f64 = 5.0;
/// Score per view event
pub const VIEW_SCORE_PER_EVENT: f64 = 0.1;
/// Decay slope per elapsed day
pub const DECAY_RATE_PER_DAY: f64 = 0.1;
/// Assumed age when the first-interaction timestamp is unavailable
pub const DEFAULT_ELAPSED_DAYS: f64 = 30.0;

/// Temporal decay factor `1 / (1 + 0.1 * days)`, floored at zero elapsed days
pub fn time_decay(elapsed_days: f64) -> f64 {
    1.0 / (1.0 + DECAY_RATE_PER_DAY * elapsed_days.max(0.0))
}

/// Derived score for one interaction row
///
/// `elapsed_days` counts from the first interaction; `None` falls back to a
/// conservative 30-day-old assumption.
pub fn interaction_score(
    interaction_type: InteractionType,
    count: f64,
    elapsed_days: Option<f64>,
) -> f64 {
    let base = match interaction_type {
        InteractionType::Favorite => FAVORITE_BASE_SCORE,
        InteractionType::Contact => CONTACT_SCORE_PER_EVENT * count,
        InteractionType::View => VIEW_SCORE_PER_EVENT * count,
    };

    base * time_decay(elapsed_days.unwrap_or(DEFAULT_ELAPSED_DAYS))
}

/// Whole days between two timestamps, floored at zero
pub fn elapsed_days(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_days().max(0) as f64
}
