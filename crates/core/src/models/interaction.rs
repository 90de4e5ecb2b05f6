//! Interaction history models
//!
//! Two independent favorite signals exist on the marketplace: the dedicated
//! `Favorite` table written by the explicit favorite toggle, and
//! favorite-type `Interaction` rows written by event tracking. Preference
//! and exclusion logic must union both; collapsing them would change
//! recommendation output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Stored interaction classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    View,
    Favorite,
    Contact,
}

impl InteractionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::View => "view",
            InteractionType::Favorite => "favorite",
            InteractionType::Contact => "contact",
        }
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(InteractionType::View),
            "favorite" => Ok(InteractionType::Favorite),
            "contact" => Ok(InteractionType::Contact),
            other => Err(format!("unknown interaction type '{}'", other)),
        }
    }
}

/// Incoming tracking event from the web layer
///
/// `Click` is a legacy alias recorded as a view; `Unfavorite` removes the
/// favorite-type interaction row rather than writing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionEvent {
    View,
    Click,
    Favorite,
    Unfavorite,
    Contact,
}

impl FromStr for InteractionEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(InteractionEvent::View),
            "click" => Ok(InteractionEvent::Click),
            "favorite" => Ok(InteractionEvent::Favorite),
            "unfavorite" => Ok(InteractionEvent::Unfavorite),
            "contact" => Ok(InteractionEvent::Contact),
            other => Err(format!("unknown interaction event '{}'", other)),
        }
    }
}

/// One interaction row, unique per (user, listing, type)
///
/// `interaction_score` is derived on every mutation: a type-dependent base
/// value decayed by days since the first interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: Uuid,
    pub listing_id: Uuid,
    pub interaction_type: InteractionType,
    pub interaction_count: f64,
    pub first_interaction: DateTime<Utc>,
    pub last_interaction: DateTime<Utc>,
    pub interaction_score: f64,
}

/// Explicit favorite row, unique per (user, listing)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    pub user_id: Uuid,
    pub listing_id: Uuid,
    pub created_at: DateTime<Utc>,
}
