//! PostgreSQL-backed listing store
//!
//! Implements [`ListingStore`](crate::store::ListingStore) against the
//! marketplace schema (`car_listings`, `user_interactions`, `favorites`).
//! Queries are plain runtime queries; the engine re-reads whatever snapshot
//! the database serves, with no isolation beyond each individual read.

use crate::scoring;
use crate::store::{InteractionFilter, ListingCounts, ListingFilter, ListingStore};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use auto_gateway_core::{Favorite, Interaction, InteractionType, Listing};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Listing store over the marketplace's PostgreSQL schema
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn listing_from_row(row: &PgRow) -> Result<Listing> {
    Ok(Listing {
        id: row.try_get("id")?,
        owner_user_id: row.try_get("owner_user_id")?,
        title: row.try_get("title")?,
        brand: row.try_get("brand")?,
        model: row.try_get("model")?,
        fuel_type: row.try_get("fuel_type")?,
        transmission: row.try_get("transmission")?,
        body_type: row.try_get("body_type")?,
        color: row.try_get("color")?,
        condition_state: row.try_get("condition_state")?,
        price: row.try_get("price")?,
        year_of_manufacture: row.try_get("year_of_manufacture")?,
        mileage: row.try_get("mileage")?,
        power: row.try_get("power")?,
        created_at: row.try_get("created_at")?,
    })
}

fn interaction_from_row(row: &PgRow) -> Result<Interaction> {
    let type_str: String = row.try_get("interaction_type")?;
    let interaction_type = type_str
        .parse::<InteractionType>()
        .map_err(|e| anyhow!(e))?;

    Ok(Interaction {
        user_id: row.try_get("user_id")?,
        listing_id: row.try_get("listing_id")?,
        interaction_type,
        interaction_count: row.try_get("interaction_count")?,
        first_interaction: row.try_get("first_interaction")?,
        last_interaction: row.try_get("last_interaction")?,
        interaction_score: row.try_get("interaction_score")?,
    })
}

#[async_trait]
impl ListingStore for PostgresStore {
    async fn get_interactions(&self, filter: InteractionFilter) -> Result<Vec<Interaction>> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, listing_id, interaction_type, interaction_count,
                   first_interaction, last_interaction, interaction_score
            FROM user_interactions
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::uuid IS NULL OR listing_id = $2)
              AND ($3::varchar IS NULL OR interaction_type = $3)
            ORDER BY user_id, listing_id, interaction_type
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.listing_id)
        .bind(filter.interaction_type.map(|t| t.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(interaction_from_row).collect()
    }

    async fn upsert_interaction(
        &self,
        user_id: Uuid,
        listing_id: Uuid,
        interaction_type: InteractionType,
        count_delta: f64,
        now: DateTime<Utc>,
    ) -> Result<Interaction> {
        let row = sqlx::query(
            r#"
            INSERT INTO user_interactions
                (user_id, listing_id, interaction_type, interaction_count,
                 first_interaction, last_interaction, interaction_score)
            VALUES ($1, $2, $3, $4, $5, $5, 0)
            ON CONFLICT (user_id, listing_id, interaction_type)
            DO UPDATE SET
                interaction_count = user_interactions.interaction_count + EXCLUDED.interaction_count,
                last_interaction = EXCLUDED.last_interaction
            RETURNING user_id, listing_id, interaction_type, interaction_count,
                      first_interaction, last_interaction, interaction_score
            "#,
        )
        .bind(user_id)
        .bind(listing_id)
        .bind(interaction_type.as_str())
        .bind(count_delta)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        let mut interaction = interaction_from_row(&row)?;

        // Score depends on the row's first-interaction timestamp, which is
        // only known after the upsert
        let elapsed = scoring::elapsed_days(interaction.first_interaction, now);
        interaction.interaction_score = scoring::interaction_score(
            interaction_type,
            interaction.interaction_count,
            Some(elapsed),
        );

        sqlx::query(
            r#"
            UPDATE user_interactions
            SET interaction_score = $4
            WHERE user_id = $1 AND listing_id = $2 AND interaction_type = $3
            "#,
        )
        .bind(user_id)
        .bind(listing_id)
        .bind(interaction_type.as_str())
        .bind(interaction.interaction_score)
        .execute(&self.pool)
        .await?;

        Ok(interaction)
    }

    async fn delete_interaction(
        &self,
        user_id: Uuid,
        listing_id: Uuid,
        interaction_type: InteractionType,
    ) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM user_interactions
            WHERE user_id = $1 AND listing_id = $2 AND interaction_type = $3
            "#,
        )
        .bind(user_id)
        .bind(listing_id)
        .bind(interaction_type.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_favorites(&self, user_id: Option<Uuid>) -> Result<Vec<Favorite>> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, listing_id, created_at
            FROM favorites
            WHERE ($1::uuid IS NULL OR user_id = $1)
            ORDER BY user_id, listing_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(Favorite {
                    user_id: row.try_get("user_id")?,
                    listing_id: row.try_get("listing_id")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    async fn get_listing(&self, id: Uuid) -> Result<Option<Listing>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_user_id, title, brand, model, fuel_type, transmission,
                   body_type, color, condition_state, price, year_of_manufacture,
                   mileage, power, created_at
            FROM car_listings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(listing_from_row).transpose()
    }

    async fn get_listings(&self, filter: ListingFilter) -> Result<Vec<Listing>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_user_id, title, brand, model, fuel_type, transmission,
                   body_type, color, condition_state, price, year_of_manufacture,
                   mileage, power, created_at
            FROM car_listings
            WHERE ($1::uuid[] IS NULL OR id = ANY($1))
              AND NOT (id = ANY($2))
              AND ($3::uuid IS NULL OR owner_user_id <> $3)
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(filter.ids)
        .bind(filter.exclude_ids)
        .bind(filter.exclude_owner)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(listing_from_row).collect()
    }

    async fn count_interactions_and_favorites_per_listing(&self) -> Result<ListingCounts> {
        let rows = sqlx::query(
            r#"
            SELECT l.id AS listing_id,
                   (SELECT COUNT(*) FROM user_interactions ui WHERE ui.listing_id = l.id) AS interaction_count,
                   (SELECT COUNT(*) FROM favorites f WHERE f.listing_id = l.id) AS favorite_count
            FROM car_listings l
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut counts = ListingCounts::new();
        for row in rows {
            let listing_id: Uuid = row.try_get("listing_id")?;
            let interactions: i64 = row.try_get("interaction_count")?;
            let favorites: i64 = row.try_get("favorite_count")?;
            counts.insert(listing_id, (interactions as u64, favorites as u64));
        }

        Ok(counts)
    }
}
