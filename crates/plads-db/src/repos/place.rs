use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const PLACE_COLUMNS: &str =
    "place_id, title, description, address, lat, lng, image, creator, created_at";

/// Place row from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlaceRow {
    pub place_id: Uuid,
    pub title: String,
    pub description: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub image: String,
    pub creator: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new place record
#[derive(Debug, Clone)]
pub struct NewPlace {
    pub place_id: Uuid,
    pub title: String,
    pub description: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub image: String,
    pub creator: Uuid,
}

/// Repository for place operations
pub struct PlaceRepo;

impl PlaceRepo {
    pub async fn get(pool: &PgPool, place_id: Uuid) -> Result<Option<PlaceRow>> {
        let row = sqlx::query_as::<_, PlaceRow>(&format!(
            "SELECT {PLACE_COLUMNS} FROM place WHERE place_id = $1"
        ))
        .bind(place_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get place by id")?;
        Ok(row)
    }

    /// Fetch the given places, preserving the order of `place_ids`. The
    /// caller supplies the owner's reference collection; this is the
    /// explicit owner -> places lookup.
    pub async fn get_many_ordered(pool: &PgPool, place_ids: &[Uuid]) -> Result<Vec<PlaceRow>> {
        if place_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, PlaceRow>(&format!(
            "SELECT {PLACE_COLUMNS} FROM place WHERE place_id = ANY($1)"
        ))
        .bind(place_ids)
        .fetch_all(pool)
        .await
        .context("Failed to get places by ids")?;

        // Reorder to match the owner's collection
        let mut ordered = Vec::with_capacity(rows.len());
        for id in place_ids {
            if let Some(row) = rows.iter().find(|r| r.place_id == *id) {
                ordered.push(row.clone());
            }
        }
        Ok(ordered)
    }

    /// Insert a place and append its id to the creator's collection in
    /// a single transaction. Neither side persists if the other fails.
    pub async fn create_with_owner(pool: &PgPool, place: &NewPlace) -> Result<()> {
        let mut tx = pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query(
            r#"
            INSERT INTO place (place_id, title, description, address, lat, lng, image, creator)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(place.place_id)
        .bind(&place.title)
        .bind(&place.description)
        .bind(&place.address)
        .bind(place.lat)
        .bind(place.lng)
        .bind(&place.image)
        .bind(place.creator)
        .execute(&mut *tx)
        .await
        .context("Failed to insert place")?;

        let updated = sqlx::query(
            r#"UPDATE "user" SET place_ids = array_append(place_ids, $1) WHERE user_id = $2"#,
        )
        .bind(place.place_id)
        .bind(place.creator)
        .execute(&mut *tx)
        .await
        .context("Failed to append place to owner collection")?;

        if updated.rows_affected() != 1 {
            bail!("Owner {} not found for new place", place.creator);
        }

        tx.commit().await.context("Failed to commit place creation")?;
        Ok(())
    }

    /// Update title and description, returning the updated row
    pub async fn update(
        pool: &PgPool,
        place_id: Uuid,
        title: &str,
        description: &str,
    ) -> Result<Option<PlaceRow>> {
        let row = sqlx::query_as::<_, PlaceRow>(&format!(
            "UPDATE place SET title = $2, description = $3 WHERE place_id = $1 RETURNING {PLACE_COLUMNS}"
        ))
        .bind(place_id)
        .bind(title)
        .bind(description)
        .fetch_optional(pool)
        .await
        .context("Failed to update place")?;
        Ok(row)
    }

    /// Delete a place and remove its id from the creator's collection
    /// in a single transaction.
    pub async fn delete_with_owner(pool: &PgPool, place_id: Uuid, creator: Uuid) -> Result<()> {
        let mut tx = pool.begin().await.context("Failed to begin transaction")?;

        let deleted = sqlx::query("DELETE FROM place WHERE place_id = $1")
            .bind(place_id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete place")?;

        if deleted.rows_affected() != 1 {
            bail!("Place {} not found for deletion", place_id);
        }

        sqlx::query(
            r#"UPDATE "user" SET place_ids = array_remove(place_ids, $1) WHERE user_id = $2"#,
        )
        .bind(place_id)
        .bind(creator)
        .execute(&mut *tx)
        .await
        .context("Failed to remove place from owner collection")?;

        tx.commit().await.context("Failed to commit place deletion")?;
        Ok(())
    }
}
