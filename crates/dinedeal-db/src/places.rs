//! Database operations for the `places` table.

use std::collections::BTreeMap;

use dinedeal_core::{Place, PlatformEntry};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `places` table. `platforms` and `legacy_fields` are JSONB
/// objects.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlaceRow {
    pub id: String,
    pub name: String,
    pub area: Option<String>,
    pub platforms: serde_json::Value,
    pub legacy_fields: serde_json::Value,
}

impl PlaceRow {
    /// Decodes the JSONB columns into a [`Place`].
    ///
    /// Legacy fields whose value is not a string are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Json`] if `platforms` is not an object of platform
    /// entries.
    pub fn into_place(self) -> Result<Place, DbError> {
        let platforms: BTreeMap<String, PlatformEntry> = if self.platforms.is_null() {
            BTreeMap::new()
        } else {
            serde_json::from_value(self.platforms)?
        };
        let legacy_fields = self
            .legacy_fields
            .as_object()
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_owned())))
                    .collect()
            })
            .unwrap_or_default();
        Ok(Place {
            id: self.id,
            name: self.name,
            area: self.area,
            platforms,
            legacy_fields,
        })
    }
}

/// Returns every place ordered by `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_places(pool: &PgPool) -> Result<Vec<PlaceRow>, DbError> {
    let rows = sqlx::query_as::<_, PlaceRow>(
        "SELECT id, name, area, platforms, legacy_fields FROM places ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Inserts or replaces a place.
///
/// # Errors
///
/// Returns [`DbError::Json`] if the platform map cannot be serialized, or
/// [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_place(pool: &PgPool, place: &Place) -> Result<(), DbError> {
    let platforms = serde_json::to_value(&place.platforms)?;
    let legacy_fields = serde_json::to_value(&place.legacy_fields)?;
    sqlx::query(
        "INSERT INTO places (id, name, area, platforms, legacy_fields) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (id) DO UPDATE SET \
             name = EXCLUDED.name, \
             area = EXCLUDED.area, \
             platforms = EXCLUDED.platforms, \
             legacy_fields = EXCLUDED.legacy_fields, \
             updated_at = NOW()",
    )
    .bind(&place.id)
    .bind(&place.name)
    .bind(place.area.as_deref())
    .bind(platforms)
    .bind(legacy_fields)
    .execute(pool)
    .await?;
    Ok(())
}
