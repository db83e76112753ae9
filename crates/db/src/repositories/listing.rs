use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;

use kurbanlink_core::domain::listing::ListingSummary;
use kurbanlink_core::recommendations::{
    RecommendationContext, CITY_RECENCY_WINDOW_DAYS, FALLBACK_RECENCY_WINDOW_DAYS,
};

use super::{ListingRepository, RepositoryError};
use crate::DbPool;

pub struct SqlListingRepository {
    pool: DbPool,
}

impl SqlListingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ListingRow {
    id: i64,
    seller_id: i64,
    title: String,
    animal_type: String,
    price: f64,
    city: String,
    district: Option<String>,
    view_count: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<ListingRow> for ListingSummary {
    fn from(row: ListingRow) -> Self {
        Self {
            id: row.id,
            seller_id: row.seller_id,
            title: row.title,
            animal_type: row.animal_type,
            price: row.price,
            city: row.city,
            district: row.district,
            view_count: row.view_count,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

const LISTING_COLUMNS: &str = "id, seller_id, title, animal_type, price, city, district, \
                               view_count, is_active, created_at";

/// Build the optional `AND id NOT IN (...)` clause. Ids are numeric, so
/// inlining them is safe and keeps the positional placeholders stable.
fn exclusion_clause(exclude_ids: &[i64]) -> String {
    if exclude_ids.is_empty() {
        return String::new();
    }

    let joined =
        exclude_ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", ");
    format!("AND id NOT IN ({joined})")
}

#[async_trait]
impl ListingRepository for SqlListingRepository {
    /// With a city hint: listings in that city at any age, plus out-of-city
    /// listings created within the 30-day window. Without one: recency only,
    /// within the 60-day window. Newest first, capped at `pool_limit`.
    async fn candidates(
        &self,
        context: &RecommendationContext,
        pool_limit: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<ListingSummary>, RepositoryError> {
        let not_in = exclusion_clause(&context.exclude_ids);

        let rows: Vec<ListingRow> = match context.city.as_deref() {
            Some(city) => {
                let cutoff = (now - Duration::days(CITY_RECENCY_WINDOW_DAYS)).to_rfc3339();
                let sql = format!(
                    "SELECT {LISTING_COLUMNS} FROM listings
                     WHERE is_active = 1
                       AND (?1 IS NULL OR seller_id <> ?1)
                       AND (LOWER(city) = LOWER(?2) OR created_at >= ?3)
                       {not_in}
                     ORDER BY created_at DESC
                     LIMIT ?4",
                );
                sqlx::query_as(&sql)
                    .bind(context.viewer_id)
                    .bind(city.trim())
                    .bind(cutoff)
                    .bind(i64::from(pool_limit))
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let cutoff = (now - Duration::days(FALLBACK_RECENCY_WINDOW_DAYS)).to_rfc3339();
                let sql = format!(
                    "SELECT {LISTING_COLUMNS} FROM listings
                     WHERE is_active = 1
                       AND (?1 IS NULL OR seller_id <> ?1)
                       AND created_at >= ?2
                       {not_in}
                     ORDER BY created_at DESC
                     LIMIT ?3",
                );
                sqlx::query_as(&sql)
                    .bind(context.viewer_id)
                    .bind(cutoff)
                    .bind(i64::from(pool_limit))
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(rows.into_iter().map(ListingSummary::from).collect())
    }
}
