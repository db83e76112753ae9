use async_trait::async_trait;
use chrono::{DateTime, Utc};

use kurbanlink_core::domain::interaction::{InteractionKind, NewInteraction};

use super::{InteractionRepository, LogOutcome, RepositoryError};
use crate::DbPool;

pub struct SqlInteractionRepository {
    pool: DbPool,
}

impl SqlInteractionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InteractionRepository for SqlInteractionRepository {
    /// For a VIEW the counter update doubles as the existence check: zero
    /// rows affected means the listing is gone and nothing is written. The
    /// increment and the interaction row commit or roll back together.
    async fn log(
        &self,
        interaction: &NewInteraction,
        now: DateTime<Utc>,
    ) -> Result<LogOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let listing_exists = match interaction.kind {
            InteractionKind::View => {
                let updated =
                    sqlx::query("UPDATE listings SET view_count = view_count + 1 WHERE id = ?1")
                        .bind(interaction.listing_id)
                        .execute(&mut *tx)
                        .await?;
                updated.rows_affected() > 0
            }
            _ => {
                let exists: i64 =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM listings WHERE id = ?1)")
                        .bind(interaction.listing_id)
                        .fetch_one(&mut *tx)
                        .await?;
                exists == 1
            }
        };

        if !listing_exists {
            tx.rollback().await?;
            return Ok(LogOutcome::ListingMissing);
        }

        sqlx::query(
            "INSERT INTO interactions (user_id, listing_id, kind, ip_address, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(interaction.user_id)
        .bind(interaction.listing_id)
        .bind(interaction.kind.as_str())
        .bind(interaction.ip_address.as_deref())
        .bind(now.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(LogOutcome::Logged)
    }
}
