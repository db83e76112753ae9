use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use kurbanlink_core::domain::interaction::{Interaction, InteractionKind, NewInteraction};
use kurbanlink_core::domain::listing::ListingSummary;
use kurbanlink_core::recommendations::{
    RecommendationContext, CITY_RECENCY_WINDOW_DAYS, FALLBACK_RECENCY_WINDOW_DAYS,
};

use super::{InteractionRepository, ListingRepository, LogOutcome, RepositoryError};

/// In-memory double with the same candidate semantics as the SQL
/// implementation, for tests that do not want a database.
#[derive(Default)]
pub struct InMemoryListingRepository {
    listings: RwLock<HashMap<i64, ListingSummary>>,
}

impl InMemoryListingRepository {
    pub async fn insert(&self, listing: ListingSummary) {
        let mut listings = self.listings.write().await;
        listings.insert(listing.id, listing);
    }

    pub async fn view_count(&self, listing_id: i64) -> Option<i64> {
        let listings = self.listings.read().await;
        listings.get(&listing_id).map(|listing| listing.view_count)
    }
}

#[async_trait::async_trait]
impl ListingRepository for InMemoryListingRepository {
    async fn candidates(
        &self,
        context: &RecommendationContext,
        pool_limit: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<ListingSummary>, RepositoryError> {
        let listings = self.listings.read().await;

        let mut matched: Vec<ListingSummary> = listings
            .values()
            .filter(|listing| {
                listing.is_active
                    && context.viewer_id != Some(listing.seller_id)
                    && !context.exclude_ids.contains(&listing.id)
            })
            .filter(|listing| match context.city.as_deref() {
                Some(city) => {
                    listing.in_city(city)
                        || now - listing.created_at <= Duration::days(CITY_RECENCY_WINDOW_DAYS)
                }
                None => now - listing.created_at <= Duration::days(FALLBACK_RECENCY_WINDOW_DAYS),
            })
            .cloned()
            .collect();

        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matched.truncate(pool_limit as usize);
        Ok(matched)
    }
}

/// Interaction double. Keeps its own set of known listing ids and view
/// counters rather than sharing state with [`InMemoryListingRepository`].
#[derive(Default)]
pub struct InMemoryInteractionRepository {
    view_counts: RwLock<HashMap<i64, i64>>,
    logged: RwLock<Vec<Interaction>>,
}

impl InMemoryInteractionRepository {
    pub async fn register_listing(&self, listing_id: i64) {
        let mut view_counts = self.view_counts.write().await;
        view_counts.entry(listing_id).or_insert(0);
    }

    pub async fn view_count(&self, listing_id: i64) -> Option<i64> {
        let view_counts = self.view_counts.read().await;
        view_counts.get(&listing_id).copied()
    }

    pub async fn logged(&self) -> Vec<Interaction> {
        let logged = self.logged.read().await;
        logged.clone()
    }
}

#[async_trait::async_trait]
impl InteractionRepository for InMemoryInteractionRepository {
    async fn log(
        &self,
        interaction: &NewInteraction,
        now: DateTime<Utc>,
    ) -> Result<LogOutcome, RepositoryError> {
        let mut view_counts = self.view_counts.write().await;
        let Some(count) = view_counts.get_mut(&interaction.listing_id) else {
            return Ok(LogOutcome::ListingMissing);
        };

        if interaction.kind == InteractionKind::View {
            *count += 1;
        }

        let mut logged = self.logged.write().await;
        let id = logged.len() as i64 + 1;
        logged.push(Interaction {
            id,
            user_id: interaction.user_id,
            listing_id: interaction.listing_id,
            kind: interaction.kind,
            ip_address: interaction.ip_address.clone(),
            created_at: now,
        });

        Ok(LogOutcome::Logged)
    }
}
