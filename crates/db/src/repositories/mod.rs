use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use kurbanlink_core::domain::interaction::NewInteraction;
use kurbanlink_core::domain::listing::ListingSummary;
use kurbanlink_core::recommendations::RecommendationContext;

pub mod interaction;
pub mod listing;
pub mod memory;

pub use interaction::SqlInteractionRepository;
pub use listing::SqlListingRepository;
pub use memory::{InMemoryInteractionRepository, InMemoryListingRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Result of logging an interaction. A missing listing is reported, not an
/// error: callers treat it as a silent no-op.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogOutcome {
    Logged,
    ListingMissing,
}

/// Candidate generation for the recommendation engine. Implementations
/// return at most `pool_limit` active listings, newest first, already
/// filtered by the context's viewer, exclusions, and recency windows.
#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn candidates(
        &self,
        context: &RecommendationContext,
        pool_limit: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<ListingSummary>, RepositoryError>;
}

#[async_trait]
pub trait InteractionRepository: Send + Sync {
    /// Persist one interaction. A VIEW also increments the listing's view
    /// count in the same transaction.
    async fn log(
        &self,
        interaction: &NewInteraction,
        now: DateTime<Utc>,
    ) -> Result<LogOutcome, RepositoryError>;
}
