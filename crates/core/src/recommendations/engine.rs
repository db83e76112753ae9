//! Recommendation engine implementation.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::domain::listing::ListingSummary;

use super::scoring::{sort_descending, ScoreCalculator, ScoringWeights};
use super::types::{RecommendationContext, ScoredListing};
use super::{DEFAULT_RESULT_LIMIT, MAX_RESULT_LIMIT};

/// Scores a bounded candidate pool, applies the seller-diversity pass and
/// returns the ranked, capped result. Pure compute: candidate generation and
/// interaction logging live in the storage layer.
#[derive(Clone, Debug, Default)]
pub struct RecommendationEngine {
    calculator: ScoreCalculator,
}

impl RecommendationEngine {
    pub fn new() -> Self {
        Self { calculator: ScoreCalculator::new() }
    }

    pub fn with_weights(weights: ScoringWeights) -> Self {
        Self { calculator: ScoreCalculator::with_weights(weights) }
    }

    /// Clamp a requested result count to `1..=MAX_RESULT_LIMIT`. Absent
    /// means the default; zero or negative clamps silently to 1.
    pub fn clamp_limit(requested: Option<i64>) -> usize {
        match requested {
            None => DEFAULT_RESULT_LIMIT as usize,
            Some(value) if value < 1 => 1,
            Some(value) => value.min(i64::from(MAX_RESULT_LIMIT)) as usize,
        }
    }

    pub fn recommend(
        &self,
        context: &RecommendationContext,
        candidates: Vec<ListingSummary>,
    ) -> Vec<ScoredListing> {
        self.recommend_at(context, candidates, Utc::now())
    }

    /// Same as [`recommend`](Self::recommend) with an explicit clock, so
    /// recency behavior is reproducible in tests.
    pub fn recommend_at(
        &self,
        context: &RecommendationContext,
        candidates: Vec<ListingSummary>,
        now: DateTime<Utc>,
    ) -> Vec<ScoredListing> {
        let excluded: HashSet<i64> = context.exclude_ids.iter().copied().collect();

        // The candidate query already enforces these, but the invariants hold
        // for any store implementation the engine is wired to.
        let eligible = candidates.into_iter().filter(|listing| {
            listing.is_active
                && context.viewer_id != Some(listing.seller_id)
                && !excluded.contains(&listing.id)
        });

        let mut scored: Vec<ScoredListing> = eligible
            .map(|listing| {
                let (score, reasons) = self.calculator.score_listing(
                    &listing,
                    context.city.as_deref(),
                    context.district.as_deref(),
                    now,
                );
                ScoredListing { listing, score, reasons }
            })
            .collect();

        sort_descending(&mut scored);
        self.calculator.apply_seller_diversity(&mut scored);
        scored.truncate(Self::clamp_limit(context.limit));
        scored
    }
}
