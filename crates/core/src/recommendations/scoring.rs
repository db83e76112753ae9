//! Scoring and re-ranking for listing recommendations.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::domain::listing::ListingSummary;

use super::types::{ReasonTag, ScoredListing};
use super::{NEW_LISTING_WINDOW_DAYS, POPULARITY_VIEW_SCALE, POPULAR_TAG_THRESHOLD};

/// Weights for the scoring factors. Immutable once constructed; tests
/// substitute alternate sets through [`ScoreCalculator::with_weights`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoringWeights {
    /// Candidate city equals the target city (default: 0.30).
    pub same_city: f64,
    /// District also matches, on top of the city match (default: 0.15).
    pub same_district: f64,
    /// Reserved for price-history comparison; contributes nothing yet
    /// (default: 0.20).
    pub price_match: f64,
    /// Scaled linearly by view count (default: 0.10).
    pub popularity: f64,
    /// Candidate created within the last 7 days (default: 0.05).
    pub recency: f64,
    /// Per-repeat penalty for a seller already present in the ranking
    /// (default: 0.10). Applied in a separate pass, not part of the sum.
    pub diversity_penalty: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        super::DEFAULT_WEIGHTS
    }
}

/// Score calculator for listing candidates.
#[derive(Clone, Debug)]
pub struct ScoreCalculator {
    weights: ScoringWeights,
}

impl ScoreCalculator {
    pub fn new() -> Self {
        Self { weights: ScoringWeights::default() }
    }

    pub fn with_weights(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score one candidate against the target location. Returns the raw
    /// weighted sum (not normalized, never negative here) and the ordered
    /// reason tags.
    pub fn score_listing(
        &self,
        listing: &ListingSummary,
        city: Option<&str>,
        district: Option<&str>,
        now: DateTime<Utc>,
    ) -> (f64, Vec<ReasonTag>) {
        let mut score = 0.0;
        let mut reasons = Vec::new();

        if let Some(city) = city {
            if listing.in_city(city) {
                score += self.weights.same_city;
                reasons.push(ReasonTag::SameCity);

                // District only counts on top of a city match.
                if let Some(district) = district {
                    if listing.in_district(district) {
                        score += self.weights.same_district;
                        reasons.push(ReasonTag::SameDistrict);
                    }
                }
            }
        }

        // Price match is a reserved factor: the weight exists so the
        // published table stays truthful, but no formula is applied yet.

        let popularity = self.popularity_contribution(listing.view_count);
        score += popularity;
        if popularity > POPULAR_TAG_THRESHOLD {
            reasons.push(ReasonTag::Popular);
        }

        if now - listing.created_at <= Duration::days(NEW_LISTING_WINDOW_DAYS) {
            score += self.weights.recency;
            reasons.push(ReasonTag::NewListing);
        }

        (score, reasons)
    }

    /// Linear popularity scaling, saturating at `POPULARITY_VIEW_SCALE` views.
    pub fn popularity_contribution(&self, view_count: i64) -> f64 {
        let scaled = (view_count.max(0) as f64 / POPULARITY_VIEW_SCALE).min(1.0);
        scaled * self.weights.popularity
    }

    /// Suppress over-representation of a single seller.
    ///
    /// Expects `scored` sorted descending by score. One pass in that order:
    /// the k-th occurrence of a seller (k counted from 0 before increment)
    /// loses `diversity_penalty * k`, floored at 0.0. Afterwards one stable
    /// re-sort descending. The penalty is fixed by the original position and
    /// never recomputed against the new order.
    pub fn apply_seller_diversity(&self, scored: &mut [ScoredListing]) {
        let mut seen_per_seller: HashMap<i64, u32> = HashMap::new();

        for candidate in scored.iter_mut() {
            let occurrences = seen_per_seller.entry(candidate.listing.seller_id).or_insert(0);
            let penalty = self.weights.diversity_penalty * f64::from(*occurrences);
            candidate.score = (candidate.score - penalty).max(0.0);
            *occurrences += 1;
        }

        sort_descending(scored);
    }
}

impl Default for ScoreCalculator {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable descending sort by score. Equal scores keep their relative order
/// from the previous stage, which makes scenario outputs deterministic.
pub fn sort_descending(scored: &mut [ScoredListing]) {
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
}
