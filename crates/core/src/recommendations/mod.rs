//! Rule-based listing recommendation engine.
//!
//! Candidate generation happens in the storage layer (bounded pool of active
//! listings); this module owns the pure part: weighted scoring with reason
//! tags, the seller-diversity penalty pass, and result assembly.

mod engine;
mod scoring;
mod types;

pub use engine::RecommendationEngine;
pub use scoring::{ScoreCalculator, ScoringWeights};
pub use types::*;

/// Default scoring weights. The positive factors sum to 0.80 plus the
/// reserved price-match weight of 0.20; the diversity penalty is applied in
/// a separate pass and is not part of the sum.
pub const DEFAULT_WEIGHTS: ScoringWeights = ScoringWeights {
    same_city: 0.30,
    same_district: 0.15,
    price_match: 0.20,
    popularity: 0.10,
    recency: 0.05,
    diversity_penalty: 0.10,
};

/// Hard cap on the candidate pool handed to the scorer. Bounds scoring cost;
/// a precision/recall trade-off rather than a correctness requirement.
pub const CANDIDATE_POOL_LIMIT: u32 = 200;

/// Result limit applied when the caller does not ask for one.
pub const DEFAULT_RESULT_LIMIT: u32 = 20;

/// Hard ceiling on the result limit.
pub const MAX_RESULT_LIMIT: u32 = 50;

/// A listing created within this many days counts as new (NEW_LISTING tag).
pub const NEW_LISTING_WINDOW_DAYS: i64 = 7;

/// View count at which the popularity contribution saturates.
pub const POPULARITY_VIEW_SCALE: f64 = 100.0;

/// The POPULAR tag is emitted only when the popularity contribution exceeds
/// this value; the contribution itself is always added.
pub const POPULAR_TAG_THRESHOLD: f64 = 0.05;

/// With a known target city, out-of-city listings still qualify as
/// candidates when created within this window.
pub const CITY_RECENCY_WINDOW_DAYS: i64 = 30;

/// Without a city hint, candidates are recency-only within this window.
pub const FALLBACK_RECENCY_WINDOW_DAYS: i64 = 60;
