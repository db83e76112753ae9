pub mod config;
pub mod domain;
pub mod errors;
pub mod recommendations;

pub use domain::interaction::{Interaction, InteractionKind, NewInteraction};
pub use domain::listing::ListingSummary;
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use recommendations::{
    ReasonTag, RecommendationContext, RecommendationEngine, ScoreCalculator, ScoredListing,
    ScoringWeights,
};
