//! Types for the recommendation engine.

use serde::{Deserialize, Serialize};

use crate::domain::listing::ListingSummary;

/// Context for one recommendation request.
#[derive(Clone, Debug, Default)]
pub struct RecommendationContext {
    /// Authenticated viewer, if any. Their own listings are never returned.
    pub viewer_id: Option<i64>,
    /// Target city hint (usually the viewer's profile or geo lookup).
    pub city: Option<String>,
    /// Target district hint; only scored together with a city match.
    pub district: Option<String>,
    /// Requested result count before clamping.
    pub limit: Option<i64>,
    /// Listing ids the caller has already seen or shown.
    pub exclude_ids: Vec<i64>,
}

impl RecommendationContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_viewer(viewer_id: i64) -> Self {
        Self { viewer_id: Some(viewer_id), ..Self::default() }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_district(mut self, district: impl Into<String>) -> Self {
        self.district = Some(district.into());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_exclude_ids(mut self, ids: Vec<i64>) -> Self {
        self.exclude_ids = ids;
        self
    }
}

/// Machine-readable explanation attached to a scored result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonTag {
    SameCity,
    SameDistrict,
    Popular,
    NewListing,
}

impl ReasonTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SameCity => "SAME_CITY",
            Self::SameDistrict => "SAME_DISTRICT",
            Self::Popular => "POPULAR",
            Self::NewListing => "NEW_LISTING",
        }
    }
}

impl std::fmt::Display for ReasonTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate with its score and ordered reasons. Lives only for the
/// duration of one recommendation call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoredListing {
    pub listing: ListingSummary,
    pub score: f64,
    pub reasons: Vec<ReasonTag>,
}

#[cfg(test)]
mod tests {
    use super::{ReasonTag, RecommendationContext};

    #[test]
    fn reason_tags_serialize_as_screaming_snake_case() {
        let json = serde_json::to_string(&ReasonTag::SameDistrict).expect("serialize");
        assert_eq!(json, "\"SAME_DISTRICT\"");
        assert_eq!(ReasonTag::NewListing.as_str(), "NEW_LISTING");
    }

    #[test]
    fn context_builder_composes() {
        let context = RecommendationContext::for_viewer(7)
            .with_city("Ankara")
            .with_district("Kecioren")
            .with_limit(10)
            .with_exclude_ids(vec![1, 2]);

        assert_eq!(context.viewer_id, Some(7));
        assert_eq!(context.city.as_deref(), Some("Ankara"));
        assert_eq!(context.district.as_deref(), Some("Kecioren"));
        assert_eq!(context.limit, Some(10));
        assert_eq!(context.exclude_ids, vec![1, 2]);
    }
}
