use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Projection of a listing as the recommendation surface sees it.
///
/// This is read-only data for the engine; the listing lifecycle (creation,
/// editing, deactivation) belongs to the marketplace CRUD surface, not here.
/// `view_count` is the denormalized popularity signal bumped by VIEW
/// interactions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListingSummary {
    pub id: i64,
    pub seller_id: i64,
    pub title: String,
    pub animal_type: String,
    pub price: f64,
    pub city: String,
    pub district: Option<String>,
    pub view_count: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ListingSummary {
    /// Case-insensitive city match.
    pub fn in_city(&self, city: &str) -> bool {
        self.city.eq_ignore_ascii_case(city.trim())
    }

    /// Case-insensitive district match. Only meaningful alongside a city
    /// match; the scorer enforces that pairing.
    pub fn in_district(&self, district: &str) -> bool {
        self.district
            .as_deref()
            .map(|own| own.eq_ignore_ascii_case(district.trim()))
            .unwrap_or(false)
    }
}
