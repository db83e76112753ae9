use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Kind of user action logged against a listing.
///
/// Interactions are append-only telemetry. VIEW additionally bumps the
/// listing's denormalized view counter, which feeds popularity scoring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InteractionKind {
    View,
    PhoneClick,
    WhatsappClick,
    Favorite,
}

impl InteractionKind {
    pub const ALL: [InteractionKind; 4] =
        [Self::View, Self::PhoneClick, Self::WhatsappClick, Self::Favorite];

    /// Canonical wire/storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "VIEW",
            Self::PhoneClick => "PHONE_CLICK",
            Self::WhatsappClick => "WHATSAPP_CLICK",
            Self::Favorite => "FAVORITE",
        }
    }
}

impl std::fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InteractionKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "VIEW" => Ok(Self::View),
            "PHONE_CLICK" => Ok(Self::PhoneClick),
            "WHATSAPP_CLICK" => Ok(Self::WhatsappClick),
            "FAVORITE" => Ok(Self::Favorite),
            other => Err(DomainError::UnknownInteractionKind { value: other.to_string() }),
        }
    }
}

/// An interaction about to be recorded. `user_id` is absent for anonymous
/// viewers; `ip_address` is whatever the transport layer could derive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewInteraction {
    pub user_id: Option<i64>,
    pub listing_id: i64,
    pub kind: InteractionKind,
    pub ip_address: Option<String>,
}

/// A persisted interaction row. Never mutated or deleted after creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: i64,
    pub user_id: Option<i64>,
    pub listing_id: i64,
    pub kind: InteractionKind,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}
