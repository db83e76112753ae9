//! HTTP surface for listing recommendations and interaction logging.

use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use kurbanlink_core::config::RecommendationConfig;
use kurbanlink_core::domain::interaction::{InteractionKind, NewInteraction};
use kurbanlink_core::errors::{ApplicationError, InterfaceError};
use kurbanlink_core::recommendations::{RecommendationContext, RecommendationEngine, ScoredListing};
use kurbanlink_db::repositories::{
    InteractionRepository, ListingRepository, LogOutcome, SqlInteractionRepository,
    SqlListingRepository,
};
use kurbanlink_db::DbPool;

#[derive(Clone)]
pub struct RecommendationState {
    db_pool: DbPool,
    engine: RecommendationEngine,
    pool_limit: u32,
}

impl RecommendationState {
    pub fn new(db_pool: DbPool, config: &RecommendationConfig) -> Self {
        Self {
            db_pool,
            engine: RecommendationEngine::with_weights(config.scoring_weights()),
            pool_limit: config.candidate_pool_limit,
        }
    }
}

pub fn router(state: RecommendationState) -> Router {
    Router::new()
        .route("/api/recommendations/listings", get(list_recommendations))
        .route("/api/recommendations/interactions", post(log_interaction))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub struct ListingsQuery {
    pub city: Option<String>,
    pub district: Option<String>,
    pub limit: Option<i64>,
    pub exclude_ids: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub items: Vec<ScoredListing>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub correlation_id: String,
}

pub async fn list_recommendations(
    State(state): State<RecommendationState>,
    headers: HeaderMap,
    Query(query): Query<ListingsQuery>,
) -> Result<Json<RecommendationsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let correlation_id = Uuid::new_v4().to_string();

    let context = RecommendationContext {
        viewer_id: viewer_from_headers(&headers),
        city: normalize(query.city),
        district: normalize(query.district),
        limit: query.limit,
        exclude_ids: parse_exclude_ids(query.exclude_ids.as_deref().unwrap_or("")),
    };

    let repository = SqlListingRepository::new(state.db_pool.clone());
    let candidates = repository
        .candidates(&context, state.pool_limit, Utc::now())
        .await
        .map_err(|error| persistence_reply(error.to_string(), &correlation_id))?;

    let items = state.engine.recommend(&context, candidates);
    tracing::info!(
        event_name = "recommendations.listings.served",
        correlation_id = %correlation_id,
        city = context.city.as_deref().unwrap_or("-"),
        item_count = items.len(),
        "recommendations served"
    );

    Ok(Json(RecommendationsResponse { items }))
}

#[derive(Debug, Deserialize)]
pub struct InteractionRequest {
    pub listing: Option<i64>,
    pub interaction_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InteractionLogged {
    pub status: &'static str,
}

#[derive(Debug)]
pub enum InteractionReject {
    Validation(BTreeMap<&'static str, String>),
    Unavailable(ErrorResponse),
}

impl IntoResponse for InteractionReject {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "errors": errors })),
            )
                .into_response(),
            Self::Unavailable(body) => {
                (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
            }
        }
    }
}

pub async fn log_interaction(
    State(state): State<RecommendationState>,
    headers: HeaderMap,
    Json(request): Json<InteractionRequest>,
) -> Result<(StatusCode, Json<InteractionLogged>), InteractionReject> {
    let correlation_id = Uuid::new_v4().to_string();
    let interaction = validate_interaction(&request, &headers)?;

    let repository = SqlInteractionRepository::new(state.db_pool.clone());
    let outcome = repository.log(&interaction, Utc::now()).await.map_err(|error| {
        let interface = ApplicationError::Persistence(error.to_string())
            .into_interface(correlation_id.clone());
        tracing::error!(
            event_name = "recommendations.interactions.failed",
            correlation_id = %correlation_id,
            listing_id = interaction.listing_id,
            error = %interface,
            "interaction logging failed"
        );
        InteractionReject::Unavailable(ErrorResponse {
            error: interface.user_message(),
            correlation_id: correlation_id.clone(),
        })
    })?;

    match outcome {
        LogOutcome::Logged => {
            tracing::info!(
                event_name = "recommendations.interactions.logged",
                correlation_id = %correlation_id,
                listing_id = interaction.listing_id,
                kind = interaction.kind.as_str(),
                "interaction logged"
            );
        }
        LogOutcome::ListingMissing => {
            // Listings get unpublished while a card is still on screen; the
            // client cannot act on this, so it is not surfaced as an error.
            tracing::debug!(
                event_name = "recommendations.interactions.listing_missing",
                correlation_id = %correlation_id,
                listing_id = interaction.listing_id,
                "interaction against a missing listing dropped"
            );
        }
    }

    Ok((StatusCode::CREATED, Json(InteractionLogged { status: "logged" })))
}

fn validate_interaction(
    request: &InteractionRequest,
    headers: &HeaderMap,
) -> Result<NewInteraction, InteractionReject> {
    let mut errors: BTreeMap<&'static str, String> = BTreeMap::new();

    let listing_id = match request.listing {
        Some(id) if id > 0 => Some(id),
        Some(_) => {
            errors.insert("listing", "must be a positive integer".to_string());
            None
        }
        None => {
            errors.insert("listing", "this field is required".to_string());
            None
        }
    };

    let kind = match request.interaction_type.as_deref() {
        Some(value) => match value.parse::<InteractionKind>() {
            Ok(kind) => Some(kind),
            Err(_) => {
                errors.insert(
                    "interaction_type",
                    "must be one of VIEW, PHONE_CLICK, WHATSAPP_CLICK, FAVORITE".to_string(),
                );
                None
            }
        },
        None => {
            errors.insert("interaction_type", "this field is required".to_string());
            None
        }
    };

    match (listing_id, kind) {
        (Some(listing_id), Some(kind)) if errors.is_empty() => Ok(NewInteraction {
            user_id: viewer_from_headers(headers),
            listing_id,
            kind,
            ip_address: client_ip(headers),
        }),
        _ => Err(InteractionReject::Validation(errors)),
    }
}

/// The viewer identity is injected by the edge proxy after authentication;
/// a missing or malformed header means an anonymous request.
fn viewer_from_headers(headers: &HeaderMap) -> Option<i64> {
    headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<i64>().ok())
}

/// First entry of `x-forwarded-for` when present, else `x-real-ip`.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    match forwarded {
        Some(address) => Some(address.to_string()),
        None => headers
            .get("x-real-ip")
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(String::from),
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value.map(|inner| inner.trim().to_string()).filter(|inner| !inner.is_empty())
}

/// Comma-separated ids; malformed tokens are dropped rather than rejected.
fn parse_exclude_ids(raw: &str) -> Vec<i64> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| token.parse::<i64>().ok())
        .collect()
}

fn persistence_reply(
    detail: String,
    correlation_id: &str,
) -> (StatusCode, Json<ErrorResponse>) {
    let interface: InterfaceError =
        ApplicationError::Persistence(detail).into_interface(correlation_id.to_string());
    tracing::error!(
        event_name = "recommendations.listings.failed",
        correlation_id = %correlation_id,
        error = %interface,
        "candidate query failed"
    );
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse {
            error: interface.user_message(),
            correlation_id: correlation_id.to_string(),
        }),
    )
}
