use chrono::Utc;

use crate::commands::CommandResult;
use kurbanlink_core::config::{AppConfig, LoadOptions};
use kurbanlink_core::recommendations::{
    RecommendationContext, RecommendationEngine, ScoredListing,
};
use kurbanlink_db::repositories::{ListingRepository, SqlListingRepository};
use kurbanlink_db::{connect, migrations};

pub fn run(
    city: Option<String>,
    district: Option<String>,
    limit: Option<i64>,
    user_id: Option<i64>,
) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "recommend",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "recommend",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let context =
        RecommendationContext { viewer_id: user_id, city, district, limit, exclude_ids: Vec::new() };
    let engine = RecommendationEngine::with_weights(config.recommendation.scoring_weights());
    let pool_limit = config.recommendation.candidate_pool_limit;

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let repository = SqlListingRepository::new(pool.clone());
        let candidates = repository
            .candidates(&context, pool_limit, Utc::now())
            .await
            .map_err(|error| ("candidate_query", error.to_string(), 6u8))?;

        let items = engine.recommend(&context, candidates);
        pool.close().await;
        Ok::<Vec<ScoredListing>, (&'static str, String, u8)>(items)
    });

    match result {
        Ok(items) if items.is_empty() => {
            CommandResult::success("recommend", "no listings matched the given context")
        }
        Ok(items) => CommandResult::success("recommend", render_items(&items)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("recommend", error_class, message, exit_code)
        }
    }
}

fn render_items(items: &[ScoredListing]) -> String {
    let mut lines = vec![format!("{} recommendation(s):", items.len())];

    for item in items {
        let reasons = item
            .reasons
            .iter()
            .map(|reason| reason.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let reasons = if reasons.is_empty() { "-".to_string() } else { reasons };
        lines.push(format!(
            "  #{} score={:.2} [{}] {} ({}, {})",
            item.listing.id,
            item.score,
            reasons,
            item.listing.title,
            item.listing.city,
            item.listing.district.as_deref().unwrap_or("-"),
        ));
    }

    lines.join("\n")
}
