use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use kurbanlink_core::config::{AppConfig, LoadOptions};
use toml::Value;

use super::CommandResult;

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let source = |key_path: &str, env_key: &str| {
        field_source(key_path, env_key, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "database.url",
        &config.database.url,
        source("database.url", "KURBANLINK_DATABASE_URL"),
    ));
    lines.push(render_line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        source("database.max_connections", "KURBANLINK_DATABASE_MAX_CONNECTIONS"),
    ));
    lines.push(render_line(
        "database.timeout_secs",
        &config.database.timeout_secs.to_string(),
        source("database.timeout_secs", "KURBANLINK_DATABASE_TIMEOUT_SECS"),
    ));

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        source("server.bind_address", "KURBANLINK_SERVER_BIND_ADDRESS"),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        source("server.port", "KURBANLINK_SERVER_PORT"),
    ));
    lines.push(render_line(
        "server.graceful_shutdown_secs",
        &config.server.graceful_shutdown_secs.to_string(),
        source("server.graceful_shutdown_secs", "KURBANLINK_SERVER_GRACEFUL_SHUTDOWN_SECS"),
    ));

    lines.push(render_line(
        "recommendation.candidate_pool_limit",
        &config.recommendation.candidate_pool_limit.to_string(),
        source(
            "recommendation.candidate_pool_limit",
            "KURBANLINK_RECOMMENDATION_CANDIDATE_POOL_LIMIT",
        ),
    ));
    lines.push(render_line(
        "recommendation.default_limit",
        &config.recommendation.default_limit.to_string(),
        source("recommendation.default_limit", "KURBANLINK_RECOMMENDATION_DEFAULT_LIMIT"),
    ));
    lines.push(render_line(
        "recommendation.max_limit",
        &config.recommendation.max_limit.to_string(),
        source("recommendation.max_limit", "KURBANLINK_RECOMMENDATION_MAX_LIMIT"),
    ));

    let weights = [
        ("recommendation.same_city_weight", config.recommendation.same_city_weight),
        ("recommendation.same_district_weight", config.recommendation.same_district_weight),
        ("recommendation.price_match_weight", config.recommendation.price_match_weight),
        ("recommendation.popularity_weight", config.recommendation.popularity_weight),
        ("recommendation.recency_weight", config.recommendation.recency_weight),
        (
            "recommendation.diversity_penalty_weight",
            config.recommendation.diversity_penalty_weight,
        ),
    ];
    for (key_path, weight) in weights {
        // Weights have no env aliases; they come from the file or defaults.
        lines.push(render_line(key_path, &format!("{weight:.2}"), source(key_path, "")));
    }

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", "KURBANLINK_LOGGING_LEVEL"),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", "KURBANLINK_LOGGING_FORMAT"),
    ));

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("kurbanlink.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/kurbanlink.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if !env_key.is_empty() && env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
