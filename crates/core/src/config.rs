use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::recommendations::{
    ScoringWeights, CANDIDATE_POOL_LIMIT, DEFAULT_RESULT_LIMIT, DEFAULT_WEIGHTS, MAX_RESULT_LIMIT,
};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub recommendation: RecommendationConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

/// Engine tuning. Weights default to the published constants; operators can
/// rebalance them without a rebuild, and tests substitute alternates.
#[derive(Clone, Debug)]
pub struct RecommendationConfig {
    pub candidate_pool_limit: u32,
    pub default_limit: u32,
    pub max_limit: u32,
    pub same_city_weight: f64,
    pub same_district_weight: f64,
    pub price_match_weight: f64,
    pub popularity_weight: f64,
    pub recency_weight: f64,
    pub diversity_penalty_weight: f64,
}

impl RecommendationConfig {
    pub fn scoring_weights(&self) -> ScoringWeights {
        ScoringWeights {
            same_city: self.same_city_weight,
            same_district: self.same_district_weight,
            price_match: self.price_match_weight,
            popularity: self.popularity_weight,
            recency: self.recency_weight,
            diversity_penalty: self.diversity_penalty_weight,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub server_port: Option<u16>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://kurbanlink.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            recommendation: RecommendationConfig {
                candidate_pool_limit: CANDIDATE_POOL_LIMIT,
                default_limit: DEFAULT_RESULT_LIMIT,
                max_limit: MAX_RESULT_LIMIT,
                same_city_weight: DEFAULT_WEIGHTS.same_city,
                same_district_weight: DEFAULT_WEIGHTS.same_district,
                price_match_weight: DEFAULT_WEIGHTS.price_match,
                popularity_weight: DEFAULT_WEIGHTS.popularity,
                recency_weight: DEFAULT_WEIGHTS.recency,
                diversity_penalty_weight: DEFAULT_WEIGHTS.diversity_penalty,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    /// Load precedence: defaults, then config file, then `KURBANLINK_*`
    /// environment variables, then programmatic overrides. Validation runs
    /// on the final result.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from("kurbanlink.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(recommendation) = patch.recommendation {
            if let Some(candidate_pool_limit) = recommendation.candidate_pool_limit {
                self.recommendation.candidate_pool_limit = candidate_pool_limit;
            }
            if let Some(default_limit) = recommendation.default_limit {
                self.recommendation.default_limit = default_limit;
            }
            if let Some(max_limit) = recommendation.max_limit {
                self.recommendation.max_limit = max_limit;
            }
            if let Some(weight) = recommendation.same_city_weight {
                self.recommendation.same_city_weight = weight;
            }
            if let Some(weight) = recommendation.same_district_weight {
                self.recommendation.same_district_weight = weight;
            }
            if let Some(weight) = recommendation.price_match_weight {
                self.recommendation.price_match_weight = weight;
            }
            if let Some(weight) = recommendation.popularity_weight {
                self.recommendation.popularity_weight = weight;
            }
            if let Some(weight) = recommendation.recency_weight {
                self.recommendation.recency_weight = weight;
            }
            if let Some(weight) = recommendation.diversity_penalty_weight {
                self.recommendation.diversity_penalty_weight = weight;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("KURBANLINK_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("KURBANLINK_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("KURBANLINK_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("KURBANLINK_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("KURBANLINK_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("KURBANLINK_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("KURBANLINK_SERVER_PORT") {
            self.server.port = parse_u16("KURBANLINK_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("KURBANLINK_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("KURBANLINK_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("KURBANLINK_RECOMMENDATION_CANDIDATE_POOL_LIMIT") {
            self.recommendation.candidate_pool_limit =
                parse_u32("KURBANLINK_RECOMMENDATION_CANDIDATE_POOL_LIMIT", &value)?;
        }
        if let Some(value) = read_env("KURBANLINK_RECOMMENDATION_DEFAULT_LIMIT") {
            self.recommendation.default_limit =
                parse_u32("KURBANLINK_RECOMMENDATION_DEFAULT_LIMIT", &value)?;
        }
        if let Some(value) = read_env("KURBANLINK_RECOMMENDATION_MAX_LIMIT") {
            self.recommendation.max_limit =
                parse_u32("KURBANLINK_RECOMMENDATION_MAX_LIMIT", &value)?;
        }

        let log_level =
            read_env("KURBANLINK_LOGGING_LEVEL").or_else(|| read_env("KURBANLINK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("KURBANLINK_LOGGING_FORMAT").or_else(|| read_env("KURBANLINK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(server_port) = overrides.server_port {
            self.server.port = server_port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_recommendation(&self.recommendation)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("kurbanlink.toml"), PathBuf::from("config/kurbanlink.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_recommendation(recommendation: &RecommendationConfig) -> Result<(), ConfigError> {
    if recommendation.candidate_pool_limit == 0 || recommendation.candidate_pool_limit > 1000 {
        return Err(ConfigError::Validation(
            "recommendation.candidate_pool_limit must be in range 1..=1000".to_string(),
        ));
    }

    if recommendation.max_limit == 0 || recommendation.max_limit > 200 {
        return Err(ConfigError::Validation(
            "recommendation.max_limit must be in range 1..=200".to_string(),
        ));
    }

    if recommendation.default_limit == 0
        || recommendation.default_limit > recommendation.max_limit
    {
        return Err(ConfigError::Validation(
            "recommendation.default_limit must be in range 1..=max_limit".to_string(),
        ));
    }

    let weights = [
        ("same_city_weight", recommendation.same_city_weight),
        ("same_district_weight", recommendation.same_district_weight),
        ("price_match_weight", recommendation.price_match_weight),
        ("popularity_weight", recommendation.popularity_weight),
        ("recency_weight", recommendation.recency_weight),
        ("diversity_penalty_weight", recommendation.diversity_penalty_weight),
    ];
    for (name, weight) in weights {
        if !(0.0..=1.0).contains(&weight) {
            return Err(ConfigError::Validation(format!(
                "recommendation.{name} must be in range 0.0..=1.0"
            )));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    recommendation: Option<RecommendationPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendationPatch {
    candidate_pool_limit: Option<u32>,
    default_limit: Option<u32>,
    max_limit: Option<u32>,
    same_city_weight: Option<f64>,
    same_district_weight: Option<f64>,
    price_match_weight: Option<f64>,
    popularity_weight: Option<f64>,
    recency_weight: Option<f64>,
    diversity_penalty_weight: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_match_the_published_engine_constants() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.recommendation.candidate_pool_limit == 200, "pool limit should be 200")?;
        ensure(config.recommendation.default_limit == 20, "default limit should be 20")?;
        ensure(config.recommendation.max_limit == 50, "max limit should be 50")?;

        let weights = config.recommendation.scoring_weights();
        ensure((weights.same_city - 0.30).abs() < 1e-12, "same_city weight should be 0.30")?;
        ensure(
            (weights.diversity_penalty - 0.10).abs() < 1e-12,
            "diversity penalty should be 0.10",
        )?;
        Ok(())
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_KURBANLINK_DB", "sqlite://interpolated.db");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("kurbanlink.toml");
            fs::write(
                &path,
                r#"
[database]
url = "${TEST_KURBANLINK_DB}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://interpolated.db",
                "database url should be interpolated from environment",
            )
        })();

        clear_vars(&["TEST_KURBANLINK_DB"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("KURBANLINK_LOG_LEVEL", "warn");
        env::set_var("KURBANLINK_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warn log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["KURBANLINK_LOG_LEVEL", "KURBANLINK_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("KURBANLINK_DATABASE_URL", "sqlite://from-env.db");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("kurbanlink.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            Ok(())
        })();

        clear_vars(&["KURBANLINK_DATABASE_URL"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("KURBANLINK_DATABASE_URL", "postgres://not-sqlite");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("database.url")
            );
            ensure(has_message, "validation failure should mention database.url")
        })();

        clear_vars(&["KURBANLINK_DATABASE_URL"]);
        result
    }

    #[test]
    fn weight_patch_outside_unit_interval_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("kurbanlink.toml");
        fs::write(
            &path,
            r#"
[recommendation]
same_city_weight = 1.5
"#,
        )
        .map_err(|err| err.to_string())?;

        let error =
            match AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
            {
                Ok(_) => return Err("expected weight validation failure".to_string()),
                Err(error) => error,
            };

        ensure(
            matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("same_city_weight")
            ),
            "validation failure should mention same_city_weight",
        )
    }
}
