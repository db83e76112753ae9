use std::env;
use std::sync::{Mutex, OnceLock};

use kurbanlink_cli::commands::{doctor, migrate, recommend, seed};
use serde_json::Value;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(
        &[
            ("KURBANLINK_DATABASE_URL", "sqlite::memory:"),
            ("KURBANLINK_DATABASE_MAX_CONNECTIONS", "1"),
        ],
        || {
            let result = migrate::run();
            assert_eq!(result.exit_code, 0, "expected successful migrate run");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "migrate");
            assert_eq!(payload["status"], "ok");
        },
    );
}

#[test]
fn migrate_returns_config_failure_with_invalid_database_url() {
    with_env(&[("KURBANLINK_DATABASE_URL", "postgres://not-sqlite")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let url = database_url(&dir);

    with_env(
        &[
            ("KURBANLINK_DATABASE_URL", &url),
            ("KURBANLINK_DATABASE_MAX_CONNECTIONS", "1"),
        ],
        || {
            let first = seed::run();
            assert_eq!(first.exit_code, 0, "expected first seed invocation success");
            let first_payload = parse_payload(&first.output);
            assert_eq!(first_payload["command"], "seed");
            assert_eq!(first_payload["status"], "ok");
            let message = first_payload["message"].as_str().unwrap_or("");
            assert!(message.contains("7 listings"));

            let second = seed::run();
            assert_eq!(second.exit_code, 0, "expected second seed invocation success");
            let second_payload = parse_payload(&second.output);
            assert_eq!(second_payload["status"], "ok");
            assert_eq!(first_payload["message"], second_payload["message"]);
        },
    );
}

#[test]
fn doctor_reports_pass_after_migrations() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let url = database_url(&dir);

    with_env(
        &[
            ("KURBANLINK_DATABASE_URL", &url),
            ("KURBANLINK_DATABASE_MAX_CONNECTIONS", "1"),
        ],
        || {
            let migrate_result = migrate::run();
            assert_eq!(migrate_result.exit_code, 0, "expected migrate success");

            let doctor_result = doctor::run(true);
            assert_eq!(doctor_result.exit_code, 0, "expected doctor success");
            let report: Value = serde_json::from_str(&doctor_result.output)
                .expect("doctor --json output should be valid JSON");
            assert_eq!(report["overall_status"], "pass");

            let checks = report["checks"].as_array().expect("checks array");
            let names: Vec<&str> =
                checks.iter().filter_map(|check| check["name"].as_str()).collect();
            assert_eq!(
                names,
                vec!["config_validation", "database_connectivity", "schema_readiness"]
            );
        },
    );
}

#[test]
fn doctor_flags_missing_schema() {
    with_env(
        &[
            ("KURBANLINK_DATABASE_URL", "sqlite::memory:"),
            ("KURBANLINK_DATABASE_MAX_CONNECTIONS", "1"),
        ],
        || {
            let doctor_result = doctor::run(true);
            assert_eq!(doctor_result.exit_code, 1, "expected doctor failure exit code");
            let report: Value = serde_json::from_str(&doctor_result.output)
                .expect("doctor --json output should be valid JSON");
            assert_eq!(report["overall_status"], "fail");

            let schema_check = report["checks"]
                .as_array()
                .and_then(|checks| {
                    checks.iter().find(|check| check["name"] == "schema_readiness")
                })
                .expect("schema readiness check");
            assert_eq!(schema_check["status"], "fail");
            assert!(schema_check["details"]
                .as_str()
                .unwrap_or("")
                .contains("kurbanlink migrate"));
        },
    );
}

#[test]
fn recommend_ranks_the_seeded_listings() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let url = database_url(&dir);

    with_env(
        &[
            ("KURBANLINK_DATABASE_URL", &url),
            ("KURBANLINK_DATABASE_MAX_CONNECTIONS", "1"),
        ],
        || {
            let seed_result = seed::run();
            assert_eq!(seed_result.exit_code, 0, "expected seed success");

            let result = recommend::run(Some("Ankara".to_string()), None, Some(3), None);
            assert_eq!(result.exit_code, 0, "expected recommend success");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "recommend");
            assert_eq!(payload["status"], "ok");

            let message = payload["message"].as_str().unwrap_or("");
            assert!(message.starts_with("3 recommendation(s):"));
            assert!(message.contains("SAME_CITY"));
            assert!(!message.contains("Satilmis Koc"), "sold listing must never surface");
        },
    );
}

#[test]
fn recommend_with_no_matches_is_a_clean_success() {
    with_env(
        &[
            ("KURBANLINK_DATABASE_URL", "sqlite::memory:"),
            ("KURBANLINK_DATABASE_MAX_CONNECTIONS", "1"),
        ],
        || {
            let result = recommend::run(Some("Ankara".to_string()), None, None, None);
            assert_eq!(result.exit_code, 0, "expected recommend success on empty database");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["status"], "ok");
            assert_eq!(payload["message"], "no listings matched the given context");
        },
    );
}

fn database_url(dir: &tempfile::TempDir) -> String {
    format!("sqlite://{}?mode=rwc", dir.path().join("kurbanlink.db").display())
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "KURBANLINK_DATABASE_URL",
        "KURBANLINK_DATABASE_MAX_CONNECTIONS",
        "KURBANLINK_DATABASE_TIMEOUT_SECS",
        "KURBANLINK_SERVER_BIND_ADDRESS",
        "KURBANLINK_SERVER_PORT",
        "KURBANLINK_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "KURBANLINK_RECOMMENDATION_CANDIDATE_POOL_LIMIT",
        "KURBANLINK_RECOMMENDATION_DEFAULT_LIMIT",
        "KURBANLINK_RECOMMENDATION_MAX_LIMIT",
        "KURBANLINK_LOGGING_LEVEL",
        "KURBANLINK_LOGGING_FORMAT",
        "KURBANLINK_LOG_LEVEL",
        "KURBANLINK_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
