use std::env;
use std::sync::{Mutex, OnceLock};

use intake_cli::commands::{config, doctor, migrate};
use serde_json::Value;
use tempfile::TempDir;

#[test]
fn migrate_returns_success_with_valid_env() {
    let dir = TempDir::new().expect("temp dir");
    let database_url = sqlite_url(&dir);

    let vars = [("INTAKE_API_KEY", "cli-key"), ("INTAKE_DATABASE_URL", database_url.as_str())];

    with_env(&vars, || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
        assert!(payload["message"].as_str().unwrap_or_default().contains("0 row(s)"));
    });
}

#[test]
fn migrate_returns_config_failure_without_api_key() {
    with_env(&[("INTAKE_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn config_redacts_secrets_and_attributes_env_sources() {
    with_env(
        &[
            ("INTAKE_API_KEY", "super-secret-key"),
            ("INTAKE_TELEGRAM_BOT_TOKEN", "424242:AAE-very-secret"),
            ("INTAKE_TELEGRAM_CHAT_ID", "-100123"),
            ("INTAKE_LOG_LEVEL", "debug"),
        ],
        || {
            let result = config::run();
            assert_eq!(result.exit_code, 0);

            let output = result.output;
            assert!(!output.contains("super-secret-key"));
            assert!(!output.contains("AAE-very-secret"));
            assert!(output.contains("- auth.api_key = <redacted> (source: env (INTAKE_API_KEY))"));
            assert!(output.contains("- notifier.telegram_bot_token = 424242:***"));
            assert!(output.contains("- notifier.telegram_chat_id = -100123"));
            assert!(output.contains("- logging.level = debug (source: env (INTAKE_LOG_LEVEL))"));
            assert!(output.contains("- server.port = 8080 (source: default)"));
        },
    );
}

#[test]
fn config_reports_validation_failure() {
    with_env(&[("INTAKE_API_KEY", "key"), ("INTAKE_TELEGRAM_CHAT_ID", "-100123")], || {
        let result = config::run();
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config_validation");
        assert!(payload["message"].as_str().unwrap_or_default().contains("telegram_bot_token"));
    });
}

#[test]
fn doctor_flags_missing_schema_until_migrated() {
    let dir = TempDir::new().expect("temp dir");
    let database_url = sqlite_url(&dir);

    let vars = [("INTAKE_API_KEY", "cli-key"), ("INTAKE_DATABASE_URL", database_url.as_str())];

    with_env(&vars, || {
        let before = doctor::run(true);
        assert_eq!(before.exit_code, 4, "schema should be missing: {}", before.output);
        let report = parse_payload(&before.output);
        assert_eq!(report["overall_status"], "fail");
        assert_eq!(check_status(&report, "database_schema"), "fail");
        assert_eq!(check_status(&report, "notifier_target"), "warn");

        assert_eq!(migrate::run().exit_code, 0);

        let after = doctor::run(true);
        assert_eq!(after.exit_code, 0, "doctor should pass after migrate: {}", after.output);
        let report = parse_payload(&after.output);
        assert_eq!(report["overall_status"], "pass");
        assert_eq!(check_status(&report, "config_validation"), "pass");
    });
}

#[test]
fn doctor_skips_runtime_checks_when_config_is_invalid() {
    with_env(&[], || {
        let result = doctor::run(false);
        assert_eq!(result.exit_code, 2);
        assert!(result.output.starts_with("doctor: one or more readiness checks failed"));
        assert!(result.output.contains("- [fail] config_validation:"));
        assert!(result.output.contains("- [skip] database_schema:"));
    });
}

fn sqlite_url(dir: &TempDir) -> String {
    format!("sqlite://{}", dir.path().join("intake.db").display())
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn check_status(report: &Value, name: &str) -> String {
    report["checks"]
        .as_array()
        .and_then(|checks| checks.iter().find(|check| check["name"] == name))
        .and_then(|check| check["status"].as_str())
        .unwrap_or_default()
        .to_string()
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "INTAKE_DATABASE_URL",
        "INTAKE_DATABASE_MAX_CONNECTIONS",
        "INTAKE_DATABASE_TIMEOUT_SECS",
        "INTAKE_SERVER_BIND_ADDRESS",
        "INTAKE_SERVER_PORT",
        "INTAKE_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "INTAKE_API_KEY",
        "INTAKE_TELEGRAM_BOT_TOKEN",
        "INTAKE_TELEGRAM_CHAT_ID",
        "INTAKE_TELEGRAM_API_BASE_URL",
        "INTAKE_NOTIFIER_TIMEOUT_SECS",
        "INTAKE_LOGGING_LEVEL",
        "INTAKE_LOGGING_FORMAT",
        "INTAKE_LOG_LEVEL",
        "INTAKE_LOG_FORMAT",
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
