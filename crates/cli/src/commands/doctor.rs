use intake_core::config::{AppConfig, LoadOptions};
use intake_db::{connect_with_config, migrations};
use serde::Serialize;

use crate::commands::{current_thread_runtime, CommandResult, EXIT_CONFIG, EXIT_DATABASE};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Warn,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = exit_code_for(&report);

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult::raw(exit_code, output)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_notifier_target(&config));
            checks.push(check_database(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["notifier_target", "database_schema"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let failed = checks
        .iter()
        .any(|check| matches!(check.status, CheckStatus::Fail | CheckStatus::Skipped));
    let overall_status = if failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

/// An unconfigured notifier is a warning: orders are still accepted, they
/// just are not relayed anywhere.
fn check_notifier_target(config: &AppConfig) -> DoctorCheck {
    match intake_notify::from_config(&config.notifier) {
        Ok(notifier) if notifier.is_noop() => DoctorCheck {
            name: "notifier_target",
            status: CheckStatus::Warn,
            details: "no telegram target configured; notifications are skipped".to_string(),
        },
        Ok(notifier) => DoctorCheck {
            name: "notifier_target",
            status: CheckStatus::Pass,
            details: format!(
                "{} sink via {} (timeout {}s)",
                notifier.sink_name(),
                config.notifier.api_base_url,
                config.notifier.timeout_secs
            ),
        },
        Err(error) => DoctorCheck {
            name: "notifier_target",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_database(config: &AppConfig) -> DoctorCheck {
    let runtime = match current_thread_runtime() {
        Ok(runtime) => runtime,
        Err(details) => {
            return DoctorCheck { name: "database_schema", status: CheckStatus::Fail, details };
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| format!("failed to connect to database: {error}"))?;

        let table_count = migrations::orders_table_count(&pool)
            .await
            .map_err(|error| format!("schema lookup failed: {error}"));
        pool.close().await;
        table_count
    });

    match result {
        Ok(1) => DoctorCheck {
            name: "database_schema",
            status: CheckStatus::Pass,
            details: format!("orders table present at `{}`", config.database.url),
        },
        Ok(_) => DoctorCheck {
            name: "database_schema",
            status: CheckStatus::Fail,
            details: "connected, but the orders table is missing; run `intake migrate`".to_string(),
        },
        Err(details) => DoctorCheck { name: "database_schema", status: CheckStatus::Fail, details },
    }
}

fn exit_code_for(report: &DoctorReport) -> u8 {
    let failed = |name: &str| {
        report.checks.iter().any(|check| check.name == name && check.status == CheckStatus::Fail)
    };

    if failed("config_validation") || failed("notifier_target") {
        EXIT_CONFIG
    } else if failed("database_schema") {
        EXIT_DATABASE
    } else {
        0
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
