//! # Structured Logging Module
//!
//! Environment-aware console logging using the tracing ecosystem. Logs go to
//! stdout, as plain text (ANSI colours when attached to a TTY) or as JSON when
//! `TASKLIST_LOG_FORMAT=json`.
//!
//! Every engine log line carries `correlation_id` as its first field so a bulk
//! request can be followed from request validation through each element.

use chrono::Utc;
use std::io::IsTerminal;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::bulk::BatchSummary;
use crate::constants::OperationFamily;
use crate::error::EntityKind;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
///
/// Safe to call more than once; only the first call installs a subscriber, and
/// an already-installed global subscriber is left in place.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);
        let use_json = std::env::var("TASKLIST_LOG_FORMAT")
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let use_ansi = IsTerminal::is_terminal(&std::io::stdout());

        let console_layer = if use_json {
            fmt::layer()
                .json()
                .with_target(true)
                .with_level(true)
                .with_filter(EnvFilter::new(&log_level))
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(use_ansi)
                .with_filter(EnvFilter::new(&log_level))
                .boxed()
        };

        if tracing_subscriber::registry()
            .with(console_layer)
            .try_init()
            .is_err()
        {
            tracing::debug!(
                "Global tracing subscriber already initialized - continuing with existing subscriber"
            );
        } else {
            tracing::info!(
                environment = %environment,
                log_level = %log_level,
                json = use_json,
                "Structured logging initialized"
            );
        }
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("TASKLIST_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level, `RUST_LOG` taking precedence over the environment default
fn get_log_level(environment: &str) -> String {
    level_for(environment, std::env::var("RUST_LOG").ok())
}

fn level_for(environment: &str, rust_log: Option<String>) -> String {
    if let Some(level) = rust_log.filter(|level| !level.trim().is_empty()) {
        return level.to_lowercase();
    }

    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log the outcome of a completed bulk operation
pub fn log_batch_summary(
    correlation_id: &str,
    entity: EntityKind,
    family: OperationFamily,
    summary: &BatchSummary,
    status: u16,
    duration_ms: u64,
) {
    tracing::info!(
        correlation_id = %correlation_id,
        entity = %entity,
        operation = %family,
        total = summary.total,
        successful = summary.successful,
        failed = summary.failed,
        status = status,
        duration_ms = duration_ms,
        timestamp = %Utc::now().to_rfc3339(),
        "BULK_OPERATION"
    );
}

/// Log a bulk operation rejected or aborted before a result was produced
pub fn log_batch_aborted(
    correlation_id: &str,
    entity: EntityKind,
    family: OperationFamily,
    status: u16,
    reason: &str,
) {
    tracing::error!(
        correlation_id = %correlation_id,
        entity = %entity,
        operation = %family,
        status = status,
        reason = %reason,
        timestamp = %Utc::now().to_rfc3339(),
        "BULK_OPERATION_ABORTED"
    );
}
