//! Structured logging/tracing setup and the span-naming macros used
//! throughout the coordinator, dispatcher, and health monitor.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::{Config, LogFormat, LoggingConfig};

/// Initializes the tracing subscriber for logging and telemetry.
pub fn init_telemetry(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .context("invalid log level configuration")?;

    let registry = Registry::default().with(env_filter);

    match config.format {
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .pretty()
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true);
            registry.with(fmt_layer).init();
        }
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true)
                .with_span_list(true)
                .flatten_event(true);
            registry.with(fmt_layer).init();
        }
        LogFormat::Compact => {
            let fmt_layer = fmt::layer()
                .compact()
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false);
            registry.with(fmt_layer).init();
        }
    }

    tracing::info!(log_level = %config.level, log_format = ?config.format, "telemetry initialized");
    Ok(())
}

/// Span for coordinator-level operations (`request_next_task`,
/// `report_progress`, reconciliation passes).
#[macro_export]
macro_rules! coordinator_span {
    ($operation:expr) => {
        tracing::info_span!("coordinator_operation", operation = $operation)
    };
    ($operation:expr, $($key:expr => $value:expr),*) => {
        tracing::info_span!("coordinator_operation", operation = $operation, $($key = $value),*)
    };
}

/// Span for JSON-RPC tool dispatch.
#[macro_export]
macro_rules! dispatch_span {
    ($tool:expr) => {
        tracing::info_span!("tool_dispatch", tool = $tool)
    };
    ($tool:expr, $($key:expr => $value:expr),*) => {
        tracing::info_span!("tool_dispatch", tool = $tool, $($key = $value),*)
    };
}

/// Span for health-monitor reconciliation passes.
#[macro_export]
macro_rules! monitor_span {
    ($operation:expr) => {
        tracing::info_span!("monitor_operation", operation = $operation)
    };
    ($operation:expr, $($key:expr => $value:expr),*) => {
        tracing::info_span!("monitor_operation", operation = $operation, $($key = $value),*)
    };
}

/// Logs server startup information once configuration is validated.
pub fn log_startup_info(config: &Config) {
    tracing::info!(
        server_address = %config.server_address(),
        provider = ?config.provider.kind,
        persistence_path = %config.persistence.path,
        monitor_interval_seconds = config.monitor.interval_seconds,
        "Marcus starting up"
    );
}

/// Logs graceful-shutdown completion.
pub fn log_shutdown_info() {
    tracing::info!("Marcus shutting down gracefully");
}

/// Logs the outcome of configuration validation.
pub fn log_config_validation(config: &Config) {
    match config.validate() {
        Ok(()) => tracing::info!("configuration validation passed"),
        Err(e) => tracing::error!(error = %e, "configuration validation failed"),
    }
}

/// Logs an error and its full cause chain.
pub fn report_error(error: &anyhow::Error, context: &str) {
    tracing::error!(error = %error, context = context, "operation failed");

    let mut current = error.source();
    let mut depth = 1;
    while let Some(err) = current {
        tracing::error!(error = %err, depth = depth, "error cause");
        current = err.source();
        depth += 1;
    }
}

/// Measures and logs the duration of a latency-sensitive operation
/// (`request_next_task`, AI instruction generation).
pub struct PerformanceTimer {
    start: std::time::Instant,
    operation: String,
}

impl PerformanceTimer {
    pub fn new(operation: impl Into<String>) -> Self {
        let operation = operation.into();
        tracing::debug!(operation = %operation, "starting performance timer");
        Self { start: std::time::Instant::now(), operation }
    }

    pub fn finish(self) {
        let duration = self.start.elapsed();
        tracing::info!(operation = %self.operation, duration_ms = duration.as_millis(), "operation completed");

        if duration.as_millis() > 1000 {
            tracing::warn!(operation = %self.operation, duration_ms = duration.as_millis(), "slow operation detected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn performance_timer_does_not_panic() {
        let timer = PerformanceTimer::new("test_operation");
        std::thread::sleep(Duration::from_millis(5));
        timer.finish();
    }

    #[test]
    fn every_log_format_variant_is_a_valid_config() {
        for format in [LogFormat::Pretty, LogFormat::Json, LogFormat::Compact] {
            let config = LoggingConfig { level: "info".to_string(), format };
            assert!(matches!(config.format, LogFormat::Pretty | LogFormat::Json | LogFormat::Compact));
        }
    }
}
