pub mod availability;
pub mod book;
pub mod cancel;
pub mod customer;
pub mod migrate;
pub mod nearest;
pub mod register;
pub mod reservation;
pub mod reservations;
pub mod restaurants;
pub mod seed;
pub mod status;
pub mod validate_date;

use std::future::Future;

use chrono::NaiveDate;
use serde::Serialize;

use maitred_core::config::{AppConfig, LoadOptions};
use maitred_core::domain::slots::TimeSlot;
use maitred_db::repositories::RepositoryError;
use maitred_db::{connect_with_settings, DbPool};

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data: None,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data: Some(data),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// (error_class, message, exit_code) for a failed command step.
pub(crate) type CommandFailure = (&'static str, String, u8);

pub(crate) fn storage_failure(error: RepositoryError) -> CommandFailure {
    ("storage", error.to_string(), 5)
}

pub(crate) fn data_payload<T: Serialize>(value: &T) -> Result<serde_json::Value, CommandFailure> {
    serde_json::to_value(value).map_err(|error| ("serialization", error.to_string(), 6u8))
}

/// Shared preamble for every command that touches the store: load config,
/// bring up a current-thread runtime, connect, then hand the pool to the
/// command body.
pub(crate) fn with_pool<F, Fut>(command: &'static str, run: F) -> CommandResult
where
    F: FnOnce(DbPool, AppConfig) -> Fut,
    Fut: Future<Output = Result<CommandResult, CommandFailure>>,
{
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                command,
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
                command,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        run(pool, config.clone()).await
    });

    match result {
        Ok(result) => result,
        Err((error_class, message, exit_code)) => {
            CommandResult::failure(command, error_class, message, exit_code)
        }
    }
}

pub(crate) fn parse_date_arg(command: &str, raw: &str) -> Result<NaiveDate, CommandResult> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        CommandResult::failure(
            command,
            "invalid_date",
            format!("invalid date `{raw}` (expected YYYY-MM-DD)"),
            1,
        )
    })
}

pub(crate) fn parse_time_arg(command: &str, raw: &str) -> Result<TimeSlot, CommandResult> {
    TimeSlot::parse(raw).map_err(|error| {
        CommandResult::failure(command, "invalid_time", error.to_string(), 1)
    })
}
