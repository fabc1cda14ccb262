use chrono::Local;

use maitred_core::config::{AppConfig, LoadOptions};

use crate::commands::{parse_date_arg, CommandResult};

pub fn run(date: String) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "validate-date",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let candidate = match parse_date_arg("validate-date", &date) {
        Ok(date) => date,
        Err(result) => return result,
    };

    let today = Local::now().date_naive();
    match config.booking.window().validate(candidate, today) {
        Ok(()) => CommandResult::success(
            "validate-date",
            format!("{candidate} is within the booking window"),
        ),
        Err(violation) => {
            CommandResult::failure("validate-date", "window_violation", violation.to_string(), 1)
        }
    }
}
