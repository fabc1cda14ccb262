use maitred_core::domain::restaurant::RestaurantId;
use maitred_db::repositories::{AvailabilityEngine, SqlAvailabilityEngine};

use crate::commands::{
    data_payload, parse_date_arg, parse_time_arg, storage_failure, with_pool, CommandResult,
};

pub fn run(restaurant: i64, date: String, time: String, party: u32) -> CommandResult {
    let date = match parse_date_arg("nearest", &date) {
        Ok(date) => date,
        Err(result) => return result,
    };
    let requested = match parse_time_arg("nearest", &time) {
        Ok(slot) => slot,
        Err(result) => return result,
    };

    with_pool("nearest", move |pool, _config| async move {
        let engine = SqlAvailabilityEngine::new(pool);
        let nearest = engine
            .nearest_slot_at_or_after(RestaurantId(restaurant), date, requested.time(), party)
            .await
            .map_err(storage_failure)?;

        match nearest {
            Some(assignment) => {
                let exact = assignment.slot == requested;
                let message = if exact {
                    format!("{} is available as requested", assignment.slot)
                } else {
                    format!("{requested} is taken; nearest opening is {}", assignment.slot)
                };
                let mut data = data_payload(&assignment)?;
                if let Some(object) = data.as_object_mut() {
                    object.insert("exact_match".to_string(), serde_json::Value::Bool(exact));
                }
                Ok(CommandResult::success_with_data("nearest", message, data))
            }
            None => Ok(CommandResult::failure(
                "nearest",
                "not_found",
                format!("no bookable slot at or after {requested} on {date}"),
                1,
            )),
        }
    })
}
