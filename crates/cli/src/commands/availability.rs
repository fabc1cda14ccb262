use maitred_core::domain::restaurant::RestaurantId;
use maitred_db::repositories::{AvailabilityEngine, SqlAvailabilityEngine};

use crate::commands::{data_payload, parse_date_arg, storage_failure, with_pool, CommandResult};

pub fn run(restaurant: i64, date: String, party: u32) -> CommandResult {
    let date = match parse_date_arg("availability", &date) {
        Ok(date) => date,
        Err(result) => return result,
    };

    with_pool("availability", move |pool, _config| async move {
        let engine = SqlAvailabilityEngine::new(pool);
        let slots = engine
            .available_slots(RestaurantId(restaurant), date, party)
            .await
            .map_err(storage_failure)?;

        let message = format!("{} bookable slots on {date} for a party of {party}", slots.len());
        Ok(CommandResult::success_with_data("availability", message, data_payload(&slots)?))
    })
}
