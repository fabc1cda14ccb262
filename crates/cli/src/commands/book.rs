use maitred_core::domain::reservation::CommitRequest;
use maitred_core::domain::restaurant::{RestaurantId, TableId};
use maitred_db::repositories::{CommitError, ReservationLedger, SqlReservationLedger};

use crate::commands::{
    data_payload, parse_date_arg, parse_time_arg, with_pool, CommandResult,
};

#[allow(clippy::too_many_arguments)]
pub fn run(
    restaurant: i64,
    table: i64,
    phone: String,
    name: String,
    date: String,
    time: String,
    party: u32,
) -> CommandResult {
    let date = match parse_date_arg("book", &date) {
        Ok(date) => date,
        Err(result) => return result,
    };
    let slot = match parse_time_arg("book", &time) {
        Ok(slot) => slot,
        Err(result) => return result,
    };

    with_pool("book", move |pool, config| async move {
        let ledger = SqlReservationLedger::new(pool, &config.booking);
        let request = CommitRequest {
            restaurant_id: RestaurantId(restaurant),
            table_id: TableId(table),
            phone_number: phone,
            customer_name: name,
            date,
            slot,
            party_size: party,
        };

        match ledger.commit(&request).await {
            Ok(details) => {
                let message = format!(
                    "reservation {} confirmed at {} for a party of {} on {} at {}",
                    details.reservation.id,
                    details.restaurant_name,
                    details.reservation.party_size,
                    details.reservation.date,
                    details.reservation.slot,
                );
                Ok(CommandResult::success_with_data("book", message, data_payload(&details)?))
            }
            Err(CommitError::Window(violation)) => {
                Ok(CommandResult::failure("book", "window_violation", violation.to_string(), 1))
            }
            Err(error @ CommitError::SlotTaken { .. }) => {
                Ok(CommandResult::failure("book", "slot_taken", error.to_string(), 1))
            }
            Err(error @ CommitError::UnknownTable { .. }) => {
                Ok(CommandResult::failure("book", "not_found", error.to_string(), 1))
            }
            Err(CommitError::Storage(error)) => Err(("storage", error.to_string(), 5u8)),
        }
    })
}
