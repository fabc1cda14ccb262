use maitred_core::domain::reservation::ReservationId;
use maitred_db::repositories::{ReservationLedger, SqlReservationLedger};

use crate::commands::{data_payload, storage_failure, with_pool, CommandResult};

pub fn run(id: String) -> CommandResult {
    with_pool("reservation", move |pool, config| async move {
        let ledger = SqlReservationLedger::new(pool, &config.booking);
        let reservation_id = ReservationId(id);

        match ledger.find_by_id(&reservation_id).await.map_err(storage_failure)? {
            Some(details) => {
                let message = format!(
                    "reservation {} at {} on {} {} ({})",
                    details.reservation.id,
                    details.restaurant_name,
                    details.reservation.date,
                    details.reservation.slot,
                    details.reservation.status.as_str(),
                );
                Ok(CommandResult::success_with_data("reservation", message, data_payload(&details)?))
            }
            None => Ok(CommandResult::failure(
                "reservation",
                "not_found",
                format!("no reservation {reservation_id}"),
                1,
            )),
        }
    })
}
