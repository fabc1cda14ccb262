use maitred_core::domain::reservation::ReservationId;
use maitred_db::repositories::{CancelError, ReservationLedger, SqlReservationLedger};

use crate::commands::{with_pool, CommandResult};

pub fn run(id: String) -> CommandResult {
    with_pool("cancel", move |pool, config| async move {
        let ledger = SqlReservationLedger::new(pool, &config.booking);
        let reservation_id = ReservationId(id);

        match ledger.cancel(&reservation_id).await {
            Ok(()) => Ok(CommandResult::success(
                "cancel",
                format!("reservation {reservation_id} cancelled"),
            )),
            Err(error @ CancelError::NotFound(_)) => {
                Ok(CommandResult::failure("cancel", "not_found", error.to_string(), 1))
            }
            Err(CancelError::Storage(error)) => Err(("storage", error.to_string(), 5u8)),
        }
    })
}
