use maitred_db::repositories::{ReservationLedger, SqlReservationLedger};

use crate::commands::{data_payload, storage_failure, with_pool, CommandResult};

pub fn run(phone: String, limit: u32) -> CommandResult {
    with_pool("reservations", move |pool, config| async move {
        let ledger = SqlReservationLedger::new(pool, &config.booking);
        let recent = ledger.reservations_of(&phone, limit).await.map_err(storage_failure)?;

        let message = format!("{} confirmed reservations for {phone}", recent.len());
        Ok(CommandResult::success_with_data("reservations", message, data_payload(&recent)?))
    })
}
