use maitred_db::repositories::{ReservationLedger, SqlReservationLedger};

use crate::commands::{data_payload, storage_failure, with_pool, CommandResult};

pub fn run() -> CommandResult {
    with_pool("status", |pool, config| async move {
        let ledger = SqlReservationLedger::new(pool, &config.booking);
        let stats = ledger.stats().await.map_err(storage_failure)?;

        let message = format!(
            "{} confirmed of {} total reservations across {} restaurants",
            stats.confirmed_reservations, stats.total_reservations, stats.restaurants
        );
        Ok(CommandResult::success_with_data("status", message, data_payload(&stats)?))
    })
}
