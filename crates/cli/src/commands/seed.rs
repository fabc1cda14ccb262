use maitred_db::{migrations, CatalogSeed};

use crate::commands::{with_pool, CommandResult};

pub fn run() -> CommandResult {
    with_pool("seed", |pool, config| async move {
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let seeded = CatalogSeed::load(&pool, &config.booking)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = CatalogSeed::verify(&pool, &config.booking)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        if !verification.all_present {
            let failed = verification
                .checks
                .iter()
                .filter_map(|(check, passed)| (!passed).then_some(*check))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(("seed_verification", format!("failed seed checks: {failed}"), 6u8));
        }

        let data = serde_json::json!({
            "restaurants": seeded.restaurants_seeded,
            "tables": seeded.tables_seeded,
            "time_slots": seeded.slots_seeded,
        });
        Ok(CommandResult::success_with_data("seed", "catalog fixtures loaded and verified", data))
    })
}
