use maitred_db::migrations;

use crate::commands::{with_pool, CommandResult};

pub fn run() -> CommandResult {
    with_pool("migrate", |pool, _config| async move {
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;
        pool.close().await;
        Ok(CommandResult::success("migrate", "applied pending migrations"))
    })
}
