use maitred_core::domain::restaurant::RestaurantFilter;
use maitred_db::repositories::{CatalogRepository, SqlCatalogRepository};

use crate::commands::{data_payload, storage_failure, with_pool, CommandResult};

pub fn run(
    cuisine: Option<String>,
    location: Option<String>,
    name: Option<String>,
) -> CommandResult {
    with_pool("restaurants", move |pool, _config| async move {
        let catalog = SqlCatalogRepository::new(pool);
        let filter = RestaurantFilter { cuisine, location, name };
        let results = catalog.search(&filter).await.map_err(storage_failure)?;

        let message = format!("{} restaurants matched", results.len());
        Ok(CommandResult::success_with_data("restaurants", message, data_payload(&results)?))
    })
}
