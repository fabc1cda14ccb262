use maitred_db::repositories::{CustomerDirectory, SqlCustomerDirectory};

use crate::commands::{data_payload, storage_failure, with_pool, CommandResult};

pub fn run(phone: String) -> CommandResult {
    with_pool("customer", move |pool, _config| async move {
        let directory = SqlCustomerDirectory::new(pool);

        match directory.get(&phone).await.map_err(storage_failure)? {
            Some(customer) => {
                let message = format!(
                    "{} has {} lifetime reservations",
                    customer.name, customer.total_reservations
                );
                Ok(CommandResult::success_with_data("customer", message, data_payload(&customer)?))
            }
            None => Ok(CommandResult::success_with_data(
                "customer",
                format!("no customer with phone number {phone}"),
                serde_json::Value::Null,
            )),
        }
    })
}
