use maitred_db::repositories::{CustomerDirectory, DirectoryError, SqlCustomerDirectory};

use crate::commands::{data_payload, with_pool, CommandResult};

pub fn run(phone: String, name: String) -> CommandResult {
    with_pool("register", move |pool, _config| async move {
        let directory = SqlCustomerDirectory::new(pool);

        match directory.create(&phone, &name).await {
            Ok(customer) => {
                let message = format!("registered {} under {}", customer.name, customer.phone_number);
                Ok(CommandResult::success_with_data("register", message, data_payload(&customer)?))
            }
            Err(error @ DirectoryError::DuplicatePhone(_)) => {
                Ok(CommandResult::failure("register", "duplicate_customer", error.to_string(), 1))
            }
            Err(DirectoryError::Storage(error)) => Err(("storage", error.to_string(), 5u8)),
        }
    })
}
