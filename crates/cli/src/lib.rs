pub mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use maitred_core::config::{AppConfig, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "maitred",
    about = "Maitred reservation-ledger CLI",
    long_about = "Operate the maitred booking core: migrations, catalog fixtures, availability search, and the reservation ledger.",
    after_help = "Examples:\n  maitred seed\n  maitred availability --restaurant 1 --date 2026-08-08 --party 4\n  maitred book --restaurant 1 --table 4 --phone 9880012345 --name \"Priya Sharma\" --date 2026-08-08 --time 19:00 --party 4"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic catalog fixtures and verify the seed contract")]
    Seed,
    #[command(about = "Report aggregate counts over restaurants, customers, and reservations")]
    Status,
    #[command(about = "Search restaurants by cuisine, location, or name substring")]
    Restaurants {
        #[arg(long, help = "Cuisine substring, e.g. Indian")]
        cuisine: Option<String>,
        #[arg(long, help = "Location substring, e.g. Koramangala")]
        location: Option<String>,
        #[arg(long, help = "Restaurant-name substring")]
        name: Option<String>,
    },
    #[command(about = "List bookable (slot, table) pairs for a restaurant, date, and party size")]
    Availability {
        #[arg(long)]
        restaurant: i64,
        #[arg(long, help = "Date as YYYY-MM-DD")]
        date: String,
        #[arg(long)]
        party: u32,
    },
    #[command(about = "Find the nearest bookable slot at or after a requested time")]
    Nearest {
        #[arg(long)]
        restaurant: i64,
        #[arg(long, help = "Date as YYYY-MM-DD")]
        date: String,
        #[arg(long, help = "Requested time as HH:MM")]
        time: String,
        #[arg(long)]
        party: u32,
    },
    #[command(about = "Check a date against the advance-booking window")]
    ValidateDate {
        #[arg(long, help = "Date as YYYY-MM-DD")]
        date: String,
    },
    #[command(about = "Commit a reservation against the ledger")]
    Book {
        #[arg(long)]
        restaurant: i64,
        #[arg(long)]
        table: i64,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        name: String,
        #[arg(long, help = "Date as YYYY-MM-DD")]
        date: String,
        #[arg(long, help = "Slot time as HH:MM")]
        time: String,
        #[arg(long)]
        party: u32,
    },
    #[command(about = "Cancel a confirmed reservation by its booking reference")]
    Cancel {
        #[arg(long, help = "Booking reference, e.g. TT1000")]
        id: String,
    },
    #[command(about = "Look up a reservation by its booking reference")]
    Reservation {
        #[arg(long, help = "Booking reference, e.g. TT1000")]
        id: String,
    },
    #[command(about = "Look up a customer profile by phone number")]
    Customer {
        #[arg(long)]
        phone: String,
    },
    #[command(about = "Register a new customer (duplicate phone numbers are rejected)")]
    Register {
        #[arg(long)]
        phone: String,
        #[arg(long)]
        name: String,
    },
    #[command(about = "List a customer's recent confirmed reservations, most recent first")]
    Reservations {
        #[arg(long)]
        phone: String,
        #[arg(long, default_value_t = 5)]
        limit: u32,
    },
}

fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    let result = match config.logging.format {
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_target(false)
            .with_max_level(log_level)
            .compact()
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_target(false)
            .with_max_level(log_level)
            .pretty()
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_target(false)
            .with_max_level(log_level)
            .json()
            .try_init(),
    };
    // A second init (e.g. under a test harness) is not an error worth failing
    // a command over.
    let _ = result;
}

pub fn run() -> ExitCode {
    if let Ok(config) = AppConfig::load(LoadOptions::default()) {
        init_logging(&config);
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Status => commands::status::run(),
        Command::Restaurants { cuisine, location, name } => {
            commands::restaurants::run(cuisine, location, name)
        }
        Command::Availability { restaurant, date, party } => {
            commands::availability::run(restaurant, date, party)
        }
        Command::Nearest { restaurant, date, time, party } => {
            commands::nearest::run(restaurant, date, time, party)
        }
        Command::ValidateDate { date } => commands::validate_date::run(date),
        Command::Book { restaurant, table, phone, name, date, time, party } => {
            commands::book::run(restaurant, table, phone, name, date, time, party)
        }
        Command::Cancel { id } => commands::cancel::run(id),
        Command::Reservation { id } => commands::reservation::run(id),
        Command::Customer { phone } => commands::customer::run(phone),
        Command::Register { phone, name } => commands::register::run(phone, name),
        Command::Reservations { phone, limit } => commands::reservations::run(phone, limit),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
