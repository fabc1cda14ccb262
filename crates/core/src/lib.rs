pub mod config;
pub mod domain;
pub mod policy;

pub use config::{
    AppConfig, BookingConfig, ConfigError, ConfigOverrides, DatabaseConfig, LoadOptions, LogFormat,
    LoggingConfig,
};
pub use domain::customer::Customer;
pub use domain::reservation::{
    CommitRequest, Reservation, ReservationDetails, ReservationId, ReservationStatus,
};
pub use domain::restaurant::{DiningTable, Restaurant, RestaurantFilter, RestaurantId, TableId};
pub use domain::slots::{ParseSlotError, SlotAssignment, SlotGrid, TimeSlot};
pub use policy::{BookingWindow, WindowViolation};
