pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::cli::{JsonFileEmailQueue, JsonFileStore};
pub use config::toml_config::TomlConfig;

#[cfg(feature = "lambda")]
pub use config::lambda::{LambdaConfig, S3DocumentStore, S3EmailQueue};

pub use adapters::http::{GoogleGeocoder, HttpMailer};
pub use adapters::memory::{MemoryEmailQueue, MemoryStore};
pub use core::email_queue::{EmailQueueProcessor, QueueReport, RetryPolicy};
pub use core::geofence::{
    check_delivery_zone, check_pickup_proximity, check_pickup_proximity_within, distance_meters,
};
pub use core::lifecycle::{can_reactivate, days_remaining, sweep_expired, transition};
pub use core::locator::GeofenceService;
pub use core::service::{ItemStatusReport, ListingService};
pub use core::sweep::{SweepEngine, SweepReport};
pub use utils::error::{GeoError, LifecycleError, MarketError, Result};
pub use utils::time::{FixedClock, SystemClock, GRACE_PERIOD_DAYS};
