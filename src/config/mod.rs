pub mod cli;
#[cfg(feature = "lambda")]
pub mod lambda;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::domain::model::{ItemKind, LifecycleAction};
#[cfg(feature = "cli")]
use chrono::{DateTime, Utc};
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "sublease")]
#[command(about = "Listing lifecycle, expiry sweep and geofence checks for the sublease marketplace")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "sublease.toml")]
    pub config: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Evaluate as if the current time were this RFC 3339 instant
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create a new active listing or sale item
    Create {
        id: String,
        #[arg(long)]
        owner: String,
        /// listing or sale-item
        #[arg(long, default_value = "listing")]
        kind: ItemKind,
    },
    /// List all stored items with their grace-period status
    List,
    /// Show an item's status and remaining grace days
    Status { id: String },
    /// Apply deactivate, reactivate, complete or hard-delete to an item
    Transition { id: String, action: LifecycleAction },
    /// Permanently delete items whose grace period has expired
    Sweep {
        /// Report expired items without deleting them
        #[arg(long)]
        dry_run: bool,
        /// Keep running, sweeping every `sweep.interval_seconds`
        #[arg(long)]
        watch: bool,
    },
    /// Check whether a location falls inside a delivery zone
    Zone {
        /// Zone name from the config; defaults to the first zone
        #[arg(long)]
        zone: Option<String>,
        #[command(flatten)]
        location: LocationArgs,
    },
    /// Find the nearest pickup point to a location
    Pickup {
        /// Override `geofence.pickup_threshold_meters`
        #[arg(long)]
        threshold: Option<f64>,
        #[command(flatten)]
        location: LocationArgs,
    },
    /// Queue a notification email
    Notify {
        id: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        body: String,
    },
    /// Send due notification emails, retrying failures with backoff
    Queue,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct LocationArgs {
    #[arg(long, allow_negative_numbers = true, requires = "lng")]
    pub lat: Option<f64>,

    #[arg(long, allow_negative_numbers = true, requires = "lat")]
    pub lng: Option<f64>,

    /// Free-text address resolved through the configured geocoder
    #[arg(long, conflicts_with_all = ["lat", "lng"])]
    pub address: Option<String>,
}
