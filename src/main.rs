use clap::Parser;
use serde::Serialize;
use sublease_core::config::{Command, LocationArgs};
use sublease_core::core::{Clock, DocumentStore, EmailJob, EmailQueue, GeoPoint};
use sublease_core::utils::error::{ErrorSeverity, MarketError, Result};
use sublease_core::utils::{logger, validation::Validate};
use sublease_core::{
    check_delivery_zone, check_pickup_proximity_within, days_remaining, CliConfig,
    EmailQueueProcessor, FixedClock, GeofenceService, GoogleGeocoder, HttpMailer,
    JsonFileEmailQueue, JsonFileStore, ListingService, SweepEngine, SystemClock, TomlConfig,
};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose);
    tracing::debug!("CLI arguments: {:?}", cli);

    let config = match TomlConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(&cli, &config).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        if e.is_retryable() {
            eprintln!("🔁 This is usually temporary; running the command again may succeed");
        }

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

fn clock(cli: &CliConfig) -> Box<dyn Clock> {
    match cli.at {
        Some(at) => Box::new(FixedClock::new(at)),
        None => Box::new(SystemClock),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn geocoder(config: &TomlConfig) -> Result<GeofenceService<GoogleGeocoder>> {
    let geocoding = config
        .geocoding
        .as_ref()
        .ok_or_else(|| MarketError::MissingConfigError {
            field: "geocoding".to_string(),
        })?;
    Ok(GeofenceService::new(GoogleGeocoder::new(
        geocoding.endpoint.clone(),
        geocoding.api_key.clone(),
    )))
}

fn coordinates(location: &LocationArgs) -> Result<GeoPoint> {
    match (location.lat, location.lng) {
        (Some(lat), Some(lng)) => Ok(GeoPoint::new(lat, lng)),
        _ => Err(MarketError::ConfigError {
            message: "provide --lat and --lng, or --address".to_string(),
        }),
    }
}

async fn run(cli: &CliConfig, config: &TomlConfig) -> Result<()> {
    let store = JsonFileStore::new(&config.store.path);

    match &cli.command {
        Command::Create { id, owner, kind } => {
            let service = ListingService::new(store, clock(cli));
            let item = service.create(id.clone(), owner.clone(), *kind).await?;
            println!("✅ Created {}", item.id);
            print_json(&item)?;
        }
        Command::List => {
            let now = clock(cli).now();
            for item in store.list().await? {
                println!(
                    "{:<24} {:<10} {:<12} grace days left: {}",
                    item.id,
                    format!("{:?}", item.kind),
                    item.status,
                    days_remaining(item.deactivated_at, now)
                );
            }
        }
        Command::Status { id } => {
            let service = ListingService::new(store, clock(cli));
            print_json(&service.status(id).await?)?;
        }
        Command::Transition { id, action } => {
            let service = ListingService::new(store, clock(cli));
            match service.apply(id, *action).await? {
                sublease_core::core::TransitionOutcome::Updated(item) => {
                    println!("✅ {} is now {}", item.id, item.status);
                    print_json(&item)?;
                }
                sublease_core::core::TransitionOutcome::Delete(id) => {
                    println!("🗑️  {} permanently deleted", id);
                }
            }
        }
        Command::Sweep { dry_run, watch } => {
            let engine = SweepEngine::new(store, clock(cli));
            if !*watch {
                print_json(&engine.run(*dry_run).await?)?;
                return Ok(());
            }

            let mut interval = tokio::time::interval(config.sweep_interval());
            tracing::info!("🔁 Sweeping every {:?}; press Ctrl-C to stop", config.sweep_interval());
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        match engine.run(*dry_run).await {
                            Ok(report) => tracing::debug!("Sweep report: {:?}", report),
                            Err(e) if e.is_retryable() => tracing::warn!("Sweep failed, retrying next tick: {}", e),
                            Err(e) => tracing::error!("❌ Sweep failed: {}", e),
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Stopping sweep loop");
                        break;
                    }
                }
            }
        }
        Command::Zone { zone, location } => {
            let zone = config.zone(zone.as_deref())?;
            let (point, check) = match &location.address {
                Some(address) => geocoder(config)?.check_zone(&zone, address).await?,
                None => {
                    let point = coordinates(location)?;
                    (point, check_delivery_zone(&zone, &point)?)
                }
            };
            tracing::debug!("Evaluated zone check at ({}, {})", point.lat, point.lng);
            print_json(&check)?;
        }
        Command::Pickup { threshold, location } => {
            let points = config.pickup_points();
            let threshold = threshold.unwrap_or(config.geofence.pickup_threshold_meters);
            let (_, check) = match &location.address {
                Some(address) => geocoder(config)?.check_pickup(&points, address, threshold).await?,
                None => {
                    let point = coordinates(location)?;
                    (point, check_pickup_proximity_within(&points, &point, threshold)?)
                }
            };
            print_json(&check)?;
        }
        Command::Notify { id, to, subject, body } => {
            let queue_config = config
                .email_queue
                .as_ref()
                .ok_or_else(|| MarketError::MissingConfigError {
                    field: "email_queue".to_string(),
                })?;
            let queue = JsonFileEmailQueue::new(&queue_config.path);
            let job = EmailJob::new(id.clone(), to.clone(), subject.clone(), body.clone(), clock(cli).now());
            queue.enqueue(&job).await?;
            println!("📬 Queued email {}", job.id);
        }
        Command::Queue => {
            let queue_config = config
                .email_queue
                .as_ref()
                .ok_or_else(|| MarketError::MissingConfigError {
                    field: "email_queue".to_string(),
                })?;
            let endpoint = queue_config
                .endpoint
                .clone()
                .ok_or_else(|| MarketError::MissingConfigError {
                    field: "email_queue.endpoint".to_string(),
                })?;
            let mailer = HttpMailer::new(endpoint, queue_config.api_key.clone(), queue_config.from.clone());
            let processor = EmailQueueProcessor::with_policy(
                JsonFileEmailQueue::new(&queue_config.path),
                mailer,
                clock(cli),
                config.retry_policy(),
            );
            print_json(&processor.process().await?)?;
        }
    }

    Ok(())
}
