use crate::core::email_queue::{RetryPolicy, DEFAULT_BACKOFF_SECONDS, DEFAULT_MAX_ATTEMPTS};
use crate::core::geofence::DEFAULT_PICKUP_THRESHOLD_M;
use crate::domain::model::{DeliveryZone, GeoPoint, PickupPoint};
use crate::utils::error::{MarketError, Result};
use crate::utils::validation::{self, Validate};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub store: StoreConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub geofence: GeofenceConfig,
    pub email_queue: Option<EmailQueueConfig>,
    pub geocoding: Option<GeocodingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(default = "default_sweep_interval")]
    pub interval_seconds: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_sweep_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeofenceConfig {
    #[serde(default = "default_pickup_threshold")]
    pub pickup_threshold_meters: f64,
    #[serde(default)]
    pub zones: Vec<ZoneConfig>,
    #[serde(default)]
    pub pickup_points: Vec<PickupPointConfig>,
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self {
            pickup_threshold_meters: default_pickup_threshold(),
            zones: Vec::new(),
            pickup_points: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub radius_meters: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupPointConfig {
    pub label: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailQueueConfig {
    pub path: String,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_sender")]
    pub from: String,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_seconds")]
    pub backoff_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    #[serde(default = "default_geocoding_endpoint")]
    pub endpoint: String,
    pub api_key: String,
}

fn default_sweep_interval() -> u64 {
    3600
}

fn default_pickup_threshold() -> f64 {
    DEFAULT_PICKUP_THRESHOLD_M
}

fn default_sender() -> String {
    "no-reply@localhost".to_string()
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_backoff_seconds() -> u64 {
    DEFAULT_BACKOFF_SECONDS as u64
}

fn default_geocoding_endpoint() -> String {
    crate::adapters::http::GOOGLE_GEOCODE_ENDPOINT.to_string()
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MarketError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MarketError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| MarketError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("store.path", &self.store.path)?;
        validation::validate_positive_number("sweep.interval_seconds", self.sweep.interval_seconds, 1)?;
        validation::validate_positive_meters(
            "geofence.pickup_threshold_meters",
            self.geofence.pickup_threshold_meters,
        )?;

        for zone in &self.geofence.zones {
            let field = format!("geofence.zones.{}", zone.name);
            validation::validate_non_empty_string("geofence.zones.name", &zone.name)?;
            validation::validate_coordinate(&field, zone.lat, zone.lng)?;
            validation::validate_positive_meters(&field, zone.radius_meters)?;
        }
        for point in &self.geofence.pickup_points {
            validation::validate_coordinate(
                &format!("geofence.pickup_points.{}", point.label),
                point.lat,
                point.lng,
            )?;
        }

        if let Some(queue) = &self.email_queue {
            validation::validate_path("email_queue.path", &queue.path)?;
            validation::validate_range("email_queue.max_attempts", queue.max_attempts, 1, 10)?;
            validation::validate_positive_number("email_queue.backoff_seconds", queue.backoff_seconds, 1)?;
            if let Some(endpoint) = &queue.endpoint {
                validation::validate_url("email_queue.endpoint", endpoint)?;
            }
        }

        if let Some(geocoding) = &self.geocoding {
            validation::validate_url("geocoding.endpoint", &geocoding.endpoint)?;
            validation::validate_non_empty_string("geocoding.api_key", &geocoding.api_key)?;
        }

        Ok(())
    }

    pub fn zone(&self, name: Option<&str>) -> Result<DeliveryZone> {
        let zone = match name {
            Some(name) => self.geofence.zones.iter().find(|z| z.name == name),
            None => self.geofence.zones.first(),
        }
        .ok_or_else(|| MarketError::MissingConfigError {
            field: format!("geofence.zones{}", name.map(|n| format!(".{}", n)).unwrap_or_default()),
        })?;

        Ok(DeliveryZone {
            center: GeoPoint::new(zone.lat, zone.lng),
            radius_meters: zone.radius_meters,
        })
    }

    pub fn pickup_points(&self) -> Vec<PickupPoint> {
        self.geofence
            .pickup_points
            .iter()
            .map(|p| PickupPoint {
                location: GeoPoint::new(p.lat, p.lng),
                label: p.label.clone(),
            })
            .collect()
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep.interval_seconds)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        match &self.email_queue {
            Some(queue) => RetryPolicy {
                max_attempts: queue.max_attempts,
                backoff: Duration::seconds(queue.backoff_seconds as i64),
            },
            None => RetryPolicy::default(),
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FULL: &str = r#"
[store]
path = "./data/items.json"

[sweep]
interval_seconds = 600

[geofence]
pickup_threshold_meters = 75

[[geofence.zones]]
name = "campus"
lat = 44.9740
lng = -93.2277
radius_meters = 2500

[[geofence.pickup_points]]
label = "Coffman Union"
lat = 44.9727
lng = -93.2354

[email_queue]
path = "./data/queue.json"
endpoint = "https://mail.example.com/send"
max_attempts = 4
backoff_seconds = 120
"#;

    #[test]
    fn test_parse_full_config() {
        let config = TomlConfig::from_toml_str(FULL).unwrap();
        assert_eq!(config.store.path, "./data/items.json");
        assert_eq!(config.sweep_interval(), std::time::Duration::from_secs(600));
        assert_eq!(config.geofence.pickup_threshold_meters, 75.0);
        assert_eq!(config.zone(Some("campus")).unwrap().radius_meters, 2500.0);
        assert_eq!(config.pickup_points()[0].label, "Coffman Union");
        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 4);
        assert_eq!(policy.backoff, Duration::seconds(120));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_apply() {
        let config = TomlConfig::from_toml_str("[store]\npath = \"items.json\"\n").unwrap();
        assert_eq!(config.sweep.interval_seconds, 3600);
        assert_eq!(config.geofence.pickup_threshold_meters, 100.0);
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert!(config.zone(None).is_err());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SUBLEASE_TEST_GEOCODING_KEY", "secret-key");

        let toml_content = r#"
[store]
path = "items.json"

[geocoding]
api_key = "${SUBLEASE_TEST_GEOCODING_KEY}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        let geocoding = config.geocoding.unwrap();
        assert_eq!(geocoding.api_key, "secret-key");
        assert_eq!(geocoding.endpoint, crate::adapters::http::GOOGLE_GEOCODE_ENDPOINT);

        std::env::remove_var("SUBLEASE_TEST_GEOCODING_KEY");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[store]
path = "items.json"

[[geofence.zones]]
name = "broken"
lat = 144.0
lng = 0.0
radius_meters = 100
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(FULL.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.geofence.zones.len(), 1);
    }
}
