use crate::domain::model::{ItemStatus, LifecycleAction};
use thiserror::Error;

/// Rejections produced by the listing lifecycle state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("cannot {action} an item that is {from}")]
    InvalidTransition {
        from: ItemStatus,
        action: LifecycleAction,
    },

    #[error("grace period has expired; the item can no longer be reactivated")]
    GracePeriodExpired,

    #[error("grace period is still active; the item cannot be permanently deleted yet")]
    GracePeriodStillActive,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeoError {
    #[error("invalid coordinate: lat={lat}, lng={lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("invalid radius: {0} (must be a positive, finite number of meters)")]
    InvalidRadius(f64),
}

#[derive(Error, Debug)]
pub enum MarketError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Geo(#[from] GeoError),

    #[error("item not found: {0}")]
    NotFound(String),

    #[error("item already exists: {0}")]
    AlreadyExists(String),

    #[error("concurrent modification of item {id}; reload and try again")]
    Conflict { id: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Geocoding failed for '{query}': {message}")]
    GeocodingError { query: String, message: String },

    #[error("Mail delivery failed: {message}")]
    MailError { message: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The request was understood but the business rules rejected it.
    Domain,
    Input,
    Concurrency,
    External,
    Storage,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MarketError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MarketError::Lifecycle(_) | MarketError::NotFound(_) | MarketError::AlreadyExists(_) => {
                ErrorCategory::Domain
            }
            MarketError::Geo(_) => ErrorCategory::Input,
            MarketError::Conflict { .. } => ErrorCategory::Concurrency,
            MarketError::HttpError(_)
            | MarketError::GeocodingError { .. }
            | MarketError::MailError { .. } => ErrorCategory::External,
            MarketError::IoError(_)
            | MarketError::SerializationError(_)
            | MarketError::StorageError { .. } => ErrorCategory::Storage,
            MarketError::ConfigError { .. }
            | MarketError::MissingConfigError { .. }
            | MarketError::InvalidConfigValueError { .. }
            | MarketError::ConfigValidationError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Domain | ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Concurrency | ErrorCategory::External => ErrorSeverity::Medium,
            ErrorCategory::Storage | ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    /// Whether running the same operation again later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self.severity(), ErrorSeverity::Medium)
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MarketError::Lifecycle(LifecycleError::GracePeriodExpired) => {
                "This item was deactivated more than 5 days ago and can no longer be reactivated."
                    .to_string()
            }
            MarketError::Lifecycle(LifecycleError::GracePeriodStillActive) => {
                "This item is still inside its 5-day grace period and cannot be deleted yet."
                    .to_string()
            }
            MarketError::Lifecycle(LifecycleError::InvalidTransition { from, action }) => {
                format!("You cannot {} an item that is currently {}.", action, from)
            }
            MarketError::Geo(GeoError::InvalidCoordinate { .. }) => {
                "The location could not be understood. Please pick a valid address.".to_string()
            }
            MarketError::Geo(GeoError::InvalidRadius(_)) => {
                "The delivery zone is misconfigured.".to_string()
            }
            MarketError::NotFound(id) => format!("Item '{}' does not exist.", id),
            MarketError::AlreadyExists(id) => format!("Item '{}' already exists.", id),
            MarketError::Conflict { .. } => {
                "Someone else changed this item at the same time. Please refresh.".to_string()
            }
            MarketError::GeocodingError { query, .. } => {
                format!("Could not find a location for '{}'.", query)
            }
            MarketError::HttpError(_) | MarketError::MailError { .. } => {
                "An external service is unavailable right now.".to_string()
            }
            MarketError::IoError(_)
            | MarketError::SerializationError(_)
            | MarketError::StorageError { .. } => "The item store could not be read or written.".to_string(),
            MarketError::ConfigError { .. }
            | MarketError::MissingConfigError { .. }
            | MarketError::InvalidConfigValueError { .. }
            | MarketError::ConfigValidationError { .. } => format!("Configuration problem: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self.category() {
            ErrorCategory::Domain => "Check the item's current status before retrying".to_string(),
            ErrorCategory::Input => "Verify latitude is within [-90, 90] and longitude within [-180, 180]".to_string(),
            ErrorCategory::Concurrency => "Reload the item and repeat the action".to_string(),
            ErrorCategory::External => "Retry later or check the service endpoint and API key".to_string(),
            ErrorCategory::Storage => "Check that the store path or bucket exists and is writable".to_string(),
            ErrorCategory::Configuration => "Review the configuration file and environment variables".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MarketError>;
