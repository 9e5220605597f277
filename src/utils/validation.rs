use crate::utils::error::{MarketError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(MarketError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(MarketError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(MarketError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(MarketError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(MarketError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(MarketError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_positive_meters(field_name: &str, meters: f64) -> Result<()> {
    if !meters.is_finite() || meters <= 0.0 {
        return Err(MarketError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: meters.to_string(),
            reason: "Distance must be a positive number of meters".to_string(),
        });
    }
    Ok(())
}

pub fn validate_coordinate(field_name: &str, lat: f64, lng: f64) -> Result<()> {
    let valid = lat.is_finite()
        && lng.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lng);
    if !valid {
        return Err(MarketError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: format!("({}, {})", lat, lng),
            reason: "Latitude must be within [-90, 90] and longitude within [-180, 180]".to_string(),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(MarketError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(MarketError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("geocoding.endpoint", "https://example.com").is_ok());
        assert!(validate_url("geocoding.endpoint", "http://example.com").is_ok());
        assert!(validate_url("geocoding.endpoint", "").is_err());
        assert!(validate_url("geocoding.endpoint", "invalid-url").is_err());
        assert!(validate_url("geocoding.endpoint", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("sweep.interval_seconds", 3600, 1).is_ok());
        assert!(validate_positive_number("sweep.interval_seconds", 0, 1).is_err());
    }

    #[test]
    fn test_validate_coordinate() {
        assert!(validate_coordinate("zone", 44.97, -93.26).is_ok());
        assert!(validate_coordinate("zone", 91.0, 0.0).is_err());
        assert!(validate_coordinate("zone", 0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_validate_positive_meters() {
        assert!(validate_positive_meters("radius", 250.0).is_ok());
        assert!(validate_positive_meters("radius", 0.0).is_err());
        assert!(validate_positive_meters("radius", f64::INFINITY).is_err());
    }
}
