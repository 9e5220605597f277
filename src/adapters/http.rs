use crate::domain::model::{EmailJob, GeoPoint};
use crate::domain::ports::{AddressResolver, Mailer};
use crate::utils::error::{MarketError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const GOOGLE_GEOCODE_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: GeoPoint,
}

/// Resolves addresses with the Google Geocoding JSON API.
#[derive(Debug, Clone)]
pub struct GoogleGeocoder {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GoogleGeocoder {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl AddressResolver for GoogleGeocoder {
    async fn resolve(&self, query: &str) -> Result<GeoPoint> {
        let geocoding_error = |message: String| MarketError::GeocodingError {
            query: query.to_string(),
            message,
        };

        tracing::debug!("Geocoding '{}' via {}", query, self.endpoint);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("address", query), ("key", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(geocoding_error(format!("HTTP {}", response.status())));
        }

        let body: GeocodeResponse = response.json().await?;
        match body.status.as_str() {
            "OK" => {}
            "ZERO_RESULTS" => return Err(geocoding_error("no matching location".to_string())),
            other => {
                let detail = body.error_message.unwrap_or_default();
                return Err(geocoding_error(format!("{} {}", other, detail).trim().to_string()));
            }
        }

        let location = body
            .results
            .into_iter()
            .next()
            .map(|r| r.geometry.location)
            .ok_or_else(|| geocoding_error("response contained no results".to_string()))?;

        if !location.is_valid() {
            return Err(crate::utils::error::GeoError::InvalidCoordinate {
                lat: location.lat,
                lng: location.lng,
            }
            .into());
        }

        tracing::debug!("Resolved '{}' to ({}, {})", query, location.lat, location.lng);
        Ok(location)
    }
}

#[derive(Debug, Serialize)]
struct OutgoingMail<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Delivers queued mail by POSTing it as JSON to a transactional mail endpoint.
#[derive(Debug, Clone)]
pub struct HttpMailer {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    from: String,
}

impl HttpMailer {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, from: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key,
            from: from.into(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, job: &EmailJob) -> Result<()> {
        let payload = OutgoingMail {
            from: &self.from,
            to: &job.to,
            subject: &job.subject,
            text: &job.body,
        };

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(MarketError::MailError {
            message: format!("HTTP {} from mail endpoint: {}", status, body.trim()),
        })
    }
}
