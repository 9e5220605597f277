use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    /// A sublease listing.
    Listing,
    /// A move-out sale item.
    SaleItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemStatus {
    Active,
    /// Rented (listings) or sold (sale items).
    Completed,
    Unavailable,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ItemStatus::Active => "active",
            ItemStatus::Completed => "completed",
            ItemStatus::Unavailable => "unavailable",
        };
        f.pad(s)
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "listing" => Ok(ItemKind::Listing),
            "sale-item" | "saleItem" | "sale" => Ok(ItemKind::SaleItem),
            other => Err(format!("unknown item kind '{}' (expected listing or sale-item)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleAction {
    Deactivate,
    Reactivate,
    Complete,
    HardDelete,
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleAction::Deactivate => "deactivate",
            LifecycleAction::Reactivate => "reactivate",
            LifecycleAction::Complete => "complete",
            LifecycleAction::HardDelete => "hard-delete",
        };
        f.pad(s)
    }
}

impl FromStr for LifecycleAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deactivate" => Ok(LifecycleAction::Deactivate),
            "reactivate" => Ok(LifecycleAction::Reactivate),
            "complete" => Ok(LifecycleAction::Complete),
            "hard-delete" | "delete" => Ok(LifecycleAction::HardDelete),
            other => Err(format!("unknown action '{}'", other)),
        }
    }
}

/// A sublease listing or a sale item, as persisted in the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListableItem {
    pub id: String,
    pub owner_id: String,
    pub kind: ItemKind,
    pub status: ItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deactivated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ListableItem {
    /// New items always start out active.
    pub fn new(
        id: impl Into<String>,
        owner_id: impl Into<String>,
        kind: ItemKind,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            kind,
            status: ItemStatus::Active,
            deactivated_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn version(&self) -> ItemVersion {
        ItemVersion {
            status: self.status,
            deactivated_at: self.deactivated_at,
        }
    }
}

/// The fields a conditional write compares against the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemVersion {
    pub status: ItemStatus,
    pub deactivated_at: Option<DateTime<Utc>>,
}

impl ItemVersion {
    pub fn matches(&self, item: &ListableItem) -> bool {
        item.status == self.status && item.deactivated_at == self.deactivated_at
    }
}

/// What the caller must do with the store after a successful transition.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Updated(ListableItem),
    Delete(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self::new(lat, lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryZone {
    pub center: GeoPoint,
    pub radius_meters: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupPoint {
    pub location: GeoPoint,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneCheck {
    pub in_zone: bool,
    pub distance_meters: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupCheck {
    pub at_pickup: bool,
    pub nearest: Option<PickupPoint>,
    pub distance_meters: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EmailStatus {
    Pending,
    Sent,
    Failed,
}

/// A queued notification email and its delivery bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailJob {
    pub id: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub status: EmailStatus,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_attempt_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
}

impl EmailJob {
    pub fn new(
        id: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            status: EmailStatus::Pending,
            attempts: 0,
            last_error: None,
            next_attempt_at: None,
            created_at: now,
            sent_at: None,
        }
    }

    /// Pending and not waiting out a backoff.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == EmailStatus::Pending && self.next_attempt_at.map_or(true, |at| at <= now)
    }
}
