pub mod email_queue;
pub mod geofence;
pub mod lifecycle;
pub mod locator;
pub mod service;
pub mod sweep;

pub use crate::domain::model::{
    DeliveryZone, EmailJob, EmailStatus, GeoPoint, ItemKind, ItemStatus, ItemVersion,
    LifecycleAction, ListableItem, PickupCheck, PickupPoint, TransitionOutcome, ZoneCheck,
};
pub use crate::domain::ports::{AddressResolver, Clock, DocumentStore, EmailQueue, Mailer};
pub use crate::utils::error::Result;
