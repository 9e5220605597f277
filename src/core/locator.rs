use crate::core::geofence::{check_delivery_zone, check_pickup_proximity_within};
use crate::domain::model::{DeliveryZone, GeoPoint, PickupCheck, PickupPoint, ZoneCheck};
use crate::domain::ports::AddressResolver;
use crate::utils::error::Result;

/// Resolves a searched address and runs it through the geofence checks.
pub struct GeofenceService<R: AddressResolver> {
    resolver: R,
}

impl<R: AddressResolver> GeofenceService<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    async fn locate(&self, address: &str) -> Result<GeoPoint> {
        self.resolver.resolve(address).await
    }

    pub async fn check_zone(&self, zone: &DeliveryZone, address: &str) -> Result<(GeoPoint, ZoneCheck)> {
        let point = self.locate(address).await?;
        let check = check_delivery_zone(zone, &point)?;
        tracing::info!(
            "'{}' is {:.0}m from the zone center (in zone: {})",
            address,
            check.distance_meters,
            check.in_zone
        );
        Ok((point, check))
    }

    pub async fn check_pickup(
        &self,
        points: &[PickupPoint],
        address: &str,
        threshold_meters: f64,
    ) -> Result<(GeoPoint, PickupCheck)> {
        let point = self.locate(address).await?;
        let check = check_pickup_proximity_within(points, &point, threshold_meters)?;
        Ok((point, check))
    }
}
