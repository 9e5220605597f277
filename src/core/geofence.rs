//! Delivery-zone and pickup-point checks on top of the Haversine distance.

use crate::domain::model::{DeliveryZone, GeoPoint, PickupCheck, PickupPoint, ZoneCheck};
use crate::utils::error::GeoError;

/// Mean Earth radius used for all distance calculations.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

pub const DEFAULT_PICKUP_THRESHOLD_M: f64 = 100.0;

fn ensure_valid(point: &GeoPoint) -> Result<(), GeoError> {
    if point.is_valid() {
        Ok(())
    } else {
        Err(GeoError::InvalidCoordinate {
            lat: point.lat,
            lng: point.lng,
        })
    }
}

fn ensure_radius(meters: f64) -> Result<(), GeoError> {
    if meters.is_finite() && meters > 0.0 {
        Ok(())
    } else {
        Err(GeoError::InvalidRadius(meters))
    }
}

/// Great-circle distance in meters.
pub fn distance_meters(a: &GeoPoint, b: &GeoPoint) -> Result<f64, GeoError> {
    ensure_valid(a)?;
    ensure_valid(b)?;
    Ok(haversine(a, b))
}

fn haversine(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * h.clamp(0.0, 1.0).sqrt().atan2((1.0 - h).clamp(0.0, 1.0).sqrt());
    EARTH_RADIUS_M * c
}

/// The boundary is inclusive: a point exactly `radius_meters` away is in the zone.
pub fn check_delivery_zone(zone: &DeliveryZone, point: &GeoPoint) -> Result<ZoneCheck, GeoError> {
    ensure_radius(zone.radius_meters)?;
    let distance = distance_meters(&zone.center, point)?;
    Ok(ZoneCheck {
        in_zone: distance <= zone.radius_meters,
        distance_meters: distance,
    })
}

pub fn check_pickup_proximity(
    points: &[PickupPoint],
    point: &GeoPoint,
) -> Result<PickupCheck, GeoError> {
    check_pickup_proximity_within(points, point, DEFAULT_PICKUP_THRESHOLD_M)
}

/// Nearest pickup point to `point`; the earliest entry wins exact ties.
pub fn check_pickup_proximity_within(
    points: &[PickupPoint],
    point: &GeoPoint,
    threshold_meters: f64,
) -> Result<PickupCheck, GeoError> {
    ensure_valid(point)?;
    ensure_radius(threshold_meters)?;

    let mut nearest: Option<(&PickupPoint, f64)> = None;
    for candidate in points {
        let distance = distance_meters(&candidate.location, point)?;
        match nearest {
            Some((_, best)) if distance >= best => {}
            _ => nearest = Some((candidate, distance)),
        }
    }

    Ok(match nearest {
        None => PickupCheck {
            at_pickup: false,
            nearest: None,
            distance_meters: None,
        },
        Some((pickup, distance)) => PickupCheck {
            at_pickup: distance <= threshold_meters,
            nearest: Some(pickup.clone()),
            distance_meters: Some(distance),
        },
    })
}
