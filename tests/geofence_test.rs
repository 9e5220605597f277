use sublease_core::core::{DeliveryZone, GeoPoint, PickupPoint};
use sublease_core::{check_delivery_zone, check_pickup_proximity, distance_meters, GeoError};

const METERS_PER_DEGREE_LAT: f64 = 6_371_000.0 * std::f64::consts::PI / 180.0;

fn center() -> GeoPoint {
    GeoPoint::new(44.9778, -93.2650)
}

fn offset_north(meters: f64) -> GeoPoint {
    GeoPoint::new(center().lat + meters / METERS_PER_DEGREE_LAT, center().lng)
}

#[test]
fn test_distance_properties() {
    let points = [
        center(),
        GeoPoint::new(40.7128, -74.0060),
        GeoPoint::new(-33.8688, 151.2093),
        GeoPoint::new(0.0, 179.9),
        GeoPoint::new(0.0, -179.9),
    ];
    for a in &points {
        assert_eq!(distance_meters(a, a).unwrap(), 0.0);
        for b in &points {
            assert_eq!(distance_meters(a, b).unwrap(), distance_meters(b, a).unwrap());
        }
    }
}

#[test]
fn test_distance_across_antimeridian_is_short() {
    let d = distance_meters(&GeoPoint::new(0.0, 179.9), &GeoPoint::new(0.0, -179.9)).unwrap();
    assert!((d - 22_239.0).abs() < 5.0, "got {}", d);
}

#[test]
fn test_delivery_zone_boundary_example() {
    let zone = DeliveryZone {
        center: center(),
        radius_meters: 1000.0,
    };

    let edge = offset_north(1000.0);
    let edge_distance = distance_meters(&center(), &edge).unwrap();
    let exact = DeliveryZone {
        center: center(),
        radius_meters: edge_distance,
    };
    assert!(check_delivery_zone(&exact, &edge).unwrap().in_zone);

    // A 1000.0 m zone admits points whose computed distance is at most 1000.0.
    // The comparison is exact, so a point one micrometer short of the edge is
    // in and one micrometer beyond it is out.
    let just_inside = check_delivery_zone(&zone, &offset_north(1000.0 - 1e-6)).unwrap();
    assert!(just_inside.distance_meters <= 1000.0);
    assert!(just_inside.in_zone);
    assert!(!check_delivery_zone(&zone, &offset_north(1000.0 + 1e-6)).unwrap().in_zone);

    let outside = check_delivery_zone(&zone, &offset_north(1000.1)).unwrap();
    assert!(!outside.in_zone);
    assert!((outside.distance_meters - 1000.1).abs() < 1e-6);
}

#[test]
fn test_pickup_examples() {
    let empty = check_pickup_proximity(&[], &center()).unwrap();
    assert!(!empty.at_pickup);
    assert!(empty.nearest.is_none());
    assert!(empty.distance_meters.is_none());

    let points = vec![
        PickupPoint {
            location: offset_north(50.0),
            label: "Lobby".to_string(),
        },
        PickupPoint {
            location: offset_north(200.0),
            label: "Parking ramp".to_string(),
        },
    ];
    let check = check_pickup_proximity(&points, &center()).unwrap();
    assert!(check.at_pickup);
    assert_eq!(check.nearest.map(|p| p.label), Some("Lobby".to_string()));
}

#[test]
fn test_invalid_probe_is_an_error() {
    let zone = DeliveryZone {
        center: center(),
        radius_meters: 500.0,
    };
    let result = check_delivery_zone(&zone, &GeoPoint::new(f64::NAN, -93.0));
    assert!(matches!(result, Err(GeoError::InvalidCoordinate { .. })));

    let pickup = PickupPoint {
        location: GeoPoint::new(0.0, 200.0),
        label: "bad".to_string(),
    };
    assert!(check_pickup_proximity(&[pickup], &center()).is_err());
}
