//! Geofence math - great-circle distance and fence membership
//!
//! Pure functions, no state. Coordinate validation is the caller's
//! responsibility: NaN inputs propagate as NaN distances and never
//! classify as inside.

use crate::domain::types::{Fence, GeoPoint};

/// Mean Earth radius in meters
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle (haversine) distance between two points in meters
///
/// Deterministic and symmetric: `distance_meters(a, b) == distance_meters(b, a)`.
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Membership result for a single fence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FenceCheck {
    pub inside: bool,
    pub distance_m: f64,
}

/// Test a point against one circular fence (boundary-inclusive)
pub fn check_fence(point: GeoPoint, center: GeoPoint, radius_m: f64) -> FenceCheck {
    let distance_m = distance_meters(point, center);
    FenceCheck { inside: distance_m <= radius_m, distance_m }
}

/// Decision across a set of active fences
#[derive(Debug, Clone, Copy)]
pub struct FenceDecision<'a> {
    /// Inside at least one fence
    pub inside_any: bool,
    /// Distance to the closest fence center, member or not
    pub min_distance_m: f64,
    /// The minimum-distance fence regardless of membership
    pub closest: &'a Fence,
}

/// Evaluate a point against every active fence; one distance computation
/// per fence, minimum wins. Returns None when no fences are configured.
pub fn evaluate<'a>(point: GeoPoint, fences: &'a [Fence]) -> Option<FenceDecision<'a>> {
    let mut inside_any = false;
    let mut best: Option<(&Fence, f64)> = None;

    for fence in fences {
        let check = check_fence(point, fence.center, fence.radius_m);
        inside_any |= check.inside;
        match best {
            None => best = Some((fence, check.distance_m)),
            Some((_, d)) if check.distance_m < d => best = Some((fence, check.distance_m)),
            _ => {}
        }
    }

    best.map(|(closest, min_distance_m)| FenceDecision { inside_any, min_distance_m, closest })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::FenceId;

    const OFFICE: GeoPoint = GeoPoint { lat: 12.9716, lng: 77.5946 };

    fn fence(id: i32, center: GeoPoint, radius_m: f64) -> Fence {
        Fence { id: FenceId(id), name: format!("FENCE_{id}"), center, radius_m, branch: None }
    }

    #[test]
    fn test_distance_same_point_is_zero() {
        assert_eq!(distance_meters(OFFICE, OFFICE), 0.0);
    }

    #[test]
    fn test_distance_symmetric() {
        let other = GeoPoint::new(12.9800, 77.6000);
        assert_eq!(distance_meters(OFFICE, other), distance_meters(other, OFFICE));
    }

    #[test]
    fn test_known_distance() {
        // 0.001 degrees of latitude is ~111.2 m on a 6371 km sphere
        let north = GeoPoint::new(OFFICE.lat + 0.001, OFFICE.lng);
        let d = distance_meters(OFFICE, north);
        assert!((d - 111.2).abs() < 1.0, "got {d}");
    }

    #[test]
    fn test_boundary_is_inside() {
        let point = GeoPoint::new(OFFICE.lat + 0.001, OFFICE.lng);
        let d = distance_meters(OFFICE, point);

        // A point at exactly the radius is a member
        let check = check_fence(point, OFFICE, d);
        assert!(check.inside);
        assert_eq!(check.distance_m, d);

        let outside = check_fence(point, OFFICE, d - 0.5);
        assert!(!outside.inside);
    }

    #[test]
    fn test_nan_propagates() {
        let bad = GeoPoint::new(f64::NAN, 77.59);
        let check = check_fence(bad, OFFICE, 100.0);
        assert!(check.distance_m.is_nan());
        assert!(!check.inside);
    }

    #[test]
    fn test_evaluate_picks_closest_fence() {
        let near = fence(1, GeoPoint::new(OFFICE.lat + 0.001, OFFICE.lng), 50.0);
        let far = fence(2, GeoPoint::new(OFFICE.lat + 0.01, OFFICE.lng), 5000.0);
        let fences = vec![far, near];

        let decision = evaluate(OFFICE, &fences).unwrap();
        // Closest is the minimum-distance fence regardless of membership
        assert_eq!(decision.closest.id, FenceId(1));
        assert!(decision.inside_any); // the far fence's 5 km radius covers the point
    }

    #[test]
    fn test_evaluate_outside_all() {
        let fences = vec![fence(1, GeoPoint::new(OFFICE.lat + 0.01, OFFICE.lng), 100.0)];
        let decision = evaluate(OFFICE, &fences).unwrap();
        assert!(!decision.inside_any);
        assert!(decision.min_distance_m > 1000.0);
    }

    #[test]
    fn test_evaluate_no_fences() {
        assert!(evaluate(OFFICE, &[]).is_none());
    }
}
