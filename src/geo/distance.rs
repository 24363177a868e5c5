//! Landmark distances.
//!
//! Distances are ellipsoidal (Vincenty's inverse formula on WGS-84). The
//! iteration does not converge for nearly antipodal points; those fall back to
//! the great-circle distance.

use crate::domain::{Coordinates, EnrichedListing, RawListing, LANDMARK_COUNT, NO_DISTANCE_KM};

/// Reference points in Rosario, in output column order.
pub const LANDMARKS: [Coordinates; LANDMARK_COUNT] = [
    // Universidad Nacional de Rosario
    Coordinates {
        latitude: -32.94002703733129,
        longitude: -60.66512777075645,
    },
    // Hospital Provincial
    Coordinates {
        latitude: -32.95532893189587,
        longitude: -60.629488104849905,
    },
    // Hospital Eva Perón (Baigorria)
    Coordinates {
        latitude: -32.855384310532656,
        longitude: -60.704628940365566,
    },
    // Hospital de Niños Víctor J. Vilela
    Coordinates {
        latitude: -32.96587782771106,
        longitude: -60.65125791535292,
    },
    // Hospital Carrasco
    Coordinates {
        latitude: -32.94595943742149,
        longitude: -60.679916866738836,
    },
];

const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);
const MEAN_EARTH_RADIUS_KM: f64 = 6371.0088;
const MAX_ITERATIONS: usize = 200;

/// Geodesic distance in meters between two points.
pub fn geodesic_m(from: Coordinates, to: Coordinates) -> f64 {
    vincenty_m(from, to).unwrap_or_else(|| haversine_km(from, to) * 1000.0)
}

fn vincenty_m(from: Coordinates, to: Coordinates) -> Option<f64> {
    let l = (to.longitude - from.longitude).to_radians();
    let u1 = ((1.0 - WGS84_F) * from.latitude.to_radians().tan()).atan();
    let u2 = ((1.0 - WGS84_F) * to.latitude.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    for _ in 0..MAX_ITERATIONS {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();
        if sin_sigma == 0.0 {
            return Some(0.0);
        }
        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        // Equatorial lines have cos²α = 0.
        let cos_2sigma_m = if cos_sq_alpha == 0.0 {
            0.0
        } else {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        };
        let c = WGS84_F / 16.0 * cos_sq_alpha * (4.0 + WGS84_F * (4.0 - 3.0 * cos_sq_alpha));
        let previous = lambda;
        lambda = l
            + (1.0 - c)
                * WGS84_F
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))));

        if (lambda - previous).abs() < 1e-12 {
            let u_sq = cos_sq_alpha * (WGS84_A.powi(2) - WGS84_B.powi(2)) / WGS84_B.powi(2);
            let a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
            let b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
            let delta_sigma = b
                * sin_sigma
                * (cos_2sigma_m
                    + b / 4.0
                        * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))
                            - b / 6.0
                                * cos_2sigma_m
                                * (-3.0 + 4.0 * sin_sigma.powi(2))
                                * (-3.0 + 4.0 * cos_2sigma_m.powi(2))));
            return Some(WGS84_B * a * (sigma - delta_sigma));
        }
    }
    None
}

/// Great-circle distance in kilometers.
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let dlat = (to.latitude - from.latitude).to_radians();
    let dlng = (to.longitude - from.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + from.latitude.to_radians().cos() * to.latitude.to_radians().cos() * (dlng / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    MEAN_EARTH_RADIUS_KM * c
}

fn round_3(km: f64) -> f64 {
    (km * 1000.0).round() / 1000.0
}

/// Distances in kilometers, rounded to the meter, from `point` to every
/// landmark. A missing or invalid point yields the sentinel everywhere.
pub fn landmark_distances(point: Option<Coordinates>) -> [f64; LANDMARK_COUNT] {
    let mut out = [NO_DISTANCE_KM; LANDMARK_COUNT];
    let Some(point) = point.filter(Coordinates::is_valid) else {
        return out;
    };
    for (slot, landmark) in out.iter_mut().zip(LANDMARKS) {
        *slot = round_3(geodesic_m(point, landmark) / 1000.0);
    }
    out
}

/// Attaches coordinates and landmark distances to each listing.
pub struct DistanceCalculator;

impl DistanceCalculator {
    pub fn enrich(resolved: Vec<(RawListing, Option<Coordinates>)>) -> Vec<EnrichedListing> {
        resolved
            .into_iter()
            .map(|(listing, coordinates)| {
                let coordinates = coordinates.filter(Coordinates::is_valid);
                EnrichedListing {
                    listing,
                    distances_km: landmark_distances(coordinates),
                    coordinates,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(latitude: f64, longitude: f64) -> Coordinates {
        Coordinates { latitude, longitude }
    }

    #[test]
    fn vincenty_reference_line() {
        // Flinders Peak to Buninyong, the classic published test line.
        let flinders = at(-37.0 - 57.0 / 60.0 - 3.72030 / 3600.0, 144.0 + 25.0 / 60.0 + 29.52440 / 3600.0);
        let buninyong = at(-37.0 - 39.0 / 60.0 - 10.15610 / 3600.0, 143.0 + 55.0 / 60.0 + 35.38390 / 3600.0);
        let d = geodesic_m(flinders, buninyong);
        assert!((d - 54_972.271).abs() < 0.01, "got {d}");
    }

    #[test]
    fn same_point_is_zero() {
        assert_eq!(landmark_distances(Some(LANDMARKS[0]))[0], 0.0);
    }

    #[test]
    fn distances_are_rounded_and_close_to_haversine() {
        let p = at(-32.9468, -60.6393);
        let d = landmark_distances(Some(p));
        for (km, landmark) in d.iter().zip(LANDMARKS.iter()) {
            assert_eq!(*km, round_3(*km));
            let approx = haversine_km(p, *landmark);
            assert!((km - approx).abs() < approx * 0.01 + 0.001, "{} vs {}", km, approx);
        }
    }

    #[test]
    fn missing_or_invalid_point_gets_sentinel() {
        assert_eq!(landmark_distances(None), [NO_DISTANCE_KM; LANDMARK_COUNT]);
        assert_eq!(landmark_distances(Some(at(123.0, 0.0))), [NO_DISTANCE_KM; LANDMARK_COUNT]);
    }

    #[test]
    fn enrich_drops_invalid_coordinates() {
        use crate::scraper::Source;
        use chrono::NaiveDateTime;

        let l = RawListing::placeholder(Source::ZonaProp, "casas", "rosario", "santa fe", NaiveDateTime::default());
        let out = DistanceCalculator::enrich(vec![(l, Some(at(f64::NAN, 0.0)))]);
        assert_eq!(out[0].coordinates, None);
        assert_eq!(out[0].distances_km, [NO_DISTANCE_KM; LANDMARK_COUNT]);
    }
}
