//! Spherical distance helpers.
//!
//! All distances use a spherical Earth with the mean radius
//! [`EARTH_RADIUS_KM`]. Callers needing ellipsoidal precision should use a
//! geodesic implementation instead.

use geo::{Coord, Rect};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Approximate length of one degree of latitude in kilometres.
pub const KM_PER_DEGREE: f64 = 111.32;

/// Great-circle distance between two points in kilometres (Haversine).
///
/// The result is not rounded; see [`round_km`]. Non-finite inputs yield
/// `NaN`.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use stalela_core::haversine_km;
///
/// let origin = Coord { x: 0.0, y: 0.0 };
/// assert_eq!(haversine_km(origin, origin), 0.0);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "the Haversine formula is floating-point trigonometry"
)]
pub fn haversine_km(from: Coord<f64>, to: Coord<f64>) -> f64 {
    let d_lat = (to.y - from.y).to_radians();
    let d_lng = (to.x - from.x).to_radians();
    let half_chord = (d_lat / 2.0).sin().powi(2)
        + from.y.to_radians().cos() * to.y.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    // Rounding can push near-antipodal points fractionally above 1.
    let half_chord = half_chord.clamp(0.0, 1.0);
    EARTH_RADIUS_KM * 2.0 * half_chord.sqrt().atan2((1.0 - half_chord).sqrt())
}

/// Round a distance to two decimal places, ties away from zero.
///
/// # Examples
///
/// ```
/// use stalela_core::round_km;
///
/// assert_eq!(round_km(10.771_247), 10.77);
/// assert_eq!(round_km(2.345_6), 2.35);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "fixed-point rounding scales by one hundred"
)]
pub fn round_km(km: f64) -> f64 {
    (km * 100.0).round() / 100.0
}

/// Axis-aligned box that approximately contains every point within
/// `radius_km` of `center`.
///
/// The widening uses [`KM_PER_DEGREE`], which is slightly longer than a
/// degree on the [`EARTH_RADIUS_KM`] sphere, and ignores the way a circle
/// bulges past its centre latitude at high latitudes. Points right at the
/// edge of the radius can therefore fall just outside the box.
///
/// Latitude is widened by `radius_km / 111.32` degrees and longitude by the
/// same amount scaled with `1 / cos(latitude)`. The box is clamped to the
/// valid coordinate range, so queries near the poles degrade to a full
/// longitude band. Regions crossing the antimeridian are clamped at ±180
/// rather than split.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use stalela_core::search_bounds;
///
/// let bounds = search_bounds(Coord { x: 0.0, y: 0.0 }, 111.32);
/// assert!((bounds.max().y - 1.0).abs() < 1e-9);
/// assert!((bounds.min().x + 1.0).abs() < 1e-9);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "degree deltas are derived from the radius in kilometres"
)]
pub fn search_bounds(center: Coord<f64>, radius_km: f64) -> Rect<f64> {
    let lat_delta = radius_km / KM_PER_DEGREE;
    let lng_delta = lat_delta / center.y.to_radians().cos();

    let min = Coord {
        x: (center.x - lng_delta).clamp(-180.0, 180.0),
        y: (center.y - lat_delta).clamp(-90.0, 90.0),
    };
    let max = Coord {
        x: (center.x + lng_delta).clamp(-180.0, 180.0),
        y: (center.y + lat_delta).clamp(-90.0, 90.0),
    };
    Rect::new(min, max)
}
