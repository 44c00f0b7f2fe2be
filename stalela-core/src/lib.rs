//! Geo-proximity primitives for the Stalela data layer.
//!
//! The crate is storage-agnostic. A record source implements
//! [`CandidateStore`] to answer coarse bounding-box queries, and
//! [`ProximityResolver`] refines those candidates with exact great-circle
//! distances.
//!
//! Coordinates follow the `geo` convention: `x = longitude`,
//! `y = latitude`, both in WGS84 degrees.
//!
//! # Examples
//!
//! ```
//! use geo::Coord;
//! use stalela_core::{haversine_km, round_km};
//!
//! let johannesburg = Coord { x: 28.0473, y: -26.2041 };
//! let cape_town = Coord { x: 18.4241, y: -33.9249 };
//! let km = round_km(haversine_km(johannesburg, cape_town));
//! assert!((km - 1261.58).abs() < 0.01);
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod distance;
mod location;
mod proximity;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use distance::{EARTH_RADIUS_KM, KM_PER_DEGREE, haversine_km, round_km, search_bounds};
pub use location::LocatedRecord;
pub use proximity::{
    DEFAULT_NEARBY_LIMIT, NearbyQuery, OVER_FETCH_FACTOR, ProximityError, ProximityResolver,
    ProximityResult,
};
pub use store::CandidateStore;
