//! Radius search over a [`CandidateStore`].
//!
//! The resolver runs in two phases. A bounding box sized from the radius
//! selects at most `limit * OVER_FETCH_FACTOR` candidates from the store,
//! then exact Haversine distances filter, rank and truncate them in
//! process.
//!
//! The over-fetch is a heuristic. When the box holds more than
//! `limit * OVER_FETCH_FACTOR` records, true matches outside the fetched
//! subset are never seen and the result may hold fewer than `limit`
//! records even though more exist within the radius.

use geo::Coord;
use log::{debug, warn};
use thiserror::Error;

use crate::{CandidateStore, LocatedRecord, haversine_km, round_km, search_bounds};

/// Number of results returned when a query does not set a limit.
pub const DEFAULT_NEARBY_LIMIT: usize = 10;

/// Multiplier applied to `limit` when fetching coarse candidates.
pub const OVER_FETCH_FACTOR: usize = 3;

/// Parameters for [`ProximityResolver::find_nearby`].
///
/// # Examples
/// ```
/// use geo::Coord;
/// use stalela_core::NearbyQuery;
///
/// let query = NearbyQuery::new(Coord { x: 28.0473, y: -26.2041 }, 50.0).with_limit(5);
/// assert_eq!(query.limit, 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyQuery {
    /// Search centre (`x = longitude`, `y = latitude`).
    pub center: Coord<f64>,
    /// Inclusive search radius in kilometres.
    pub radius_km: f64,
    /// Maximum number of results.
    pub limit: usize,
}

impl NearbyQuery {
    /// Build a query returning at most [`DEFAULT_NEARBY_LIMIT`] results.
    #[must_use]
    pub const fn new(center: Coord<f64>, radius_km: f64) -> Self {
        Self {
            center,
            radius_km,
            limit: DEFAULT_NEARBY_LIMIT,
        }
    }

    /// Replace the result limit.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    fn validate(&self) -> Result<(), &'static str> {
        let Coord { x: lng, y: lat } = self.center;
        let reason = if !lat.is_finite() || !lng.is_finite() {
            "centre coordinates must be finite"
        } else if !(-90.0..=90.0).contains(&lat) {
            "centre latitude must lie within [-90, 90]"
        } else if !(-180.0..=180.0).contains(&lng) {
            "centre longitude must lie within [-180, 180]"
        } else if self.radius_km.is_nan() || self.radius_km < 0.0 {
            "radius must be zero or positive"
        } else if self.limit == 0 {
            "limit must be positive"
        } else {
            return Ok(());
        };
        Err(reason)
    }
}

/// A record decorated with its distance from the query centre.
///
/// With the `serde` feature the record's fields are flattened alongside
/// `distance_km`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProximityResult<R> {
    /// The matching record, unchanged.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub record: R,
    /// Great-circle distance from the centre, rounded to two decimals.
    pub distance_km: f64,
}

/// Errors returned by [`ProximityResolver::find_nearby`].
#[derive(Debug, Error)]
pub enum ProximityError<E>
where
    E: std::error::Error + 'static,
{
    /// The coarse candidate fetch failed.
    #[error("failed to fetch proximity candidates: {0}")]
    Store(#[source] E),
    /// The query parameters were rejected before touching the store.
    #[error("invalid proximity query: {reason}")]
    InvalidInput {
        /// Which parameter was rejected.
        reason: &'static str,
    },
}

/// Finds the records nearest to a point within a radius.
///
/// The resolver is stateless apart from its store handle, so concurrent
/// calls are independent.
///
/// # Examples
/// ```
/// use std::convert::Infallible;
/// use geo::{Coord, Intersects, Rect};
/// use stalela_core::{CandidateStore, NearbyQuery, ProximityResolver};
///
/// struct Points(Vec<Coord<f64>>);
///
/// impl CandidateStore for Points {
///     type Record = Coord<f64>;
///     type Error = Infallible;
///
///     fn fetch_candidates(&self, bbox: &Rect<f64>, cap: usize) -> Result<Vec<Coord<f64>>, Infallible> {
///         Ok(self.0.iter().filter(|p| bbox.intersects(*p)).take(cap).copied().collect())
///     }
/// }
///
/// let resolver = ProximityResolver::new(Points(vec![
///     Coord { x: 28.0567, y: -26.1076 },
///     Coord { x: 18.4241, y: -33.9249 },
/// ]));
/// let query = NearbyQuery::new(Coord { x: 28.0473, y: -26.2041 }, 50.0);
/// let found = resolver.find_nearby(&query).expect("in-memory store cannot fail");
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].distance_km, 10.77);
/// ```
#[derive(Debug, Clone)]
pub struct ProximityResolver<S> {
    store: S,
}

impl<S: CandidateStore> ProximityResolver<S> {
    /// Wrap a store handle.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrow the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Return up to `query.limit` records within `query.radius_km`,
    /// nearest first.
    ///
    /// Records at equal distance keep the order the store returned them
    /// in. An empty result is a success.
    ///
    /// # Errors
    /// Returns [`ProximityError::InvalidInput`] for non-finite or
    /// out-of-range centres, negative or `NaN` radii and a zero limit.
    /// Store failures are wrapped in [`ProximityError::Store`] without
    /// retrying.
    pub fn find_nearby(
        &self,
        query: &NearbyQuery,
    ) -> Result<Vec<ProximityResult<S::Record>>, ProximityError<S::Error>> {
        query
            .validate()
            .map_err(|reason| ProximityError::InvalidInput { reason })?;

        let bounds = search_bounds(query.center, query.radius_km);
        let cap = query.limit.saturating_mul(OVER_FETCH_FACTOR);
        let candidates = self
            .store
            .fetch_candidates(&bounds, cap)
            .map_err(ProximityError::Store)?;
        let fetched = candidates.len();

        let mut matches: Vec<_> = candidates
            .into_iter()
            .filter_map(|record| {
                let Some(location) = record.coordinates() else {
                    warn!("store returned a proximity candidate without coordinates");
                    return None;
                };
                let distance_km = round_km(haversine_km(query.center, location));
                (distance_km <= query.radius_km).then_some(ProximityResult {
                    record,
                    distance_km,
                })
            })
            .collect();

        matches.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        matches.truncate(query.limit);

        debug!(
            "proximity search within {} km: {} candidates, {} returned",
            query.radius_km,
            fetched,
            matches.len()
        );
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailingStore, MemoryStore, Place};
    use proptest::prelude::*;
    use rstest::{fixture, rstest};

    const JOHANNESBURG: Coord<f64> = Coord {
        x: 28.0473,
        y: -26.2041,
    };

    #[fixture]
    fn gauteng() -> MemoryStore {
        MemoryStore::with_places([
            Place::named(1, "Cape Town", -33.9249, 18.4241),
            Place::named(2, "Rosebank", -26.1458, 28.0416),
            Place::named(3, "Sandton", -26.1076, 28.0567),
            Place::named(4, "Centre", -26.2041, 28.0473),
            Place::named(5, "Pretoria", -25.7479, 28.2293),
            Place::unlocated(6),
        ])
    }

    fn ids<R>(results: &[ProximityResult<R>], id: impl Fn(&R) -> u64) -> Vec<u64> {
        results.iter().map(|r| id(&r.record)).collect()
    }

    #[rstest]
    fn orders_matches_nearest_first(gauteng: MemoryStore) {
        let resolver = ProximityResolver::new(&gauteng);
        let found = resolver
            .find_nearby(&NearbyQuery::new(JOHANNESBURG, 100.0))
            .expect("search");
        assert_eq!(ids(&found, |p: &Place| p.id), vec![4, 2, 3, 5]);
        assert!(found.windows(2).all(|w| w[0].distance_km <= w[1].distance_km));
    }

    #[rstest]
    fn excludes_candidates_outside_the_radius(gauteng: MemoryStore) {
        let resolver = ProximityResolver::new(&gauteng);
        let found = resolver
            .find_nearby(&NearbyQuery::new(JOHANNESBURG, 50.0))
            .expect("search");
        assert!(found.iter().all(|r| r.distance_km <= 50.0));
        assert!(found.iter().all(|r| r.record.id != 1 && r.record.id != 5));
    }

    #[rstest]
    fn sandton_is_about_eleven_kilometres_away(gauteng: MemoryStore) {
        let resolver = ProximityResolver::new(&gauteng);
        let found = resolver
            .find_nearby(&NearbyQuery::new(JOHANNESBURG, 50.0))
            .expect("search");
        let sandton = found
            .iter()
            .find(|r| r.record.id == 3)
            .expect("Sandton should be within 50 km");
        assert_eq!(sandton.distance_km, 10.77);
    }

    #[rstest]
    fn truncates_to_the_limit(gauteng: MemoryStore) {
        let resolver = ProximityResolver::new(&gauteng);
        let query = NearbyQuery::new(JOHANNESBURG, 100.0).with_limit(2);
        let found = resolver.find_nearby(&query).expect("search");
        assert_eq!(ids(&found, |p: &Place| p.id), vec![4, 2]);
    }

    #[rstest]
    fn over_fetches_three_times_the_limit(gauteng: MemoryStore) {
        let resolver = ProximityResolver::new(&gauteng);
        let query = NearbyQuery::new(JOHANNESBURG, 100.0).with_limit(4);
        resolver.find_nearby(&query).expect("search");
        assert_eq!(gauteng.last_cap(), Some(12));
    }

    #[rstest]
    fn zero_radius_returns_only_colocated_records(gauteng: MemoryStore) {
        let resolver = ProximityResolver::new(&gauteng);
        let found = resolver
            .find_nearby(&NearbyQuery::new(JOHANNESBURG, 0.0))
            .expect("search");
        assert_eq!(ids(&found, |p: &Place| p.id), vec![4]);
        assert_eq!(found[0].distance_km, 0.0);
    }

    #[rstest]
    fn under_fill_is_not_padded(gauteng: MemoryStore) {
        let resolver = ProximityResolver::new(&gauteng);
        let query = NearbyQuery::new(JOHANNESBURG, 20.0).with_limit(10);
        let found = resolver.find_nearby(&query).expect("search");
        assert_eq!(ids(&found, |p: &Place| p.id), vec![4, 2, 3]);
    }

    #[rstest]
    fn empty_store_is_a_successful_empty_result() {
        let store = MemoryStore::default();
        let resolver = ProximityResolver::new(&store);
        let found = resolver
            .find_nearby(&NearbyQuery::new(JOHANNESBURG, 50.0))
            .expect("search");
        assert!(found.is_empty());
    }

    #[rstest]
    fn ties_keep_store_order() {
        let store = MemoryStore::with_places([
            Place::at(9, -26.0, 28.0),
            Place::at(3, -26.0, 28.0),
            Place::at(5, -26.0, 28.0),
        ]);
        let resolver = ProximityResolver::new(&store);
        let found = resolver
            .find_nearby(&NearbyQuery::new(JOHANNESBURG, 50.0))
            .expect("search");
        assert_eq!(ids(&found, |p: &Place| p.id), vec![9, 3, 5]);
    }

    #[rstest]
    fn overfetch_heuristic_can_under_fill() {
        // Twelve far-but-inside-the-box records precede the one true match,
        // so a limit of four (cap twelve) never sees it.
        let corner = Place::at(100, -26.2041 + 0.44, 28.0473 + 0.49);
        let mut places: Vec<_> = (0..12).map(|id| Place { id, ..corner.clone() }).collect();
        places.push(Place::at(99, -26.2041, 28.0473));
        let store = MemoryStore::with_places(places);
        let resolver = ProximityResolver::new(&store);
        let query = NearbyQuery::new(JOHANNESBURG, 50.0).with_limit(4);
        let found = resolver.find_nearby(&query).expect("search");
        assert!(found.is_empty(), "box corners lie outside the circle");
    }

    #[rstest]
    fn store_failures_propagate() {
        let resolver = ProximityResolver::new(FailingStore);
        let err = resolver
            .find_nearby(&NearbyQuery::new(JOHANNESBURG, 10.0))
            .expect_err("store failure should surface");
        assert!(matches!(err, ProximityError::Store(_)));
    }

    #[rstest]
    #[case::nan_latitude(Coord { x: 28.0, y: f64::NAN }, 10.0, 10)]
    #[case::infinite_longitude(Coord { x: f64::INFINITY, y: -26.0 }, 10.0, 10)]
    #[case::latitude_out_of_range(Coord { x: 28.0, y: 91.0 }, 10.0, 10)]
    #[case::longitude_out_of_range(Coord { x: -180.5, y: 0.0 }, 10.0, 10)]
    #[case::negative_radius(Coord { x: 28.0, y: -26.0 }, -1.0, 10)]
    #[case::nan_radius(Coord { x: 28.0, y: -26.0 }, f64::NAN, 10)]
    #[case::zero_limit(Coord { x: 28.0, y: -26.0 }, 10.0, 0)]
    fn rejects_invalid_queries_without_querying(
        #[case] center: Coord<f64>,
        #[case] radius_km: f64,
        #[case] limit: usize,
    ) {
        let resolver = ProximityResolver::new(FailingStore);
        let query = NearbyQuery::new(center, radius_km).with_limit(limit);
        let err = resolver
            .find_nearby(&query)
            .expect_err("invalid query should fail");
        assert!(matches!(err, ProximityError::InvalidInput { .. }));
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn serialises_record_fields_flat() {
        let result = ProximityResult {
            record: Place::named(4, "Centre", -26.2041, 28.0473),
            distance_km: 1.5,
        };
        let json = serde_json::to_value(&result).expect("serialise");
        assert_eq!(json["name"], "Centre");
        assert_eq!(json["distance_km"], 1.5);
        assert!(json.get("record").is_none());
    }

    proptest! {
        #[test]
        fn haversine_is_symmetric(
            lat_a in -90.0f64..=90.0,
            lng_a in -180.0f64..=180.0,
            lat_b in -90.0f64..=90.0,
            lng_b in -180.0f64..=180.0,
        ) {
            let a = Coord { x: lng_a, y: lat_a };
            let b = Coord { x: lng_b, y: lat_b };
            prop_assert_eq!(round_km(haversine_km(a, b)), round_km(haversine_km(b, a)));
        }

        #[test]
        fn results_respect_radius_order_and_cap(
            points in prop::collection::vec((-27.0f64..=-25.5, 27.5f64..=28.6), 0..40),
            radius_km in 0.0f64..=150.0,
            limit in 1usize..=15,
        ) {
            let store = MemoryStore::with_places(
                points.iter().zip(0u64..).map(|(&(lat, lng), id)| Place::at(id, lat, lng)),
            );
            let resolver = ProximityResolver::new(&store);
            let query = NearbyQuery::new(JOHANNESBURG, radius_km).with_limit(limit);
            let found = resolver.find_nearby(&query).expect("in-memory store");
            prop_assert!(found.len() <= limit);
            prop_assert!(found.iter().all(|r| r.distance_km <= radius_km));
            prop_assert!(found.windows(2).all(|w| w[0].distance_km <= w[1].distance_km));
        }
    }
}
