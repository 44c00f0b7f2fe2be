//! Behavioural tests for `ProximityResolver` using rstest-bdd.

use std::{cell::RefCell, convert::Infallible};

use geo::{Coord, Intersects, Rect};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use stalela_core::{
    CandidateStore, LocatedRecord, NearbyQuery, ProximityError, ProximityResolver,
    ProximityResult,
};

const CENTRAL_JOHANNESBURG: Coord<f64> = Coord {
    x: 28.0473,
    y: -26.2041,
};

#[derive(Debug, Clone, PartialEq)]
struct Site {
    name: &'static str,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl Site {
    const fn at(name: &'static str, latitude: f64, longitude: f64) -> Self {
        Self {
            name,
            latitude: Some(latitude),
            longitude: Some(longitude),
        }
    }
}

impl LocatedRecord for Site {
    fn coordinates(&self) -> Option<Coord<f64>> {
        Some(Coord {
            x: self.longitude?,
            y: self.latitude?,
        })
    }
}

/// Returns unlocated sites alongside boxed ones when `leaky` is set.
#[derive(Debug, Default)]
struct SiteStore {
    sites: Vec<Site>,
    leaky: bool,
}

impl CandidateStore for SiteStore {
    type Record = Site;
    type Error = Infallible;

    fn fetch_candidates(&self, bbox: &Rect<f64>, cap: usize) -> Result<Vec<Site>, Infallible> {
        Ok(self
            .sites
            .iter()
            .filter(|site| match site.coordinates() {
                Some(location) => bbox.intersects(&location),
                None => self.leaky,
            })
            .take(cap)
            .cloned()
            .collect())
    }
}

type Outcome = Result<Vec<ProximityResult<Site>>, ProximityError<Infallible>>;

#[derive(Debug, Default)]
struct NearbyWorld {
    store: RefCell<SiteStore>,
    outcome: RefCell<Option<Outcome>>,
}

impl NearbyWorld {
    fn search(&self, query: NearbyQuery) {
        let store = self.store.borrow();
        let outcome = ProximityResolver::new(&*store).find_nearby(&query);
        self.outcome.replace(Some(outcome));
    }

    fn names(&self) -> Vec<&'static str> {
        self.outcome
            .borrow()
            .as_ref()
            .expect("a search should have run")
            .as_ref()
            .expect("the search should succeed")
            .iter()
            .map(|result| result.record.name)
            .collect()
    }
}

#[fixture]
fn world() -> NearbyWorld {
    NearbyWorld::default()
}

fn landmarks() -> Vec<Site> {
    vec![
        Site::at("Pretoria", -25.7479, 28.2293),
        Site::at("Sandton", -26.1076, 28.0567),
        Site::at("Centre", -26.2041, 28.0473),
        Site::at("Rosebank", -26.1458, 28.0416),
    ]
}

#[given("a store of Johannesburg landmarks")]
fn given_landmarks(world: &NearbyWorld) {
    world.store.replace(SiteStore {
        sites: landmarks(),
        leaky: false,
    });
}

#[given("a store that leaks a record without coordinates")]
fn given_leaky_store(world: &NearbyWorld) {
    world.store.replace(SiteStore {
        sites: vec![
            Site {
                name: "Nowhere",
                latitude: None,
                longitude: Some(28.0473),
            },
            Site::at("Centre", -26.2041, 28.0473),
        ],
        leaky: true,
    });
}

#[given("a store holding only Cape Town")]
fn given_cape_town(world: &NearbyWorld) {
    world.store.replace(SiteStore {
        sites: vec![Site::at("Cape Town", -33.9249, 18.4241)],
        leaky: false,
    });
}

#[when("I search within 50 km of central Johannesburg")]
fn search_fifty(world: &NearbyWorld) {
    world.search(NearbyQuery::new(CENTRAL_JOHANNESBURG, 50.0));
}

#[when("I search within 50 km of central Johannesburg for at most 2 results")]
fn search_fifty_limited(world: &NearbyWorld) {
    world.search(NearbyQuery::new(CENTRAL_JOHANNESBURG, 50.0).with_limit(2));
}

#[when("I search within 0 km of central Johannesburg")]
fn search_zero(world: &NearbyWorld) {
    world.search(NearbyQuery::new(CENTRAL_JOHANNESBURG, 0.0));
}

#[when("I search with a negative radius")]
fn search_negative(world: &NearbyWorld) {
    world.search(NearbyQuery::new(CENTRAL_JOHANNESBURG, -5.0));
}

#[then("the centre, Rosebank and Sandton are returned in that order")]
fn then_three_in_order(world: &NearbyWorld) {
    assert_eq!(world.names(), vec!["Centre", "Rosebank", "Sandton"]);
}

#[then("every returned distance is within 50 km")]
fn then_within_radius(world: &NearbyWorld) {
    let outcome = world.outcome.borrow();
    let results = outcome
        .as_ref()
        .and_then(|outcome| outcome.as_ref().ok())
        .expect("a successful search");
    assert!(results.iter().all(|result| result.distance_km <= 50.0));
}

#[then("only the centre and Rosebank are returned")]
fn then_two(world: &NearbyWorld) {
    assert_eq!(world.names(), vec!["Centre", "Rosebank"]);
}

#[then("only the centre is returned")]
fn then_centre(world: &NearbyWorld) {
    assert_eq!(world.names(), vec!["Centre"]);
}

#[then("its distance is exactly zero")]
fn then_zero_distance(world: &NearbyWorld) {
    let outcome = world.outcome.borrow();
    let results = outcome
        .as_ref()
        .and_then(|outcome| outcome.as_ref().ok())
        .expect("a successful search");
    assert_eq!(results[0].distance_km, 0.0);
}

#[then("the search fails with an invalid input error")]
fn then_invalid(world: &NearbyWorld) {
    let outcome = world.outcome.borrow();
    let error = outcome
        .as_ref()
        .and_then(|outcome| outcome.as_ref().err())
        .expect("the search should fail");
    assert!(matches!(error, ProximityError::InvalidInput { .. }));
}

#[then("no records are returned")]
fn then_empty(world: &NearbyWorld) {
    assert!(world.names().is_empty());
}

#[scenario(path = "tests/features/nearby.feature", index = 0)]
fn nearest_first(world: NearbyWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/nearby.feature", index = 1)]
fn truncated_to_limit(world: NearbyWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/nearby.feature", index = 2)]
fn unlocated_records_skipped(world: NearbyWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/nearby.feature", index = 3)]
fn zero_radius(world: NearbyWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/nearby.feature", index = 4)]
fn negative_radius_rejected(world: NearbyWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/nearby.feature", index = 5)]
fn distant_records_excluded(world: NearbyWorld) {
    let _ = world;
}
