//! Facade crate for the Stalela data layer.
//!
//! This crate re-exports the geo-proximity primitives and, behind the
//! `store-sqlite` feature, the SQLite-backed table facades.

#![forbid(unsafe_code)]

pub use stalela_core::{
    CandidateStore, DEFAULT_NEARBY_LIMIT, LocatedRecord, NearbyQuery, ProximityError,
    ProximityResolver, ProximityResult, haversine_km, round_km, search_bounds,
};

#[cfg(feature = "test-support")]
pub use stalela_core::test_support;

#[cfg(feature = "store-sqlite")]
pub use stalela_store::{
    BoundingBoxQuery, Companies, Company, CompanyPin, CompanySource, Database, DatabaseConfig,
    StoreError,
};
