//! Test-only, in-memory `CandidateStore` implementations used by unit and
//! behaviour tests.

use std::sync::{Mutex, PoisonError};

use geo::{Coord, Intersects, Rect};
use thiserror::Error;

use crate::{CandidateStore, LocatedRecord};

/// Minimal located record with nullable coordinates.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Place {
    /// Caller-assigned identifier.
    pub id: u64,
    /// Display name, empty when not needed.
    pub name: String,
    /// Latitude in degrees.
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    pub longitude: Option<f64>,
}

impl Place {
    /// Create an unnamed place at `latitude`, `longitude`.
    #[must_use]
    pub fn at(id: u64, latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            ..Self::unlocated(id)
        }
    }

    /// Create a named place at `latitude`, `longitude`.
    #[must_use]
    pub fn named(id: u64, name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::at(id, latitude, longitude)
        }
    }

    /// Create a place with neither coordinate set.
    #[must_use]
    pub const fn unlocated(id: u64) -> Self {
        Self {
            id,
            name: String::new(),
            latitude: None,
            longitude: None,
        }
    }
}

impl LocatedRecord for Place {
    fn coordinates(&self) -> Option<Coord<f64>> {
        Some(Coord {
            x: self.longitude?,
            y: self.latitude?,
        })
    }
}

/// In-memory `CandidateStore` that scans its places linearly.
///
/// The store remembers the cap of the most recent fetch so tests can
/// assert on the over-fetch factor.
#[derive(Default, Debug)]
pub struct MemoryStore {
    places: Vec<Place>,
    last_cap: Mutex<Option<usize>>,
}

impl MemoryStore {
    /// Create a store from a collection of places, kept in iteration order.
    #[must_use]
    pub fn with_places<I>(places: I) -> Self
    where
        I: IntoIterator<Item = Place>,
    {
        Self {
            places: places.into_iter().collect(),
            last_cap: Mutex::new(None),
        }
    }

    /// Cap passed to the most recent [`CandidateStore::fetch_candidates`].
    #[must_use]
    pub fn last_cap(&self) -> Option<usize> {
        *self.last_cap.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CandidateStore for MemoryStore {
    type Record = Place;
    type Error = std::convert::Infallible;

    fn fetch_candidates(&self, bbox: &Rect<f64>, cap: usize) -> Result<Vec<Place>, Self::Error> {
        *self.last_cap.lock().unwrap_or_else(PoisonError::into_inner) = Some(cap);
        Ok(self
            .places
            .iter()
            .filter(|place| {
                place
                    .coordinates()
                    // `Intersects` treats boundary points as inside the rectangle.
                    .is_some_and(|location| bbox.intersects(&location))
            })
            .take(cap)
            .cloned()
            .collect())
    }
}

/// Error raised by [`FailingStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("candidate store unavailable")]
pub struct StoreUnavailable;

/// `CandidateStore` whose every fetch fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingStore;

impl CandidateStore for FailingStore {
    type Record = Place;
    type Error = StoreUnavailable;

    fn fetch_candidates(&self, _bbox: &Rect<f64>, _cap: usize) -> Result<Vec<Place>, Self::Error> {
        Err(StoreUnavailable)
    }
}
