//! Candidate retrieval for proximity queries.
//!
//! The [`CandidateStore`] trait is the only capability the resolver needs
//! from a record store: a capped bounding-box fetch.

use geo::Rect;

use crate::LocatedRecord;

/// Read-only access to located records by bounding box.
///
/// The bounding box uses WGS84 coordinates (`x = longitude`,
/// `y = latitude`). Containment includes boundary points. Implementations
/// MUST exclude records whose latitude or longitude is null and MUST return
/// at most `cap` records.
///
/// Antimeridian note: regions crossing ±180 are not modelled. The resolver
/// clamps its boxes, so implementations never receive `min.x > max.x`.
///
/// # Examples
///
/// ```rust
/// use std::convert::Infallible;
/// use geo::{Coord, Intersects, Rect};
/// use stalela_core::CandidateStore;
///
/// struct Points(Vec<Coord<f64>>);
///
/// impl CandidateStore for Points {
///     type Record = Coord<f64>;
///     type Error = Infallible;
///
///     fn fetch_candidates(
///         &self,
///         bbox: &Rect<f64>,
///         cap: usize,
///     ) -> Result<Vec<Coord<f64>>, Infallible> {
///         Ok(self
///             .0
///             .iter()
///             // `Intersects` treats boundary points as inside the rectangle.
///             .filter(|p| bbox.intersects(*p))
///             .take(cap)
///             .copied()
///             .collect())
///     }
/// }
///
/// let store = Points(vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 5.0, y: 5.0 }]);
/// let bbox = Rect::new(Coord { x: -1.0, y: -1.0 }, Coord { x: 1.0, y: 1.0 });
/// assert_eq!(store.fetch_candidates(&bbox, 10).map(|v| v.len()), Ok(1));
/// ```
pub trait CandidateStore {
    /// Record type returned by the store.
    type Record: LocatedRecord;
    /// Failure raised when the store cannot answer the query.
    type Error: std::error::Error + 'static;

    /// Return up to `cap` records whose coordinates fall inside `bbox`.
    ///
    /// # Errors
    /// Returns the store's error when the query cannot be executed. Partial
    /// results are never returned alongside an error.
    fn fetch_candidates(
        &self,
        bbox: &Rect<f64>,
        cap: usize,
    ) -> Result<Vec<Self::Record>, Self::Error>;
}

impl<S: CandidateStore + ?Sized> CandidateStore for &S {
    type Record = S::Record;
    type Error = S::Error;

    fn fetch_candidates(
        &self,
        bbox: &Rect<f64>,
        cap: usize,
    ) -> Result<Vec<Self::Record>, Self::Error> {
        (**self).fetch_candidates(bbox, cap)
    }
}

#[cfg(test)]
mod tests {
    use super::CandidateStore;
    use crate::test_support::{MemoryStore, Place};
    use geo::{Coord, Rect};
    use rstest::rstest;

    fn unit_box() -> Rect<f64> {
        Rect::new(Coord { x: -1.0, y: -1.0 }, Coord { x: 1.0, y: 1.0 })
    }

    #[rstest]
    fn returns_places_inside_bbox() {
        let place = Place::at(1, 0.0, 0.0);
        let store = MemoryStore::with_places([place.clone(), Place::at(2, 5.0, 5.0)]);
        let found = store.fetch_candidates(&unit_box(), 10).expect("fetch");
        assert_eq!(found, vec![place]);
    }

    #[rstest]
    #[case(Coord { x: -1.0, y: 0.0 })] // left edge
    #[case(Coord { x: 1.0, y: 0.0 })] // right edge
    #[case(Coord { x: 0.0, y: -1.0 })] // bottom edge
    #[case(Coord { x: 0.0, y: 1.0 })] // top edge
    #[case(Coord { x: 1.0, y: 1.0 })] // corner
    fn includes_places_on_the_boundary(#[case] location: Coord<f64>) {
        let place = Place::at(7, location.y, location.x);
        let store = MemoryStore::with_places([place.clone()]);
        let found = store.fetch_candidates(&unit_box(), 10).expect("fetch");
        assert_eq!(found, vec![place]);
    }

    #[rstest]
    fn excludes_places_without_coordinates() {
        let store = MemoryStore::with_places([
            Place::unlocated(1),
            Place {
                latitude: Some(0.0),
                ..Place::unlocated(2)
            },
        ]);
        let found = store.fetch_candidates(&unit_box(), 10).expect("fetch");
        assert!(found.is_empty());
    }

    #[rstest]
    fn honours_the_cap_in_insertion_order() {
        let store = MemoryStore::with_places((1..=5).map(|id| Place::at(id, 0.0, 0.0)));
        let found = store.fetch_candidates(&unit_box(), 3).expect("fetch");
        let ids: Vec<_> = found.iter().map(|place| place.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(store.last_cap(), Some(3));
    }
}
