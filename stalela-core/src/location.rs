use geo::Coord;

/// A record that may carry a geographic position.
///
/// Stores usually hold latitude and longitude in separate nullable
/// columns. Implementations return `None` when either is missing, which
/// keeps the record out of proximity results.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use stalela_core::LocatedRecord;
///
/// struct Shop {
///     latitude: Option<f64>,
///     longitude: Option<f64>,
/// }
///
/// impl LocatedRecord for Shop {
///     fn coordinates(&self) -> Option<Coord<f64>> {
///         Some(Coord { x: self.longitude?, y: self.latitude? })
///     }
/// }
///
/// let shop = Shop { latitude: Some(-26.2), longitude: None };
/// assert!(shop.coordinates().is_none());
/// ```
pub trait LocatedRecord {
    /// Position as `x = longitude`, `y = latitude`, or `None` when either
    /// coordinate is absent.
    fn coordinates(&self) -> Option<Coord<f64>>;
}

impl LocatedRecord for Coord<f64> {
    fn coordinates(&self) -> Option<Coord<f64>> {
        Some(*self)
    }
}

impl<T: LocatedRecord> LocatedRecord for &T {
    fn coordinates(&self) -> Option<Coord<f64>> {
        (**self).coordinates()
    }
}
