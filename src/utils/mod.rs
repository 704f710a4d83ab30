pub mod parallel;

use geo_types::Coord;

/// Squared distance between two coordinates.
#[inline]
pub fn dist2(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

/// Lexicographic (x, then y) ordering of coordinates, treating NaN as equal.
#[inline]
pub fn cmp_coords(a: &Coord<f64>, b: &Coord<f64>) -> std::cmp::Ordering {
    a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal)
        .then(a.y.partial_cmp(&b.y).unwrap_or(std::cmp::Ordering::Equal))
}
