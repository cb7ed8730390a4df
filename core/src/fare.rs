//! Fare settlement: distance-based pricing.

use crate::geo::{self, Point};
use crate::params::FARE_RATE;

/// Fare for a trip from `source` to `destination`.
///
/// Formula: `floor(distance * FARE_RATE)`, in whole monetary units. Pure;
/// a zero-length trip bills zero.
pub fn fare(source: Point, destination: Point) -> u64 {
    (geo::distance(source, destination) * FARE_RATE as f64).floor() as u64
}
