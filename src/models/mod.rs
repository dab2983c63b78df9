//! Data models for the nearby application
//!
//! - Coordinate: geographic positions of search origins and results
//! - Place: categories, search queries and the results they produce

pub mod coordinate;
pub mod place;

pub use coordinate::Coordinate;
pub use place::{Focus, PlaceCategory, PlaceResult, SearchQuery};
