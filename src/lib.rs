//! `nearby` - find tourist attractions, hotels and restaurants around a location
//!
//! This library builds Overpass queries for a place category around a search
//! origin, fetches them, and turns the response into list entries and map
//! markers.

pub mod api;
pub mod config;
pub mod display;
pub mod error;
pub mod location;
pub mod logging;
pub mod models;
pub mod overpass;
pub mod query;
pub mod render;
pub mod search;
pub mod web;

// Re-export core types for public API
pub use config::NearbyConfig;
pub use display::{ResultsSurface, ResultsView};
pub use error::NearbyError;
pub use location::{FixedLocation, LocationProvider, SimulatedLocation};
pub use models::{Coordinate, Focus, PlaceCategory, PlaceResult, SearchQuery};
pub use overpass::{OverpassClient, PlaceSource};
pub use render::{RenderedResults, render};
pub use search::{SearchOutcome, SearchService, SearchSession, SearchState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, NearbyError>;
