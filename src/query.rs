//! Overpass QL query construction

use crate::models::{Coordinate, PlaceCategory};

/// Build an Overpass QL query for nodes of `category` within
/// `radius_meters` of `origin`.
///
/// ```
/// use nearby::{Coordinate, PlaceCategory, query::build_query};
///
/// let query = build_query(PlaceCategory::Hotel, Coordinate::new(7.9, -72.5), 1000);
/// assert!(query.contains("node[tourism=hotel](around:1000,7.9,-72.5);"));
/// ```
#[must_use]
pub fn build_query(category: PlaceCategory, origin: Coordinate, radius_meters: u32) -> String {
    format!(
        "[out:json];\nnode[{}](around:{},{},{});\nout body;",
        category.tag_filter(),
        radius_meters,
        origin.latitude,
        origin.longitude
    )
}
