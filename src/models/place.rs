//! Place categories, search queries and search results

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::Coordinate;
use crate::query;

/// Radius searched around the origin when nothing else is configured
pub const DEFAULT_RADIUS_METERS: u32 = 1000;

/// Zoom level the map is focused at after a non-empty search
pub const SEARCH_FOCUS_ZOOM: u8 = 16;

/// Zoom level of the map before the first search
pub const INITIAL_ZOOM: u8 = 12;

/// Name shown for places whose OSM node carries no `name` tag
pub const PLACEHOLDER_NAME: &str = "Unnamed place";

/// The kinds of places that can be searched for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlaceCategory {
    #[default]
    TouristAttraction,
    Hotel,
    Restaurant,
}

impl PlaceCategory {
    pub const ALL: [PlaceCategory; 3] = [
        PlaceCategory::TouristAttraction,
        PlaceCategory::Hotel,
        PlaceCategory::Restaurant,
    ];

    /// The OSM `key=value` predicate selecting this category
    #[must_use]
    pub fn tag_filter(&self) -> &'static str {
        match self {
            PlaceCategory::TouristAttraction => "tourism=attraction",
            PlaceCategory::Hotel => "tourism=hotel",
            PlaceCategory::Restaurant => "amenity=restaurant",
        }
    }

    /// Short machine-friendly name, also accepted by [`PlaceCategory::parse_label`]
    #[must_use]
    pub fn slug(&self) -> &'static str {
        match self {
            PlaceCategory::TouristAttraction => "attraction",
            PlaceCategory::Hotel => "hotel",
            PlaceCategory::Restaurant => "restaurant",
        }
    }

    /// Human readable name
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            PlaceCategory::TouristAttraction => "Tourist attractions",
            PlaceCategory::Hotel => "Hotels",
            PlaceCategory::Restaurant => "Restaurants",
        }
    }

    /// Strictly parse a selector label, case-insensitively.
    ///
    /// Accepts slugs, display labels and the Spanish selector labels.
    #[must_use]
    pub fn parse_label(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "attraction" | "attractions" | "tourist" | "tourist attraction"
            | "tourist attractions" | "tourism" | "lugares turísticos" | "lugares turisticos" => {
                Some(PlaceCategory::TouristAttraction)
            }
            "hotel" | "hotels" | "hoteles" => Some(PlaceCategory::Hotel),
            "restaurant" | "restaurants" | "restaurantes" => Some(PlaceCategory::Restaurant),
            _ => None,
        }
    }

    /// Parse a selector label, falling back to the default category for
    /// anything unrecognised.
    #[must_use]
    pub fn from_label(input: &str) -> Self {
        Self::parse_label(input).unwrap_or_else(|| {
            let fallback = Self::default();
            warn!(
                "Unrecognised category '{}', falling back to {}",
                input,
                fallback.slug()
            );
            fallback
        })
    }
}

impl Display for PlaceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl From<String> for PlaceCategory {
    fn from(value: String) -> Self {
        Self::from_label(&value)
    }
}

impl From<PlaceCategory> for String {
    fn from(value: PlaceCategory) -> Self {
        value.slug().to_string()
    }
}

/// A single place found by a search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceResult {
    pub name: String,
    pub coordinate: Coordinate,
}

impl PlaceResult {
    #[must_use]
    pub fn new(name: Option<String>, coordinate: Coordinate) -> Self {
        Self {
            name: name.unwrap_or_else(|| PLACEHOLDER_NAME.to_string()),
            coordinate,
        }
    }
}

/// Instruction for a map to centre on a coordinate at a zoom level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Focus {
    pub center: Coordinate,
    pub zoom: u8,
}

impl Focus {
    #[must_use]
    pub fn search(center: Coordinate) -> Self {
        Self {
            center,
            zoom: SEARCH_FOCUS_ZOOM,
        }
    }

    #[must_use]
    pub fn initial(center: Coordinate) -> Self {
        Self {
            center,
            zoom: INITIAL_ZOOM,
        }
    }
}

/// Everything needed to build one Overpass request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchQuery {
    pub category: PlaceCategory,
    pub origin: Coordinate,
    pub radius_meters: u32,
}

impl SearchQuery {
    #[must_use]
    pub fn new(category: PlaceCategory, origin: Coordinate) -> Self {
        Self {
            category,
            origin,
            radius_meters: DEFAULT_RADIUS_METERS,
        }
    }

    #[must_use]
    pub fn with_radius(mut self, radius_meters: u32) -> Self {
        self.radius_meters = radius_meters;
        self
    }

    /// Render this query as Overpass QL text
    #[must_use]
    pub fn to_query_string(&self) -> String {
        query::build_query(self.category, self.origin, self.radius_meters)
    }
}
