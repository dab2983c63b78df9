//! Overpass response rendering
//!
//! Turns a raw Overpass JSON body into place entries and a focus
//! instruction for the map.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::Result;
use crate::models::{Coordinate, Focus, PlaceResult};

/// Overpass `[out:json]` response
#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Option<Vec<OverpassElement>>,
    /// Runtime problems (timeouts, memory limits) reported inside a 200 response
    #[serde(default)]
    remark: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    tags: Option<HashMap<String, String>>,
}

impl OverpassElement {
    fn into_place(self) -> Option<PlaceResult> {
        let (Some(lat), Some(lon)) = (self.lat, self.lon) else {
            warn!("Skipping element {:?} without coordinates", self.id);
            return None;
        };
        let name = self.tags.and_then(|mut tags| tags.remove("name"));
        Some(PlaceResult::new(name, Coordinate::new(lat, lon)))
    }
}

/// The renderable outcome of one search
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderedResults {
    pub entries: Vec<PlaceResult>,
    /// Centre on the first result; `None` when nothing was found
    pub focus: Option<Focus>,
}

impl RenderedResults {
    /// Whether this is the "no results" state
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Parse an Overpass response body into place entries.
///
/// Missing or empty `elements` yield the empty state, not an error.
/// Bodies that are not an Overpass JSON object fail with
/// [`crate::NearbyError::Parse`].
#[instrument(skip(body), fields(bytes = body.len()))]
pub fn render(body: &str) -> Result<RenderedResults> {
    let response: OverpassResponse = serde_json::from_str(body)?;

    if let Some(remark) = &response.remark {
        warn!("Overpass remark: {}", remark);
    }

    let entries: Vec<PlaceResult> = response
        .elements
        .unwrap_or_default()
        .into_iter()
        .filter_map(OverpassElement::into_place)
        .collect();

    let focus = entries.first().map(|first| Focus::search(first.coordinate));
    debug!("Rendered {} places", entries.len());

    Ok(RenderedResults { entries, focus })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NearbyError;
    use crate::models::place::{PLACEHOLDER_NAME, SEARCH_FOCUS_ZOOM};

    #[test]
    fn test_empty_elements() {
        let rendered = render(r#"{"version":0.6,"elements":[]}"#).unwrap();
        assert!(rendered.is_empty());
        assert_eq!(rendered.len(), 0);
        assert!(rendered.focus.is_none());
    }

    #[test]
    fn test_absent_elements() {
        let rendered = render(r#"{"version":0.6}"#).unwrap();
        assert!(rendered.is_empty());
        assert!(rendered.focus.is_none());

        let rendered = render(r#"{"elements":null}"#).unwrap();
        assert!(rendered.is_empty());
    }

    #[test]
    fn test_single_named_element() {
        let body =
            r#"{"elements":[{"type":"node","id":1,"lat":7.9,"lon":-72.5,"tags":{"name":"Park"}}]}"#;
        let rendered = render(body).unwrap();

        assert_eq!(
            rendered.entries,
            vec![PlaceResult {
                name: "Park".to_string(),
                coordinate: Coordinate::new(7.9, -72.5),
            }]
        );
        assert_eq!(
            rendered.focus,
            Some(Focus {
                center: Coordinate::new(7.9, -72.5),
                zoom: 16,
            })
        );
    }

    #[test]
    fn test_missing_name_uses_placeholder() {
        let rendered = render(
            r#"{"elements":[
                {"type":"node","id":1,"lat":7.9,"lon":-72.5,"tags":{"tourism":"hotel"}},
                {"type":"node","id":2,"lat":7.8,"lon":-72.4}
            ]}"#,
        )
        .unwrap();

        assert_eq!(rendered.len(), 2);
        assert!(rendered.entries.iter().all(|p| p.name == PLACEHOLDER_NAME));
    }

    #[test]
    fn test_focus_is_first_element() {
        let rendered = render(
            r#"{"elements":[
                {"lat":1.5,"lon":2.5,"tags":{"name":"First"}},
                {"lat":3.5,"lon":4.5,"tags":{"name":"Second"}}
            ]}"#,
        )
        .unwrap();

        let focus = rendered.focus.unwrap();
        assert_eq!(focus.center, Coordinate::new(1.5, 2.5));
        assert_eq!(focus.zoom, SEARCH_FOCUS_ZOOM);
        assert_eq!(rendered.entries[1].name, "Second");
    }

    #[test]
    fn test_elements_without_coordinates_are_skipped() {
        let rendered = render(
            r#"{"elements":[
                {"type":"way","id":9,"tags":{"name":"Some way"}},
                {"type":"node","id":10,"lat":1.0,"lon":2.0,"tags":{"name":"Node"}}
            ]}"#,
        )
        .unwrap();

        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered.entries[0].name, "Node");
        assert_eq!(rendered.focus.unwrap().center, Coordinate::new(1.0, 2.0));
    }

    #[test]
    fn test_remark_still_renders_elements() {
        let rendered = render(
            r#"{"elements":[],"remark":"runtime error: Query timed out in \"query\" at line 3"}"#,
        )
        .unwrap();
        assert!(rendered.is_empty());
    }

    #[test]
    fn test_malformed_body_is_parse_error() {
        let err = render("<html>Gateway Timeout</html>").unwrap_err();
        assert!(matches!(err, NearbyError::Parse { .. }));

        let err = render(r#"{"elements":"nope"}"#).unwrap_err();
        assert!(matches!(err, NearbyError::Parse { .. }));
    }
}
