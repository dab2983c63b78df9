//! Results view and display surfaces
//!
//! [`ResultsView`] is the single owner of what is currently shown: the list
//! entries, the map markers and the camera. Surfaces only read it.

use std::fmt::Display;
use std::io::Write;

use serde::Serialize;

use crate::Result;
use crate::models::{Coordinate, Focus, PlaceCategory, PlaceResult};
use crate::render::RenderedResults;

/// Informational entry shown when a search finds nothing
pub const NO_RESULTS_MESSAGE: &str = "No places found";

/// One row of the results list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ListEntry {
    Place(PlaceResult),
    Message { text: String },
}

/// A pin on the map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub coordinate: Coordinate,
    pub label: String,
}

/// What the list and map currently show
#[derive(Debug, Clone, Serialize)]
pub struct ResultsView {
    category: Option<PlaceCategory>,
    origin: Marker,
    entries: Vec<ListEntry>,
    markers: Vec<Marker>,
    camera: Focus,
}

impl ResultsView {
    /// An empty view with the camera on the search origin
    #[must_use]
    pub fn new(origin: Coordinate) -> Self {
        Self {
            category: None,
            origin: Marker {
                coordinate: origin,
                label: "You are here".to_string(),
            },
            entries: Vec::new(),
            markers: Vec::new(),
            camera: Focus::initial(origin),
        }
    }

    /// Replace everything shown with the results of a search.
    ///
    /// Old entries and markers are always discarded first, so the list and
    /// the markers never mix results of different searches.
    pub fn apply(&mut self, category: PlaceCategory, rendered: &RenderedResults) {
        self.entries.clear();
        self.markers.clear();
        self.category = Some(category);

        if rendered.is_empty() {
            self.entries.push(ListEntry::Message {
                text: NO_RESULTS_MESSAGE.to_string(),
            });
            return;
        }

        for place in &rendered.entries {
            self.entries.push(ListEntry::Place(place.clone()));
            self.markers.push(Marker {
                coordinate: place.coordinate,
                label: place.name.clone(),
            });
        }

        if let Some(focus) = rendered.focus {
            self.camera = focus;
        }
    }

    /// Category of the last applied search
    #[must_use]
    pub fn category(&self) -> Option<PlaceCategory> {
        self.category
    }

    #[must_use]
    pub fn origin(&self) -> &Marker {
        &self.origin
    }

    #[must_use]
    pub fn entries(&self) -> &[ListEntry] {
        &self.entries
    }

    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    #[must_use]
    pub fn camera(&self) -> Focus {
        self.camera
    }

    /// Place entries only, in list order
    pub fn places(&self) -> impl Iterator<Item = &PlaceResult> {
        self.entries.iter().filter_map(|entry| match entry {
            ListEntry::Place(place) => Some(place),
            ListEntry::Message { .. } => None,
        })
    }

    /// Whether the list shows the "no results" message
    #[must_use]
    pub fn is_empty_state(&self) -> bool {
        matches!(self.entries.as_slice(), [ListEntry::Message { .. }])
    }
}

impl Display for ListEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListEntry::Place(place) => write!(
                f,
                "{} ({})",
                place.name,
                place.coordinate.format_coordinates()
            ),
            ListEntry::Message { text } => write!(f, "{text}"),
        }
    }
}

/// Something that can show a [`ResultsView`]
pub trait ResultsSurface {
    fn present(&mut self, view: &ResultsView) -> Result<()>;
}

/// Plain text list followed by a summary of the map
pub struct TerminalSurface<W: Write> {
    writer: W,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResultsSurface for TerminalSurface<W> {
    fn present(&mut self, view: &ResultsView) -> Result<()> {
        let origin = view.origin().coordinate;
        let heading = view
            .category()
            .map_or("Places", |category| category.label());
        writeln!(
            self.writer,
            "{} near {}",
            heading,
            origin.format_coordinates()
        )?;

        let mut index = 0;
        for entry in view.entries() {
            match entry {
                ListEntry::Place(place) => {
                    index += 1;
                    writeln!(
                        self.writer,
                        "  {index:>2}. {entry}  {:.0} m",
                        origin.distance_meters(&place.coordinate)
                    )?;
                }
                ListEntry::Message { .. } => writeln!(self.writer, "  {entry}")?,
            }
        }

        let camera = view.camera();
        writeln!(
            self.writer,
            "Map: centre {} zoom {}, {} marker(s)",
            camera.center.format_coordinates(),
            camera.zoom,
            view.markers().len()
        )?;
        self.writer.flush()?;
        Ok(())
    }
}

/// One JSON document per presentation
pub struct JsonSurface<W: Write> {
    writer: W,
}

impl<W: Write> JsonSurface<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResultsSurface for JsonSurface<W> {
    fn present(&mut self, view: &ResultsView) -> Result<()> {
        serde_json::to_writer(&mut self.writer, view)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
