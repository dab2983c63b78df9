//! Search orchestration
//!
//! [`SearchService`] runs one search cycle: resolve the origin, build the
//! query, fetch it and render the body. [`SearchSession`] owns the
//! [`ResultsView`], drives the `Idle -> Searching -> {Displayed | Empty |
//! Error} -> Idle` state machine and runs each search as a tokio task. A new
//! trigger aborts a search that is still in flight.

use std::fmt::Display;
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

use crate::Result;
use crate::display::ResultsView;
use crate::location::LocationProvider;
use crate::models::{Coordinate, PlaceCategory, SearchQuery, place::DEFAULT_RADIUS_METERS};
use crate::overpass::PlaceSource;
use crate::render::{RenderedResults, render};

/// Runs individual searches against a place source
pub struct SearchService<S, L> {
    source: S,
    location: L,
    radius_meters: u32,
}

impl<S: PlaceSource, L: LocationProvider> SearchService<S, L> {
    pub fn new(source: S, location: L) -> Self {
        Self {
            source,
            location,
            radius_meters: DEFAULT_RADIUS_METERS,
        }
    }

    #[must_use]
    pub fn with_radius(mut self, radius_meters: u32) -> Self {
        self.radius_meters = radius_meters;
        self
    }

    #[must_use]
    pub fn radius_meters(&self) -> u32 {
        self.radius_meters
    }

    /// Current search origin
    pub async fn origin(&self) -> Result<Coordinate> {
        self.location.current_location().await
    }

    /// One full search cycle. Touches no view.
    pub async fn run(&self, category: PlaceCategory) -> Result<RenderedResults> {
        let origin = self.origin().await?;
        self.run_from(category, origin).await
    }

    /// Search around an origin the caller already resolved
    #[instrument(skip(self))]
    pub async fn run_from(
        &self,
        category: PlaceCategory,
        origin: Coordinate,
    ) -> Result<RenderedResults> {
        let query = SearchQuery::new(category, origin).with_radius(self.radius_meters);

        let body = self.source.fetch(&query.to_query_string()).await?;
        let rendered = render(&body)?;

        info!(
            "Found {} {} within {}m of {}",
            rendered.len(),
            category.slug(),
            query.radius_meters,
            origin.format_coordinates()
        );
        Ok(rendered)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchState {
    Idle,
    Searching,
    Displayed,
    Empty,
    Error,
}

/// How a settled search ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The view now shows this many places
    Displayed(usize),
    /// The view now shows the "no results" message
    Empty,
    /// The view was left as it was
    Failed(String),
}

impl SearchOutcome {
    #[must_use]
    pub fn terminal_state(&self) -> SearchState {
        match self {
            SearchOutcome::Displayed(_) => SearchState::Displayed,
            SearchOutcome::Empty => SearchState::Empty,
            SearchOutcome::Failed(_) => SearchState::Error,
        }
    }
}

impl Display for SearchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchOutcome::Displayed(count) => write!(f, "{count} place(s) displayed"),
            SearchOutcome::Empty => write!(f, "no places found"),
            SearchOutcome::Failed(message) => write!(f, "search failed: {message}"),
        }
    }
}

struct InFlight {
    category: PlaceCategory,
    handle: JoinHandle<Result<RenderedResults>>,
}

/// A results view together with the searches that update it
pub struct SearchSession<S, L> {
    service: Arc<SearchService<S, L>>,
    view: ResultsView,
    state: SearchState,
    last_outcome: Option<SearchOutcome>,
    in_flight: Option<InFlight>,
}

impl<S, L> SearchSession<S, L>
where
    S: PlaceSource + 'static,
    L: LocationProvider + 'static,
{
    /// Resolve the origin and start with a blank view centred on it
    pub async fn open(service: Arc<SearchService<S, L>>) -> Result<Self> {
        let origin = service.origin().await?;
        Ok(Self {
            service,
            view: ResultsView::new(origin),
            state: SearchState::Idle,
            last_outcome: None,
            in_flight: None,
        })
    }

    #[must_use]
    pub fn view(&self) -> &ResultsView {
        &self.view
    }

    /// Either `Idle` or `Searching`. A settled search passes through its
    /// terminal state straight back to `Idle`, see [`Self::last_state`].
    #[must_use]
    pub fn state(&self) -> SearchState {
        self.state
    }

    /// Terminal state of the last settled search
    #[must_use]
    pub fn last_state(&self) -> Option<SearchState> {
        self.last_outcome.as_ref().map(SearchOutcome::terminal_state)
    }

    #[must_use]
    pub fn last_outcome(&self) -> Option<&SearchOutcome> {
        self.last_outcome.as_ref()
    }

    #[must_use]
    pub fn is_searching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start a search in the background, aborting any search still running
    pub fn trigger(&mut self, category: PlaceCategory) {
        if let Some(previous) = self.in_flight.take() {
            if !previous.handle.is_finished() {
                info!(
                    "Cancelling in-flight {} search in favour of {}",
                    previous.category.slug(),
                    category.slug()
                );
            }
            previous.handle.abort();
        }

        let service = Arc::clone(&self.service);
        let handle = tokio::spawn(async move { service.run(category).await });
        self.in_flight = Some(InFlight { category, handle });
        self.transition(SearchState::Searching);
    }

    /// Wait for the current search and apply its results.
    ///
    /// Returns `None` when nothing is in flight. Cancel safe: dropping the
    /// returned future keeps the search pending.
    pub async fn settle(&mut self) -> Option<SearchOutcome> {
        let joined = (&mut self.in_flight.as_mut()?.handle).await;
        let in_flight = self.in_flight.take()?;

        let outcome = match joined {
            Ok(Ok(rendered)) => {
                self.view.apply(in_flight.category, &rendered);
                if rendered.is_empty() {
                    SearchOutcome::Empty
                } else {
                    SearchOutcome::Displayed(rendered.len())
                }
            }
            Ok(Err(e)) => {
                error!("Search for {} failed: {}", in_flight.category.slug(), e);
                SearchOutcome::Failed(e.to_string())
            }
            Err(e) if e.is_cancelled() => {
                self.transition(SearchState::Idle);
                return None;
            }
            Err(e) => {
                error!("Search task for {} panicked: {}", in_flight.category.slug(), e);
                SearchOutcome::Failed(format!("search task failed: {e}"))
            }
        };

        self.transition(outcome.terminal_state());
        self.transition(SearchState::Idle);
        self.last_outcome = Some(outcome.clone());
        Some(outcome)
    }

    /// Trigger a search and wait for it
    pub async fn search(&mut self, category: PlaceCategory) -> SearchOutcome {
        self.trigger(category);
        self.settle()
            .await
            .unwrap_or_else(|| SearchOutcome::Failed("search was cancelled".to_string()))
    }

    fn transition(&mut self, next: SearchState) {
        debug!("Search state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

impl<S, L> Drop for SearchSession<S, L> {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NearbyError;
    use crate::display::NO_RESULTS_MESSAGE;
    use crate::location::{FixedLocation, SIMULATED_LOCATION, SimulatedLocation};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Clone, Copy)]
    enum Reply {
        Body(&'static str),
        Fail,
        Hang,
    }

    /// Answers by the tag filter found in the query
    #[derive(Default)]
    struct ScriptedSource {
        replies: HashMap<&'static str, Reply>,
        queries: Mutex<Vec<String>>,
    }

    impl ScriptedSource {
        fn with(mut self, category: PlaceCategory, reply: Reply) -> Self {
            self.replies.insert(category.tag_filter(), reply);
            self
        }
    }

    #[async_trait]
    impl PlaceSource for ScriptedSource {
        async fn fetch(&self, query: &str) -> Result<String> {
            self.queries.lock().unwrap().push(query.to_string());
            let reply = self
                .replies
                .iter()
                .find(|(filter, _)| query.contains(*filter))
                .map_or(Reply::Fail, |(_, reply)| *reply);

            match reply {
                Reply::Body(body) => Ok(body.to_string()),
                Reply::Fail => Err(NearbyError::network("connection reset by peer")),
                Reply::Hang => std::future::pending().await,
            }
        }
    }

    const HOTELS: &str = r#"{"elements":[
        {"type":"node","id":1,"lat":7.901,"lon":-72.503,"tags":{"name":"Hotel Casa Blanca"}},
        {"type":"node","id":2,"lat":7.899,"lon":-72.501,"tags":{"name":"Hotel Tonchalá"}},
        {"type":"node","id":3,"lat":7.902,"lon":-72.504}
    ]}"#;
    const RESTAURANTS: &str =
        r#"{"elements":[{"type":"node","id":4,"lat":7.9,"lon":-72.5,"tags":{"name":"La Mazorca"}}]}"#;
    const NOTHING: &str = r#"{"elements":[]}"#;

    async fn session(
        source: ScriptedSource,
    ) -> SearchSession<ScriptedSource, SimulatedLocation> {
        let service = Arc::new(SearchService::new(source, SimulatedLocation));
        SearchSession::open(service).await.unwrap()
    }

    #[tokio::test]
    async fn test_service_run_builds_query_from_location() {
        let source = ScriptedSource::default().with(PlaceCategory::Hotel, Reply::Body(HOTELS));
        let service = SearchService::new(source, SimulatedLocation).with_radius(500);

        let rendered = service.run(PlaceCategory::Hotel).await.unwrap();
        assert_eq!(rendered.len(), 3);

        let queries = service.source.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert!(queries[0].contains(
            "node[tourism=hotel](around:500,7.900412097203202,-72.50295964581814)"
        ));
    }

    #[tokio::test]
    async fn test_service_run_without_location() {
        let service = SearchService::new(
            ScriptedSource::default(),
            FixedLocation::new(Coordinate::new(-95.0, 0.0)),
        );
        let err = service.run(PlaceCategory::Hotel).await.unwrap_err();
        assert!(matches!(err, NearbyError::LocationUnavailable { .. }));
        assert!(service.source.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_session_starts_idle_on_origin() {
        let session = session(ScriptedSource::default()).await;
        assert_eq!(session.state(), SearchState::Idle);
        assert!(session.last_outcome().is_none());
        assert!(session.last_state().is_none());
        assert_eq!(session.view().camera().center, SIMULATED_LOCATION);
        assert!(session.view().entries().is_empty());
    }

    #[tokio::test]
    async fn test_search_displays_results() {
        let source = ScriptedSource::default().with(PlaceCategory::Hotel, Reply::Body(HOTELS));
        let mut session = session(source).await;

        let outcome = session.search(PlaceCategory::Hotel).await;
        assert_eq!(outcome, SearchOutcome::Displayed(3));
        assert_eq!(session.state(), SearchState::Idle);
        assert_eq!(session.last_outcome(), Some(&SearchOutcome::Displayed(3)));
        assert_eq!(session.last_state(), Some(SearchState::Displayed));
        assert_eq!(session.view().markers().len(), 3);
        assert_eq!(session.view().camera().center, Coordinate::new(7.901, -72.503));
        assert!(!session.is_searching());
    }

    #[tokio::test]
    async fn test_new_search_replaces_previous_category() {
        let mut session = session(
            ScriptedSource::default()
                .with(PlaceCategory::Hotel, Reply::Body(HOTELS))
                .with(PlaceCategory::Restaurant, Reply::Body(RESTAURANTS)),
        )
        .await;

        session.search(PlaceCategory::Hotel).await;
        let outcome = session.search(PlaceCategory::Restaurant).await;

        assert_eq!(outcome, SearchOutcome::Displayed(1));
        let names: Vec<_> = session.view().places().map(|p| p.name.clone()).collect();
        assert_eq!(names, vec!["La Mazorca".to_string()]);
        assert_eq!(session.view().markers().len(), 1);
        assert_eq!(session.view().category(), Some(PlaceCategory::Restaurant));
    }

    #[tokio::test]
    async fn test_empty_search_shows_message() {
        let mut session = session(
            ScriptedSource::default()
                .with(PlaceCategory::Hotel, Reply::Body(HOTELS))
                .with(PlaceCategory::Restaurant, Reply::Body(NOTHING)),
        )
        .await;

        session.search(PlaceCategory::Hotel).await;
        let outcome = session.search(PlaceCategory::Restaurant).await;

        assert_eq!(outcome, SearchOutcome::Empty);
        assert_eq!(outcome.terminal_state(), SearchState::Empty);
        assert_eq!(session.state(), SearchState::Idle);
        assert_eq!(session.last_state(), Some(SearchState::Empty));
        assert!(session.view().is_empty_state());
        assert_eq!(session.view().entries()[0].to_string(), NO_RESULTS_MESSAGE);
        assert!(session.view().markers().is_empty());
    }

    #[tokio::test]
    async fn test_failed_search_leaves_view_unchanged() {
        let mut session = session(
            ScriptedSource::default()
                .with(PlaceCategory::Hotel, Reply::Body(HOTELS))
                .with(PlaceCategory::Restaurant, Reply::Fail),
        )
        .await;

        session.search(PlaceCategory::Hotel).await;
        let before: Vec<_> = session.view().entries().to_vec();

        let outcome = session.search(PlaceCategory::Restaurant).await;
        assert!(matches!(
            outcome,
            SearchOutcome::Failed(ref message) if message.contains("connection reset")
        ));
        assert_eq!(outcome.terminal_state(), SearchState::Error);
        assert_eq!(session.state(), SearchState::Idle);
        assert_eq!(session.last_state(), Some(SearchState::Error));
        assert_eq!(session.view().entries(), before.as_slice());
        assert_eq!(session.view().category(), Some(PlaceCategory::Hotel));
    }

    #[tokio::test]
    async fn test_malformed_body_leaves_view_unchanged() {
        let mut session = session(
            ScriptedSource::default()
                .with(PlaceCategory::TouristAttraction, Reply::Body("<html>504</html>")),
        )
        .await;

        let outcome = session.search(PlaceCategory::TouristAttraction).await;
        assert!(matches!(outcome, SearchOutcome::Failed(_)));
        assert!(session.view().entries().is_empty());
    }

    #[tokio::test]
    async fn test_trigger_cancels_in_flight_search() {
        let mut session = session(
            ScriptedSource::default()
                .with(PlaceCategory::Hotel, Reply::Hang)
                .with(PlaceCategory::Restaurant, Reply::Body(RESTAURANTS)),
        )
        .await;

        session.trigger(PlaceCategory::Hotel);
        tokio::task::yield_now().await;
        assert_eq!(session.state(), SearchState::Searching);
        assert!(session.is_searching());

        session.trigger(PlaceCategory::Restaurant);
        let outcome = session.settle().await;

        assert_eq!(outcome, Some(SearchOutcome::Displayed(1)));
        assert_eq!(session.view().category(), Some(PlaceCategory::Restaurant));
        assert!(session.settle().await.is_none());
    }

    #[tokio::test]
    async fn test_settle_without_search() {
        let mut session = session(ScriptedSource::default()).await;
        assert!(session.settle().await.is_none());
        assert_eq!(session.state(), SearchState::Idle);
    }
}
