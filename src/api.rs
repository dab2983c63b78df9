use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::{
    NearbyError, PlaceCategory, ResultsView,
    location::LocationProvider,
    overpass::PlaceSource,
    search::{SearchService, SearchState},
};

pub struct AppState<S, L> {
    pub service: Arc<SearchService<S, L>>,
    pub default_category: PlaceCategory,
}

#[derive(Deserialize)]
pub struct PlacesParams {
    pub category: Option<String>,
}

#[derive(Serialize)]
pub struct PlacesResponse {
    pub state: SearchState,
    #[serde(flatten)]
    pub view: ResultsView,
}

#[derive(Serialize)]
pub struct ApiCategory {
    pub slug: &'static str,
    pub label: &'static str,
    pub tag_filter: &'static str,
}

#[derive(Serialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

pub fn router<S, L>(state: AppState<S, L>) -> Router
where
    S: PlaceSource + 'static,
    L: LocationProvider + 'static,
{
    Router::new()
        .route("/places", get(get_places::<S, L>))
        .route("/categories", get(get_categories))
        .route("/health", get(health))
        .with_state(Arc::new(state))
}

async fn get_places<S, L>(
    State(state): State<Arc<AppState<S, L>>>,
    Query(params): Query<PlacesParams>,
) -> ApiResult<PlacesResponse>
where
    S: PlaceSource + 'static,
    L: LocationProvider + 'static,
{
    let category = params
        .category
        .as_deref()
        .map_or(state.default_category, PlaceCategory::from_label);

    let origin = state.service.origin().await.map_err(error_response)?;
    let rendered = state
        .service
        .run_from(category, origin)
        .await
        .map_err(error_response)?;

    let mut view = ResultsView::new(origin);
    view.apply(category, &rendered);
    let search_state = if rendered.is_empty() {
        SearchState::Empty
    } else {
        SearchState::Displayed
    };

    Ok(Json(PlacesResponse {
        state: search_state,
        view,
    }))
}

async fn get_categories() -> Json<Vec<ApiCategory>> {
    Json(
        PlaceCategory::ALL
            .iter()
            .map(|category| ApiCategory {
                slug: category.slug(),
                label: category.label(),
                tag_filter: category.tag_filter(),
            })
            .collect(),
    )
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "version": crate::VERSION }))
}

fn error_response(err: NearbyError) -> (StatusCode, Json<ApiError>) {
    error!("Places request failed: {}", err);
    let status = match err {
        NearbyError::Network { .. } | NearbyError::Parse { .. } => StatusCode::BAD_GATEWAY,
        NearbyError::LocationUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        NearbyError::Validation { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ApiError {
            error: err.to_string(),
            message: err.user_message(),
        }),
    )
}
