use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use compass_directory::Directory;
use compass_engine::{SearchRequest, SearchResponse};
use compass_probe::SiteProber;

use crate::middleware::{ClientId, RequestId};

use super::{ApiError, AppState};

pub(super) async fn search<D, P>(
    State(state): State<AppState<D, P>>,
    Extension(req_id): Extension<RequestId>,
    Extension(client): Extension<ClientId>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError>
where
    D: Directory + 'static,
    P: SiteProber + 'static,
{
    let Json(request) =
        body.map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.body_text()))?;

    let response = state
        .engine
        .search(&request, &client.0)
        .await
        .map_err(|e| ApiError::from_search_error(req_id.0, &e))?;

    Ok(Json(response))
}
