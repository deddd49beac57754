use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use compass_core::ProbeResult;
use compass_directory::Directory;
use compass_probe::SiteProber;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct CheckRequest {
    #[serde(default)]
    url: String,
}

/// Probes one website outside of a search. Probe failures are classified
/// in the returned result, never reported as errors.
pub(super) async fn check_website<D, P>(
    State(state): State<AppState<D, P>>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<CheckRequest>, JsonRejection>,
) -> Result<Json<ProbeResult>, ApiError>
where
    D: Directory + 'static,
    P: SiteProber + 'static,
{
    let Json(request) =
        body.map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.body_text()))?;

    let url = request.url.trim();
    if url.is_empty() {
        return Err(ApiError::new(req_id.0, "validation_error", "url is required"));
    }

    Ok(Json(state.engine.prober().probe(url).await))
}
