use axum::{extract::State, Json};
use serde::Deserialize;
use validator::Validate;

use super::validation_error;
use crate::{error::AppResult, models::ParsedLink, state::AppState};

// ── Request body ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct ParseLinkRequest {
    #[validate(length(min = 1, max = 2048, message = "URL must be 1–2048 characters"))]
    pub url: String,
}

// ── Handler ────────────────────────────────────────────────────────────────

/// POST /links/parse: resolve a URL's metadata, reusing a stored result.
///
/// An existing row with the exact same `original_url` is returned as-is.
/// Otherwise the URL is resolved and the record stored, including failed
/// resolutions (`is_valid_url = false`).
pub async fn parse_link(
    State(state): State<AppState>,
    Json(req): Json<ParseLinkRequest>,
) -> AppResult<Json<ParsedLink>> {
    req.validate().map_err(validation_error)?;

    if let Some(existing) = state.store.find_by_url(&req.url).await? {
        tracing::debug!(url = %req.url, id = %existing.id, "Returning previously parsed link");
        return Ok(Json(existing));
    }

    let record = state.resolver.resolve(&req.url).await;
    let saved = state.store.insert(record).await?;

    tracing::info!(
        url = %saved.original_url,
        id = %saved.id,
        valid = saved.is_valid_url,
        category = %saved.category,
        "Parsed new link"
    );

    Ok(Json(saved))
}
