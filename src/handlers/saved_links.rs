use std::collections::HashMap;
use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::validation_error;
use crate::{
    error::{AppError, AppResult},
    models::{
        normalize_tags, LinkCategory, LinkStatus, NewSavedLink, Page, PageRequest, SaveOutcome,
        SavedLink, SavedLinkFilter, SavedLinkUpdate, SavedLinkView,
    },
    session::SessionOwner,
    state::AppState,
};

// ── Request types ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct SaveLinkRequest {
    pub parsed_link_id: Uuid,
    #[validate(length(max = 2000, message = "Note must be at most 2000 characters"))]
    pub custom_note: Option<String>,
    #[validate(length(max = 300, message = "Title must be at most 300 characters"))]
    pub custom_title: Option<String>,
    #[validate(length(max = 20, message = "At most 20 tags are allowed"))]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSavedLinkRequest {
    #[validate(length(max = 2000, message = "Note must be at most 2000 characters"))]
    pub custom_note: Option<String>,
    #[validate(length(max = 300, message = "Title must be at most 300 characters"))]
    pub custom_title: Option<String>,
    /// Case-insensitive `LinkStatus` name; unrecognised values are ignored.
    pub status: Option<String>,
    #[validate(length(max = 20, message = "At most 20 tags are allowed"))]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListSavedLinksQuery {
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
    /// Case-insensitive `LinkCategory` name; unrecognised values are ignored.
    pub category: Option<String>,
    /// Case-insensitive `LinkStatus` name; unrecognised values are ignored.
    pub status: Option<String>,
}

/// Parse an optional filter value, treating blank or unknown names as absent.
fn parse_lenient<T: FromStr>(raw: Option<&str>) -> Option<T> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| value.parse().ok())
}

fn saved_link_not_found() -> AppError {
    AppError::NotFound("Saved link not found".into())
}

// ── View assembly ──────────────────────────────────────────────────────────

async fn to_view(state: &AppState, saved: SavedLink) -> AppResult<SavedLinkView> {
    let parsed = state
        .store
        .find_by_id(saved.parsed_link_id)
        .await?
        .ok_or_else(|| {
            tracing::error!(saved_link_id = %saved.id, "Saved link points at a missing parsed link");
            AppError::Internal
        })?;

    Ok(SavedLinkView::new(saved, parsed))
}

async fn to_views(state: &AppState, rows: Vec<SavedLink>) -> AppResult<Vec<SavedLinkView>> {
    let ids: Vec<Uuid> = rows.iter().map(|row| row.parsed_link_id).collect();
    let mut parsed: HashMap<Uuid, _> = state
        .store
        .find_by_ids(&ids)
        .await?
        .into_iter()
        .map(|link| (link.id, link))
        .collect();

    let mut views = Vec::with_capacity(rows.len());
    for saved in rows {
        // One owner saves a given parsed link at most once.
        let Some(link) = parsed.remove(&saved.parsed_link_id) else {
            tracing::error!(saved_link_id = %saved.id, "Saved link points at a missing parsed link");
            return Err(AppError::Internal);
        };
        views.push(SavedLinkView::new(saved, link));
    }

    Ok(views)
}

// ── Handlers ───────────────────────────────────────────────────────────────

/// POST /links/save: bookmark a parsed link for the calling session.
///
/// Returns 201 with the new row, or 200 with the row the session already had
/// for that parsed link (the request's note, title and tags are then ignored).
pub async fn save_link(
    State(state): State<AppState>,
    owner: SessionOwner,
    Json(req): Json<SaveLinkRequest>,
) -> AppResult<(StatusCode, Json<SavedLinkView>)> {
    req.validate().map_err(validation_error)?;

    let parsed = state
        .store
        .find_by_id(req.parsed_link_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Parsed link not found".into()))?;

    let outcome = state
        .saved
        .save(NewSavedLink {
            parsed_link_id: parsed.id,
            owner_id: owner.owner_id,
            custom_note: req.custom_note,
            custom_title: req.custom_title,
            tags: normalize_tags(req.tags.unwrap_or_default()),
        })
        .await?;

    let (status, saved) = match outcome {
        SaveOutcome::Created(saved) => {
            tracing::info!(id = %saved.id, parsed_link_id = %parsed.id, "Saved link");
            (StatusCode::CREATED, saved)
        }
        SaveOutcome::Existing(saved) => (StatusCode::OK, saved),
    };

    Ok((status, Json(SavedLinkView::new(saved, parsed))))
}

/// GET /links/mine: the session's saved links, newest first.
///
/// Optional `category` and `status` filters; `page_number` (from 1) and
/// `page_size` (default 20, max 100).
pub async fn list_saved_links(
    State(state): State<AppState>,
    owner: SessionOwner,
    Query(query): Query<ListSavedLinksQuery>,
) -> AppResult<Json<Page<SavedLinkView>>> {
    let page = PageRequest::new(query.page_number, query.page_size);
    let filter = SavedLinkFilter {
        category: parse_lenient::<LinkCategory>(query.category.as_deref()),
        status: parse_lenient::<LinkStatus>(query.status.as_deref()),
    };

    let (rows, total) = state.saved.list(&owner.owner_id, filter, page).await?;
    let items = to_views(&state, rows).await?;

    Ok(Json(Page::new(items, total, page)))
}

/// GET /links/:id
pub async fn get_saved_link(
    State(state): State<AppState>,
    owner: SessionOwner,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SavedLinkView>> {
    let saved = state
        .saved
        .get(&owner.owner_id, id)
        .await?
        .ok_or_else(saved_link_not_found)?;

    Ok(Json(to_view(&state, saved).await?))
}

/// PATCH /links/:id: change note, title, status or tags. Absent fields are
/// left as they are.
pub async fn update_saved_link(
    State(state): State<AppState>,
    owner: SessionOwner,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateSavedLinkRequest>,
) -> AppResult<Json<SavedLinkView>> {
    req.validate().map_err(validation_error)?;

    let update = SavedLinkUpdate {
        custom_note: req.custom_note,
        custom_title: req.custom_title,
        status: parse_lenient::<LinkStatus>(req.status.as_deref()),
        tags: req.tags.map(normalize_tags),
    };

    let saved = state
        .saved
        .update(&owner.owner_id, id, &update, Utc::now())
        .await?
        .ok_or_else(saved_link_not_found)?;

    Ok(Json(to_view(&state, saved).await?))
}

/// DELETE /links/:id
pub async fn delete_saved_link(
    State(state): State<AppState>,
    owner: SessionOwner,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !state.saved.delete(&owner.owner_id, id).await? {
        return Err(saved_link_not_found());
    }

    tracing::info!(id = %id, "Deleted saved link");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /links/:id/mark-read
pub async fn mark_read(
    State(state): State<AppState>,
    owner: SessionOwner,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SavedLinkView>> {
    let saved = state
        .saved
        .mark_read(&owner.owner_id, id, Utc::now())
        .await?
        .ok_or_else(saved_link_not_found)?;

    Ok(Json(to_view(&state, saved).await?))
}

/// POST /links/:id/toggle-favourite
pub async fn toggle_favourite(
    State(state): State<AppState>,
    owner: SessionOwner,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SavedLinkView>> {
    let saved = state
        .saved
        .toggle_favourite(&owner.owner_id, id)
        .await?
        .ok_or_else(saved_link_not_found)?;

    Ok(Json(to_view(&state, saved).await?))
}
