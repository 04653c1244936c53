use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum::{Display, EnumString};
use uuid::Uuid;

use super::{LinkCategory, ParsedLink};

/// Reading state of a saved link.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    sqlx::Type,
)]
#[sqlx(type_name = "text")]
#[strum(ascii_case_insensitive)]
pub enum LinkStatus {
    #[default]
    Unread,
    Read,
    Favourite,
    Archived,
}

/// A `saved_links` row: one owner's bookmark of a parsed link.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SavedLink {
    pub id: Uuid,
    pub parsed_link_id: Uuid,
    pub owner_id: String,
    pub custom_note: Option<String>,
    pub custom_title: Option<String>,
    pub tags: Vec<String>,
    pub status: LinkStatus,
    pub saved_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl SavedLink {
    pub fn new(new: NewSavedLink, saved_at: DateTime<Utc>) -> Self {
        SavedLink {
            id: Uuid::new_v4(),
            parsed_link_id: new.parsed_link_id,
            owner_id: new.owner_id,
            custom_note: new.custom_note,
            custom_title: new.custom_title,
            tags: new.tags,
            status: LinkStatus::Unread,
            saved_at,
            read_at: None,
        }
    }

    /// Status becomes `Read`; `read_at` is stamped even if it was set before.
    pub fn mark_read(&mut self, now: DateTime<Utc>) {
        self.status = LinkStatus::Read;
        self.read_at = Some(now);
    }

    /// `Favourite` flips to `Read`; any other status flips to `Favourite`.
    pub fn toggle_favourite(&mut self) {
        self.status = match self.status {
            LinkStatus::Favourite => LinkStatus::Read,
            _ => LinkStatus::Favourite,
        };
    }
}

/// Fields supplied when an owner saves a parsed link.
#[derive(Debug, Clone)]
pub struct NewSavedLink {
    pub parsed_link_id: Uuid,
    pub owner_id: String,
    pub custom_note: Option<String>,
    pub custom_title: Option<String>,
    pub tags: Vec<String>,
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct SavedLinkUpdate {
    pub custom_note: Option<String>,
    pub custom_title: Option<String>,
    pub status: Option<LinkStatus>,
    pub tags: Option<Vec<String>>,
}

impl SavedLinkUpdate {
    /// Apply to `link`. Moving to `Read` stamps `read_at` only the first time.
    pub fn apply(&self, link: &mut SavedLink, now: DateTime<Utc>) {
        if let Some(note) = &self.custom_note {
            link.custom_note = Some(note.clone());
        }
        if let Some(title) = &self.custom_title {
            link.custom_title = Some(title.clone());
        }
        if let Some(status) = self.status {
            link.status = status;
            if status == LinkStatus::Read && link.read_at.is_none() {
                link.read_at = Some(now);
            }
        }
        if let Some(tags) = &self.tags {
            link.tags = tags.clone();
        }
    }
}

/// Trim tags and drop blank ones, keeping order.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Outcome of saving: a fresh row, or the row the owner already had.
#[derive(Debug, Clone)]
pub enum SaveOutcome {
    Created(SavedLink),
    Existing(SavedLink),
}

// ============================================================================
// Listing
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SavedLinkFilter {
    pub category: Option<LinkCategory>,
    pub status: Option<LinkStatus>,
}

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: i64,
    pub size: i64,
}

impl PageRequest {
    pub const DEFAULT_SIZE: i64 = 20;
    pub const MAX_SIZE: i64 = 100;

    /// Page number floors at 1; size is clamped to `1..=MAX_SIZE`.
    pub fn new(number: Option<i64>, size: Option<i64>) -> Self {
        PageRequest {
            number: number.unwrap_or(1).max(1),
            size: size.unwrap_or(Self::DEFAULT_SIZE).clamp(1, Self::MAX_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1).saturating_mul(self.size)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub page_number: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: i64, request: PageRequest) -> Self {
        let total_pages = (total_count + request.size - 1) / request.size;
        Page {
            items,
            total_count,
            page_number: request.number,
            page_size: request.size,
            total_pages,
            has_previous_page: request.number > 1,
            has_next_page: request.number < total_pages,
        }
    }
}

/// API shape of a saved link: the bookmark with its parsed link inlined.
#[derive(Debug, Clone, Serialize)]
pub struct SavedLinkView {
    pub id: Uuid,
    pub parsed_link: ParsedLink,
    pub custom_note: Option<String>,
    pub custom_title: Option<String>,
    pub tags: Vec<String>,
    pub status: LinkStatus,
    pub saved_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl SavedLinkView {
    pub fn new(saved: SavedLink, parsed_link: ParsedLink) -> Self {
        SavedLinkView {
            id: saved.id,
            parsed_link,
            custom_note: saved.custom_note,
            custom_title: saved.custom_title,
            tags: saved.tags,
            status: saved.status,
            saved_at: saved.saved_at,
            read_at: saved.read_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn saved() -> SavedLink {
        SavedLink::new(
            NewSavedLink {
                parsed_link_id: Uuid::new_v4(),
                owner_id: "session-a".into(),
                custom_note: None,
                custom_title: None,
                tags: vec![],
            },
            Utc::now(),
        )
    }

    #[test]
    fn new_link_starts_unread() {
        let link = saved();
        assert_eq!(link.status, LinkStatus::Unread);
        assert!(link.read_at.is_none());
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!(LinkStatus::from_str("favourite").unwrap(), LinkStatus::Favourite);
        assert_eq!(LinkStatus::from_str("READ").unwrap(), LinkStatus::Read);
        assert!(LinkStatus::from_str("starred").is_err());
    }

    #[test]
    fn toggle_favourite_flips_between_favourite_and_read() {
        let mut link = saved();
        link.toggle_favourite();
        assert_eq!(link.status, LinkStatus::Favourite);
        link.toggle_favourite();
        assert_eq!(link.status, LinkStatus::Read);
        link.toggle_favourite();
        assert_eq!(link.status, LinkStatus::Favourite);
    }

    #[test]
    fn mark_read_restamps_read_at() {
        let mut link = saved();
        let first = Utc::now() - chrono::Duration::hours(1);
        link.mark_read(first);
        let second = Utc::now();
        link.mark_read(second);
        assert_eq!(link.status, LinkStatus::Read);
        assert_eq!(link.read_at, Some(second));
    }

    #[test]
    fn update_to_read_stamps_read_at_once() {
        let mut link = saved();
        let first = Utc::now() - chrono::Duration::hours(1);
        let update = SavedLinkUpdate {
            status: Some(LinkStatus::Read),
            ..SavedLinkUpdate::default()
        };

        update.apply(&mut link, first);
        update.apply(&mut link, Utc::now());

        assert_eq!(link.read_at, Some(first));
    }

    #[test]
    fn update_leaves_unset_fields_alone() {
        let mut link = saved();
        link.custom_note = Some("keep me".into());
        link.tags = vec!["rust".into()];

        SavedLinkUpdate {
            custom_title: Some("New title".into()),
            ..SavedLinkUpdate::default()
        }
        .apply(&mut link, Utc::now());

        assert_eq!(link.custom_note.as_deref(), Some("keep me"));
        assert_eq!(link.custom_title.as_deref(), Some("New title"));
        assert_eq!(link.tags, vec!["rust".to_string()]);
        assert_eq!(link.status, LinkStatus::Unread);
    }

    #[test]
    fn tags_are_trimmed_and_blank_ones_dropped() {
        let tags = normalize_tags(vec![" rust ".into(), "".into(), "  ".into(), "async".into()]);
        assert_eq!(tags, vec!["rust".to_string(), "async".to_string()]);
    }

    #[test]
    fn page_request_clamps() {
        assert_eq!(PageRequest::new(None, None), PageRequest { number: 1, size: 20 });
        assert_eq!(PageRequest::new(Some(0), Some(0)), PageRequest { number: 1, size: 1 });
        assert_eq!(PageRequest::new(Some(3), Some(500)).size, 100);
        assert_eq!(PageRequest::new(Some(3), Some(10)).offset(), 20);
    }

    #[test]
    fn page_metadata() {
        let page = Page::new(vec![1, 2], 5, PageRequest::new(Some(2), Some(2)));
        assert_eq!(page.total_pages, 3);
        assert!(page.has_previous_page);
        assert!(page.has_next_page);

        let last = Page::new(vec![5], 5, PageRequest::new(Some(3), Some(2)));
        assert!(!last.has_next_page);

        let empty: Page<i32> = Page::new(vec![], 0, PageRequest::new(None, None));
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_previous_page);
        assert!(!empty.has_next_page);
    }
}
