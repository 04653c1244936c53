use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum::{Display, EnumString};
use uuid::Uuid;

// ============================================================================
// Classification enums
// ============================================================================

/// Structural nature of the linked content.
///
/// Only `Video`, `Article` and `Website` are produced by the current rule set.
/// The remaining members are valid stored states kept for future rules;
/// `Unknown` marks a record whose classification never ran.
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
pub enum ContentType {
    Article,
    Video,
    Website,
    Product,
    SocialPost,
    Podcast,
    Image,
    Document,
    #[default]
    Unknown,
}

/// Topical bucket a link is filed under.
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
pub enum LinkCategory {
    Tech,
    News,
    Education,
    Lifestyle,
    Entertainment,
    Business,
    Shopping,
    Health,
    Politics,
    Science,
    Sports,
    #[serde(rename = "DIY")]
    #[strum(serialize = "DIY")]
    #[sqlx(rename = "DIY")]
    Diy,
    Inspiration,
    #[default]
    Uncategorized,
}

// ============================================================================
// Resolver output
// ============================================================================

/// Everything the resolver learned about one URL.
///
/// Produced fresh on every resolution. When `is_valid_url` is false every
/// extracted field is `None` and `error_message` says why; `domain` is still
/// set whenever the URL itself parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkRecord {
    pub original_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub author: Option<String>,
    pub site_name: Option<String>,
    pub domain: Option<String>,
    pub content_type: ContentType,
    pub category: LinkCategory,
    pub parsed_at: DateTime<Utc>,
    pub is_valid_url: bool,
    pub error_message: Option<String>,
}

impl LinkRecord {
    /// A record for a URL that could not be resolved.
    pub fn failed(
        original_url: impl Into<String>,
        domain: Option<String>,
        parsed_at: DateTime<Utc>,
        error_message: impl Into<String>,
    ) -> Self {
        LinkRecord {
            original_url: original_url.into(),
            title: None,
            description: None,
            image_url: None,
            author: None,
            site_name: None,
            domain,
            content_type: ContentType::Unknown,
            category: LinkCategory::Uncategorized,
            parsed_at,
            is_valid_url: false,
            error_message: Some(error_message.into()),
        }
    }
}

// ============================================================================
// Stored rows
// ============================================================================

/// A `parsed_links` row: a `LinkRecord` plus its storage id.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ParsedLink {
    pub id: Uuid,
    pub original_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub author: Option<String>,
    pub site_name: Option<String>,
    pub domain: Option<String>,
    pub content_type: ContentType,
    pub category: LinkCategory,
    pub parsed_at: DateTime<Utc>,
    pub is_valid_url: bool,
    pub error_message: Option<String>,
}

impl ParsedLink {
    pub fn from_record(id: Uuid, record: LinkRecord) -> Self {
        ParsedLink {
            id,
            original_url: record.original_url,
            title: record.title,
            description: record.description,
            image_url: record.image_url,
            author: record.author,
            site_name: record.site_name,
            domain: record.domain,
            content_type: record.content_type,
            category: record.category,
            parsed_at: record.parsed_at,
            is_valid_url: record.is_valid_url,
            error_message: record.error_message,
        }
    }
}
