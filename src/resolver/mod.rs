//! Link resolution: URL → fetch → extract → classify → `LinkRecord`.

pub mod classifier;
pub mod error;
pub mod extractor;
pub mod fetcher;

use std::sync::Arc;

use chrono::Utc;

pub use classifier::{categorize, determine_content_type};
pub use error::FetchError;
pub use extractor::{extract_metadata, make_absolute_url, PageMetadata};
pub use fetcher::{
    is_valid_url, parse_http_url, FetcherConfig, HttpFetcher, PageFetcher, USER_AGENT,
};

use crate::models::LinkRecord;

/// Stateless front door to the resolution pipeline.
///
/// Cheap to clone; concurrent calls share nothing but the fetcher.
#[derive(Clone)]
pub struct LinkResolver {
    fetcher: Arc<dyn PageFetcher>,
}

impl LinkResolver {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        LinkResolver { fetcher }
    }

    /// Resolve `url` into a record. Never fails: every error becomes a record
    /// with `is_valid_url = false` and an `error_message`.
    pub async fn resolve(&self, url: &str) -> LinkRecord {
        let parsed_at = Utc::now();

        let parsed = match parse_http_url(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(url = %url, "Rejected URL before fetch");
                return LinkRecord::failed(url, None, parsed_at, e.to_string());
            }
        };

        let domain = parsed.host_str().map(|h| h.to_string());

        let html = match self.fetcher.fetch(&parsed).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(error = %e, url = %url, "Link resolution failed");
                return LinkRecord::failed(url, domain, parsed_at, e.to_string());
            }
        };

        let metadata = extract_metadata(&html, &parsed);

        let title = metadata.title.as_deref().unwrap_or("");
        let description = metadata.description.as_deref().unwrap_or("");
        let site_name = metadata.site_name.as_deref().unwrap_or("");

        let content_type = determine_content_type(url, title, description, site_name);
        let category = categorize(
            title,
            description,
            domain.as_deref().unwrap_or(""),
            site_name,
        );

        tracing::debug!(url = %url, %content_type, %category, "Link resolved");

        LinkRecord {
            original_url: url.to_string(),
            title: metadata.title,
            description: metadata.description,
            image_url: metadata.image_url,
            author: metadata.author,
            site_name: metadata.site_name,
            domain,
            content_type,
            category,
            parsed_at,
            is_valid_url: true,
            error_message: None,
        }
    }
}

// ── Unit tests ─────────────────────────────────────────────────────────────
