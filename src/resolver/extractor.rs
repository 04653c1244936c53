use scraper::{Html, Selector};
use url::Url;

/// Fields pulled out of a page before classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub author: Option<String>,
    pub site_name: Option<String>,
}

// ── Fallback chains ────────────────────────────────────────────────────────

/// One place a field's value may come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// `<meta property="…" content="…">`
    MetaProperty(&'static str),
    /// `<meta name="…" content="…">`
    MetaName(&'static str),
    /// Text of the first `<title>` element.
    TitleTag,
    /// `href` of `<link rel="…">`
    LinkRel(&'static str),
}

pub const TITLE_CHAIN: &[Source] = &[
    Source::MetaProperty("og:title"),
    Source::MetaName("twitter:title"),
    Source::TitleTag,
];

pub const DESCRIPTION_CHAIN: &[Source] = &[
    Source::MetaProperty("og:description"),
    Source::MetaName("twitter:description"),
    Source::MetaName("description"),
];

pub const IMAGE_CHAIN: &[Source] = &[
    Source::MetaProperty("og:image"),
    Source::MetaName("twitter:image"),
    Source::LinkRel("icon"),
];

pub const AUTHOR_CHAIN: &[Source] = &[Source::MetaProperty("og:author"), Source::MetaName("author")];

pub const SITE_NAME_CHAIN: &[Source] = &[Source::MetaProperty("og:site_name")];

impl Source {
    /// Trimmed, non-blank value for this source, if the document has one.
    pub fn read(self, doc: &Html) -> Option<String> {
        let raw = match self {
            Source::MetaProperty(property) => {
                first_attr(doc, &format!(r#"meta[property="{property}"]"#), "content")
            }
            Source::MetaName(name) => first_attr(doc, &format!(r#"meta[name="{name}"]"#), "content"),
            Source::LinkRel(rel) => first_attr(doc, &format!(r#"link[rel="{rel}"]"#), "href"),
            Source::TitleTag => {
                let selector = Selector::parse("title").ok()?;
                doc.select(&selector).next().map(|el| el.text().collect::<String>())
            }
        }?;

        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

fn first_attr(doc: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    doc.select(&selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::to_string)
}

/// Walk `chain` in order and return the first non-blank value.
pub fn first_match(doc: &Html, chain: &[Source]) -> Option<String> {
    chain.iter().find_map(|source| source.read(doc))
}

// ── Extraction ─────────────────────────────────────────────────────────────

/// Parse `html` and extract its metadata, resolving images against `base_url`.
///
/// Title and site name fall back to the URL's host when the page names
/// neither.
pub fn extract_metadata(html: &str, base_url: &Url) -> PageMetadata {
    let document = Html::parse_document(html);
    extract(&document, base_url)
}

pub fn extract(doc: &Html, base_url: &Url) -> PageMetadata {
    let host = base_url.host_str().map(|h| h.to_string());

    PageMetadata {
        title: first_match(doc, TITLE_CHAIN).or_else(|| host.clone()),
        description: first_match(doc, DESCRIPTION_CHAIN),
        image_url: first_match(doc, IMAGE_CHAIN).map(|src| make_absolute_url(&src, base_url)),
        author: first_match(doc, AUTHOR_CHAIN),
        site_name: first_match(doc, SITE_NAME_CHAIN).or(host),
    }
}

/// Return `value` unchanged if it is already absolute, otherwise join it onto
/// `base`. Values that cannot be joined are returned as-is.
pub fn make_absolute_url(value: &str, base: &Url) -> String {
    if Url::parse(value).is_ok() {
        return value.to_string();
    }

    base.join(value)
        .map(|joined| joined.to_string())
        .unwrap_or_else(|_| value.to_string())
}

// ── Unit tests ─────────────────────────────────────────────────────────────
