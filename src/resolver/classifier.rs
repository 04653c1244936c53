//! Heuristic classification of a resolved link.
//!
//! Both entry points are pure: lower-cased substring tests against fixed
//! tables, evaluated in order, first match wins. Table order is behaviour.

use crate::models::{ContentType, LinkCategory};

// ============================================================================
// Content type
// ============================================================================

/// Which input a content-type marker is tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Url,
    Title,
    Description,
    SiteName,
}

pub type Marker = (Field, &'static str);

pub const VIDEO_MARKERS: &[Marker] = &[
    (Field::Url, "youtube.com"),
    (Field::Url, "youtu.be"),
    (Field::Url, "vimeo.com"),
    (Field::Url, "twitch.tv"),
    (Field::Title, "video"),
    (Field::Description, "watch"),
];

pub const ARTICLE_MARKERS: &[Marker] = &[
    // Blogs and long-form platforms
    (Field::Url, "blog"),
    (Field::Url, "article"),
    (Field::Url, "medium.com"),
    (Field::Url, "dev.to"),
    (Field::SiteName, "blog"),
    (Field::Title, "tutorial"),
    (Field::Description, "article"),
    // Social platforms
    (Field::Url, "twitter.com"),
    (Field::Url, "x.com"),
    (Field::Url, "facebook.com"),
    (Field::Url, "instagram.com"),
    (Field::Url, "linkedin.com"),
    (Field::Url, "tiktok.com"),
    // News
    (Field::SiteName, "news"),
    (Field::Url, "news"),
    (Field::Title, "breaking"),
    (Field::Description, "reported"),
    // Documentation
    (Field::Url, "docs"),
    (Field::Url, "documentation"),
    (Field::Url, "reference"),
    (Field::Url, "api"),
    (Field::Title, "documentation"),
    (Field::Title, "guide"),
];

pub const SHOPPING_MARKERS: &[Marker] = &[
    (Field::Url, "shop"),
    (Field::Url, "store"),
    (Field::Url, "amazon.com"),
    (Field::Url, "ebay.com"),
    (Field::Title, "buy"),
    (Field::Description, "price"),
];

/// Ordered content-type rules. Shopping pages are deliberately reported as
/// `Article`; there is no commerce type in use yet.
pub const CONTENT_TYPE_RULES: &[(ContentType, &[Marker])] = &[
    (ContentType::Video, VIDEO_MARKERS),
    (ContentType::Article, ARTICLE_MARKERS),
    (ContentType::Article, SHOPPING_MARKERS),
];

/// Lower-cased view of the inputs to `determine_content_type`.
struct ContentInputs {
    url: String,
    title: String,
    description: String,
    site_name: String,
}

impl ContentInputs {
    fn get(&self, field: Field) -> &str {
        match field {
            Field::Url => &self.url,
            Field::Title => &self.title,
            Field::Description => &self.description,
            Field::SiteName => &self.site_name,
        }
    }

    fn matches_any(&self, markers: &[Marker]) -> bool {
        markers
            .iter()
            .any(|(field, needle)| self.get(*field).contains(needle))
    }
}

pub fn determine_content_type(
    url: &str,
    title: &str,
    description: &str,
    site_name: &str,
) -> ContentType {
    let inputs = ContentInputs {
        url: url.to_lowercase(),
        title: title.to_lowercase(),
        description: description.to_lowercase(),
        site_name: site_name.to_lowercase(),
    };

    CONTENT_TYPE_RULES
        .iter()
        .find(|(_, markers)| inputs.matches_any(markers))
        .map(|(content_type, _)| *content_type)
        .unwrap_or(ContentType::Website)
}

// ============================================================================
// Category
// ============================================================================

pub const TECH_KEYWORDS: &[&str] = &[
    "tech", "technology", "programming", "coding", "software", "developer", "github",
    "stackoverflow", "dev.to", "medium", "api", "framework", "javascript", "python", "react",
    "angular", "vue", "nodejs", "css", "html",
];

pub const NEWS_KEYWORDS: &[&str] = &[
    "news", "breaking", "report", "reuters", "bbc", "cnn", "guardian", "times", "post", "herald",
    "daily", "weekly",
];

pub const NEWS_DOMAINS: &[&str] = &[
    "bbc.com",
    "cnn.com",
    "reuters.com",
    "guardian.co.uk",
    "nytimes.com",
    "washingtonpost.com",
    "theguardian.com",
    "bloomberg.com",
    "npr.org",
    "punchng.com",
    "vanguardngr.com",
    "premiumtimesng.com",
    "thecable.ng",
];

pub const EDUCATION_KEYWORDS: &[&str] = &[
    "education", "course", "tutorial", "learn", "study", "university", "college", "khan academy",
    "coursera", "udemy", "edx", "lesson", "training", "certification",
];

pub const ENTERTAINMENT_KEYWORDS: &[&str] = &[
    "entertainment", "movie", "film", "music", "game", "gaming", "netflix", "spotify", "youtube",
    "tiktok", "instagram", "funny", "meme", "viral",
];

pub const SHOPPING_KEYWORDS: &[&str] = &[
    "shop", "buy", "purchase", "price", "amazon", "ebay", "jumia", "konga", "store", "cart",
    "product", "deal", "discount", "sale",
];

pub const HEALTH_KEYWORDS: &[&str] = &[
    "health", "medical", "doctor", "medicine", "fitness", "nutrition", "wellness", "diet",
    "exercise", "hospital", "clinic",
];

pub const BUSINESS_KEYWORDS: &[&str] = &[
    "business", "entrepreneur", "startup", "company", "corporate", "finance", "investment",
    "market", "economy", "trading", "stock",
];

pub const SPORTS_KEYWORDS: &[&str] = &[
    "sport", "football", "basketball", "tennis", "soccer", "olympics", "fifa", "nba",
    "premier league", "champions league",
];

pub const LIFESTYLE_KEYWORDS: &[&str] = &[
    "lifestyle", "fashion", "travel", "food", "recipe", "cooking", "home", "garden", "beauty",
    "style",
];

pub const SCIENCE_KEYWORDS: &[&str] = &[
    "science", "research", "study", "physics", "chemistry", "biology", "astronomy", "nature",
    "scientific", "journal",
];

pub const POLITICS_KEYWORDS: &[&str] = &[
    "politics", "government", "election", "vote", "president", "minister", "congress",
    "parliament", "policy", "law",
];

pub const DIY_KEYWORDS: &[&str] = &[
    "diy", "tutorial", "how to", "guide", "repair", "fix", "build", "make", "craft", "project",
];

pub const INSPIRATION_KEYWORDS: &[&str] = &[
    "inspiration", "motivational", "quote", "success", "achievement", "goal", "dream", "inspire",
    "motivation",
];

/// Category rules in evaluation order.
pub const CATEGORY_RULES: &[(LinkCategory, &[&str])] = &[
    (LinkCategory::Tech, TECH_KEYWORDS),
    (LinkCategory::News, NEWS_KEYWORDS),
    (LinkCategory::Education, EDUCATION_KEYWORDS),
    (LinkCategory::Entertainment, ENTERTAINMENT_KEYWORDS),
    (LinkCategory::Shopping, SHOPPING_KEYWORDS),
    (LinkCategory::Health, HEALTH_KEYWORDS),
    (LinkCategory::Business, BUSINESS_KEYWORDS),
    (LinkCategory::Sports, SPORTS_KEYWORDS),
    (LinkCategory::Lifestyle, LIFESTYLE_KEYWORDS),
    (LinkCategory::Science, SCIENCE_KEYWORDS),
    (LinkCategory::Politics, POLITICS_KEYWORDS),
    (LinkCategory::Diy, DIY_KEYWORDS),
    (LinkCategory::Inspiration, INSPIRATION_KEYWORDS),
];

fn contains_any(content: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| content.contains(keyword))
}

/// `true` if `domain` contains one of the known news domains.
pub fn is_news_domain(domain: &str) -> bool {
    let domain = domain.to_lowercase();
    NEWS_DOMAINS.iter().any(|site| domain.contains(site))
}

pub fn categorize(title: &str, description: &str, domain: &str, site_name: &str) -> LinkCategory {
    let content = format!("{title} {description} {domain} {site_name}").to_lowercase();

    CATEGORY_RULES
        .iter()
        .find(|(category, keywords)| {
            contains_any(&content, keywords)
                || (*category == LinkCategory::News && is_news_domain(domain))
        })
        .map(|(category, _)| *category)
        .unwrap_or(LinkCategory::Uncategorized)
}

// ============================================================================
// Unit tests
// ============================================================================
