mod link;
mod saved_link;

pub use link::{ContentType, LinkCategory, LinkRecord, ParsedLink};
pub use saved_link::{
    normalize_tags, LinkStatus, NewSavedLink, Page, PageRequest, SaveOutcome, SavedLink,
    SavedLinkFilter, SavedLinkUpdate, SavedLinkView,
};
