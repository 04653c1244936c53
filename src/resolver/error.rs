use reqwest::StatusCode;
use thiserror::Error;

/// Why a page could not be turned into metadata.
///
/// The `Display` text is what ends up in `LinkRecord::error_message`.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Malformed, relative, or non-http(s) URL. No request is attempted.
    #[error("Invalid URL format")]
    InvalidUrl,

    /// The server answered with a non-2xx status.
    #[error("Failed to fetch content: {0}")]
    Status(StatusCode),

    /// Connection, TLS, redirect or timeout failure.
    #[error("Failed to fetch content: {0}")]
    Transport(String),

    /// The host resolves to an address the fetcher refuses to contact.
    #[error("Failed to fetch content: URL resolves to a private or reserved address")]
    PrivateAddress,

    /// The body arrived but could not be read as a document.
    #[error("Failed to parse link content")]
    ParseFailure(String),
}
