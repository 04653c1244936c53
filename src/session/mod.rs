use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

pub const SESSION_HEADER: &str = "x-session-id";
pub const MAX_SESSION_ID_LEN: usize = 128;

// ============================================================================
// Session owner
// ============================================================================

/// Owner of saved links, taken from the `X-Session-Id` request header.
///
/// There are no accounts: whoever presents the same session id sees the same
/// saved links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOwner {
    pub owner_id: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionOwner
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(SESSION_HEADER)
            .ok_or_else(|| AppError::Auth("Missing X-Session-Id header".into()))?;

        let owner_id = raw
            .to_str()
            .map(str::trim)
            .map_err(|_| AppError::Auth("Invalid X-Session-Id header".into()))?;

        if owner_id.is_empty() || owner_id.len() > MAX_SESSION_ID_LEN {
            return Err(AppError::Auth(format!(
                "X-Session-Id must be between 1 and {MAX_SESSION_ID_LEN} characters"
            )));
        }

        Ok(SessionOwner {
            owner_id: owner_id.to_string(),
        })
    }
}
