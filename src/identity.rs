//! The identity of the signed in user, as asserted by the identity provider.
//!
//! Sign in happens outside this service. An authenticating reverse proxy in
//! front of the server verifies the session with the identity provider and
//! forwards the user's details in request headers:
//!
//! - [USER_ID_HEADER]: the provider's stable user ID (required),
//! - [USER_EMAIL_HEADER]: the user's primary email address (optional),
//! - [USER_NAME_HEADER]: the user's display name (optional).
//!
//! These headers must be stripped from client requests by the proxy.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::Error;

/// The header carrying the identity provider's user ID.
pub const USER_ID_HEADER: &str = "x-user-id";
/// The header carrying the user's email address.
pub const USER_EMAIL_HEADER: &str = "x-user-email";
/// The header carrying the user's display name.
pub const USER_NAME_HEADER: &str = "x-user-name";

/// A user as known to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    /// The provider's ID for the user.
    pub external_id: String,
    /// The user's email address, if shared.
    pub email: Option<String>,
    /// The user's display name, if shared.
    pub name: Option<String>,
}

impl<S> FromRequestParts<S> for ExternalIdentity
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(external_id) = header_text(parts, USER_ID_HEADER) else {
            tracing::warn!("Request to {} has no user identity", parts.uri.path());
            return Err(Error::Unauthenticated);
        };

        Ok(Self {
            external_id,
            email: header_text(parts, USER_EMAIL_HEADER),
            name: header_text(parts, USER_NAME_HEADER),
        })
    }
}

/// The trimmed value of the header `name`, or `None` if it is absent, blank
/// or not valid text.
fn header_text(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}
