//! Identity of the caller.
//!
//! Authentication happens upstream; the proxy in front of the server
//! forwards the verified user in the `x-user-id` and `x-user-name` headers.
//! Requests without an id are anonymous.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use linkword::UserRef;
use std::convert::Infallible;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the authenticated user's display name.
pub const USER_NAME_HEADER: &str = "x-user-name";

/// The calling user, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Viewer(pub Option<UserRef>);

impl Viewer {
    /// Reads the caller from request headers.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };
        let user = header(USER_ID_HEADER)
            .map(|id| UserRef::new(id, header(USER_NAME_HEADER).unwrap_or(id)));
        Self(user)
    }

    /// Borrowed view of the caller.
    pub fn user(&self) -> Option<&UserRef> {
        self.0.as_ref()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Viewer {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
