//! Wire schema for the REST backend.
//!
//! DESIGN
//! ======
//! Each endpoint gets its own request and response type. Fields the backend
//! may omit are `Option` on the envelope types, so a malformed success body
//! is detected by the shape check in `into_*` rather than by probing JSON.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

// =============================================================================
// DOMAIN
// =============================================================================

/// A user as returned by the auth and profile endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Backend-assigned identifier (hex object id).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Unique handle, shown as `@username`.
    pub username: String,
    pub email: String,
}

/// Author snapshot embedded in each post at creation time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostAuthor {
    pub name: String,
    pub username: String,
}

/// A post from the feed or the user's own list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Backend-assigned identifier; omitted by the backend when unset.
    #[serde(default)]
    pub id: String,
    /// Identifier of the author.
    pub user_id: String,
    pub content: String,
    pub author: PostAuthor,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Client-held proof of authentication plus the cached identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

// =============================================================================
// REQUESTS
// =============================================================================

/// Body of `POST /auth/signup`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/signin`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

/// Body of `PUT /profile`. Blank fields are left unchanged by the backend.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub username: String,
    pub email: String,
}

impl ProfileUpdate {
    /// Start an edit from the currently cached user.
    #[must_use]
    pub fn from_user(user: &User) -> Self {
        Self { name: user.name.clone(), username: user.username.clone(), email: user.email.clone() }
    }
}

/// Body of `POST /posts`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub content: String,
}

// =============================================================================
// RESPONSES
// =============================================================================

/// Body returned by signup and signin.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct AuthResponse {
    pub token: Option<String>,
    pub user: Option<User>,
}

impl AuthResponse {
    /// A session only when both a non-empty token and a user are present.
    pub(crate) fn into_session(self) -> Option<Session> {
        match (self.token, self.user) {
            (Some(token), Some(user)) if !token.is_empty() => Some(Session { token, user }),
            _ => None,
        }
    }
}

/// Body returned by `GET /profile` and `PUT /profile`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct UserEnvelope {
    pub user: Option<User>,
}

/// Body returned by the post listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct PostsEnvelope {
    /// The backend encodes an empty result as `null`.
    #[serde(default)]
    pub posts: Option<Vec<Post>>,
}

impl PostsEnvelope {
    pub(crate) fn into_posts(self) -> Vec<Post> {
        self.posts.unwrap_or_default()
    }
}

/// Error body: `{"error": "..."}`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
}
