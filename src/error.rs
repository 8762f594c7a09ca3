//! Client error taxonomy.
//!
//! ERROR HANDLING
//! ==============
//! Every operation fails with one `ClientError`. Front ends never show the
//! `Display` text directly; they call `user_message` with the operation that
//! failed so backend messages and per-operation fallbacks stay consistent.

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

/// Message shown when a 2xx response does not match its schema.
pub const UNEXPECTED_RESPONSE_MESSAGE: &str = "Unexpected response from server";

/// Errors produced by client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Input rejected before any request was issued.
    #[error("{0}")]
    Validation(String),

    /// The backend answered with a success status but an unusable body.
    #[error("unexpected response from server")]
    UnexpectedResponse,

    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("no error message"))]
    Http { status: u16, message: Option<String> },

    /// The request never completed.
    #[error("network request failed: {0}")]
    Network(String),

    /// The key/value backend could not be written.
    #[error("session storage failed: {0}")]
    Storage(String),

    /// Configuration value could not be used.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Whether the backend rejected the credentials.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Http { status: 401, .. })
    }

    /// User-facing text for this error when raised by `op`.
    #[must_use]
    pub fn user_message(&self, op: Operation) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::UnexpectedResponse => UNEXPECTED_RESPONSE_MESSAGE.to_owned(),
            Self::Http { message: Some(message), .. } if !message.is_empty() => message.clone(),
            _ => op.fallback_message().to_owned(),
        }
    }
}

/// Client operations, used to pick a fallback error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Signup,
    Signin,
    GetProfile,
    UpdateProfile,
    CreatePost,
    ListPosts,
    ListUserPosts,
    PublicFeed,
}

impl Operation {
    #[must_use]
    pub fn fallback_message(self) -> &'static str {
        match self {
            Self::Signup => "Failed to sign up. Please try again.",
            Self::Signin => "Failed to sign in. Please try again.",
            Self::GetProfile => "Failed to fetch profile",
            Self::UpdateProfile => "Failed to update profile",
            Self::CreatePost => "Failed to create post",
            Self::ListUserPosts => "Failed to fetch user posts",
            Self::ListPosts | Self::PublicFeed => "Failed to load posts. Please try again later.",
        }
    }
}
