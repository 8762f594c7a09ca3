use super::*;

// =============================================================================
// user_message
// =============================================================================

#[test]
fn validation_message_is_shown_verbatim() {
    let err = ClientError::Validation("Name is required".into());
    assert_eq!(err.user_message(Operation::Signup), "Name is required");
}

#[test]
fn unexpected_response_has_fixed_message() {
    let err = ClientError::UnexpectedResponse;
    assert_eq!(err.user_message(Operation::Signin), "Unexpected response from server");
}

#[test]
fn http_error_prefers_backend_message() {
    let err = ClientError::Http { status: 400, message: Some("Email already exists".into()) };
    assert_eq!(err.user_message(Operation::Signup), "Email already exists");
}

#[test]
fn http_error_without_message_uses_fallback() {
    let err = ClientError::Http { status: 500, message: None };
    assert_eq!(err.user_message(Operation::Signup), "Failed to sign up. Please try again.");
}

#[test]
fn http_error_with_empty_message_uses_fallback() {
    let err = ClientError::Http { status: 500, message: Some(String::new()) };
    assert_eq!(err.user_message(Operation::UpdateProfile), "Failed to update profile");
}

#[test]
fn network_error_uses_fallback() {
    let err = ClientError::Network("connection refused".into());
    assert_eq!(err.user_message(Operation::PublicFeed), "Failed to load posts. Please try again later.");
    assert_eq!(err.user_message(Operation::CreatePost), "Failed to create post");
}

// =============================================================================
// is_unauthorized
// =============================================================================

#[test]
fn is_unauthorized_only_for_401() {
    assert!(ClientError::Http { status: 401, message: None }.is_unauthorized());
    assert!(!ClientError::Http { status: 403, message: None }.is_unauthorized());
    assert!(!ClientError::UnexpectedResponse.is_unauthorized());
}

#[test]
fn http_display_includes_status_and_message() {
    let err = ClientError::Http { status: 404, message: Some("User not found".into()) };
    assert_eq!(err.to_string(), "HTTP 404: User not found");
}
