//! Form checks that run before any request is issued.

#[cfg(test)]
#[path = "validation_test.rs"]
mod tests;

use crate::error::ClientError;
use crate::net::types::{NewPost, SigninRequest, SignupRequest};

pub const MIN_PASSWORD_LEN: usize = 6;

fn require(value: &str, message: &str) -> Result<(), ClientError> {
    if value.trim().is_empty() {
        return Err(ClientError::Validation(message.to_owned()));
    }
    Ok(())
}

/// Check a signup form and return the trimmed payload to send.
///
/// # Errors
///
/// Returns `ClientError::Validation` with the first failing field's message.
pub fn signup(form: &SignupRequest) -> Result<SignupRequest, ClientError> {
    require(&form.name, "Name is required")?;
    require(&form.username, "Username is required")?;
    require(&form.email, "Email is required")?;
    require(&form.password, "Password is required")?;
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ClientError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    Ok(SignupRequest {
        name: form.name.trim().to_owned(),
        username: form.username.trim().to_owned(),
        email: form.email.trim().to_owned(),
        password: form.password.trim().to_owned(),
    })
}

/// Check a signin form. Values are sent as entered.
///
/// # Errors
///
/// Returns `ClientError::Validation` when email or password is blank.
pub fn signin(form: &SigninRequest) -> Result<(), ClientError> {
    require(&form.email, "Email is required")?;
    require(&form.password, "Password is required")
}

/// Check post content and return the trimmed payload.
///
/// # Errors
///
/// Returns `ClientError::Validation` when the content is blank.
pub fn new_post(content: &str) -> Result<NewPost, ClientError> {
    require(content, "Post content is required")?;
    Ok(NewPost { content: content.trim().to_owned() })
}
