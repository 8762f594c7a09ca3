//! REST gateway for the Komunal backend.
//!
//! ARCHITECTURE
//! ============
//! Every operation goes through `request` (attach the bearer token when one
//! is stored) and `execute` (status check, 401 policy, typed decode). The
//! token `request` attached travels with the call, so a 401 only drops the
//! session it was issued for. Exactly
//! one HTTP request per operation; no retries.
//!
//! ERROR HANDLING
//! ==============
//! A 401 from an endpoint that needs a session invalidates it through
//! `SessionManager` before the error is returned, so watchers see the forced
//! signout immediately. The auth endpoints and the public feed never
//! invalidate: a rejected signin says nothing about the session already held.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use super::types::{
    AuthResponse, ErrorBody, Post, PostsEnvelope, ProfileUpdate, Session, SigninRequest, SignupRequest, User,
    UserEnvelope,
};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::state::auth::SessionManager;
use crate::util::storage::{FileStore, KeyValueStore};
use crate::util::validation;

/// Whether a 401 from an endpoint means the stored session is dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthPolicy {
    /// Behind the backend's auth middleware; a 401 invalidates.
    Required,
    /// Served without auth; a 401 leaves the session alone.
    Public,
}

/// A built request plus the bearer token it carries.
struct Call {
    builder: RequestBuilder,
    token: Option<String>,
}

impl Call {
    fn json<T: serde::Serialize + ?Sized>(self, body: &T) -> Self {
        Self { builder: self.builder.json(body), token: self.token }
    }
}

/// Typed client over the backend's REST endpoints.
pub struct ApiClient<S> {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionManager<S>>,
}

impl ApiClient<FileStore> {
    /// Open the configured session file and build a client over it.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if the HTTP client cannot be built.
    pub fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        let session = Arc::new(SessionManager::init(FileStore::open(&config.session_file)));
        Self::new(config, session)
    }
}

impl<S: KeyValueStore> ApiClient<S> {
    /// Build a client that reads and updates `session`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, session: Arc<SessionManager<S>>) -> Result<Self, ClientError> {
        let builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.connect_timeout(std::time::Duration::from_secs(config.connect_timeout_secs));
        let http = builder.build().map_err(|e| ClientError::Config(format!("http client build failed: {e}")))?;
        Ok(Self { http, base_url: config.api_url.trim_end_matches('/').to_owned(), session })
    }

    /// The session manager this client reports to.
    pub fn session(&self) -> &Arc<SessionManager<S>> {
        &self.session
    }

    // =========================================================================
    // AUTH
    // =========================================================================

    /// Register via `POST /auth/signup` and persist the issued session.
    ///
    /// # Errors
    ///
    /// `Validation` before any request for an incomplete form or a short
    /// password; `UnexpectedResponse` when the body lacks a token or user;
    /// otherwise `Http`, `Network` or `Storage`.
    pub async fn signup(&self, form: &SignupRequest) -> Result<Session, ClientError> {
        let payload = validation::signup(form)?;
        let request = self.request(Method::POST, "/auth/signup").json(&payload);
        let body: AuthResponse = self.execute(request, AuthPolicy::Public).await?;
        self.establish(body)
    }

    /// Sign in via `POST /auth/signin` and persist the issued session.
    ///
    /// # Errors
    ///
    /// Same categories as [`ApiClient::signup`]. A 401 here never touches a
    /// session that is already held.
    pub async fn signin(&self, form: &SigninRequest) -> Result<Session, ClientError> {
        validation::signin(form)?;
        let request = self.request(Method::POST, "/auth/signin").json(form);
        let body: AuthResponse = self.execute(request, AuthPolicy::Public).await?;
        self.establish(body)
    }

    /// Drop the session locally. No request is made.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the store could not be cleared.
    pub fn signout(&self) -> Result<(), ClientError> {
        self.session.signout()
    }

    fn establish(&self, body: AuthResponse) -> Result<Session, ClientError> {
        let Some(session) = body.into_session() else {
            tracing::warn!("auth response missing token or user");
            return Err(ClientError::UnexpectedResponse);
        };
        self.session.establish(&session)?;
        Ok(session)
    }

    // =========================================================================
    // PROFILE
    // =========================================================================

    /// Fetch the signed-in user via `GET /profile`.
    ///
    /// # Errors
    ///
    /// `UnexpectedResponse` when the body has no user; otherwise `Http` or
    /// `Network`. A 401 also signs the client out.
    pub async fn get_profile(&self) -> Result<User, ClientError> {
        let request = self.request(Method::GET, "/profile");
        let body: UserEnvelope = self.execute(request, AuthPolicy::Required).await?;
        body.user.ok_or(ClientError::UnexpectedResponse)
    }

    /// Update the profile via `PUT /profile` and cache the returned user.
    ///
    /// # Errors
    ///
    /// Same categories as [`ApiClient::get_profile`], plus `Storage` if the
    /// updated user could not be cached.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ClientError> {
        let request = self.request(Method::PUT, "/profile").json(update);
        let body: UserEnvelope = self.execute(request, AuthPolicy::Required).await?;
        let user = body.user.ok_or(ClientError::UnexpectedResponse)?;
        self.session.update_user(&user)?;
        Ok(user)
    }

    // =========================================================================
    // POSTS
    // =========================================================================

    /// Publish a post via `POST /posts`. Not idempotent.
    ///
    /// # Errors
    ///
    /// `Validation` for blank content; otherwise `UnexpectedResponse`,
    /// `Http` or `Network`. A 401 also signs the client out.
    pub async fn create_post(&self, content: &str) -> Result<Post, ClientError> {
        let payload = validation::new_post(content)?;
        let request = self.request(Method::POST, "/posts").json(&payload);
        self.execute(request, AuthPolicy::Required).await
    }

    /// Recent posts from everyone via `GET /posts`.
    ///
    /// # Errors
    ///
    /// `UnexpectedResponse`, `Http` or `Network`. A 401 also signs the
    /// client out.
    pub async fn list_posts(&self) -> Result<Vec<Post>, ClientError> {
        self.fetch_posts("/posts", AuthPolicy::Required).await
    }

    /// The signed-in user's posts via `GET /posts/user`.
    ///
    /// # Errors
    ///
    /// Same categories as [`ApiClient::list_posts`].
    pub async fn list_user_posts(&self) -> Result<Vec<Post>, ClientError> {
        self.fetch_posts("/posts/user", AuthPolicy::Required).await
    }

    /// The public feed via `GET /feed`. Failures never sign the client out.
    ///
    /// # Errors
    ///
    /// `UnexpectedResponse`, `Http` or `Network`.
    pub async fn public_feed(&self) -> Result<Vec<Post>, ClientError> {
        self.fetch_posts("/feed", AuthPolicy::Public).await
    }

    async fn fetch_posts(&self, path: &str, policy: AuthPolicy) -> Result<Vec<Post>, ClientError> {
        let body: PostsEnvelope = self.execute(self.request(Method::GET, path), policy).await?;
        Ok(body.into_posts())
    }

    // =========================================================================
    // TRANSPORT
    // =========================================================================

    fn request(&self, method: Method, path: &str) -> Call {
        let url = endpoint(&self.base_url, path);
        let token = self.session.token();
        tracing::debug!(%method, path, authenticated = token.is_some(), "api request");
        let builder = self.http.request(method, url);
        let builder = match token.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };
        Call { builder, token }
    }

    async fn execute<T: DeserializeOwned>(&self, call: Call, policy: AuthPolicy) -> Result<T, ClientError> {
        let response = call.builder.send().await.map_err(|e| ClientError::Network(e.to_string()))?;
        let status = response.status();

        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED && policy == AuthPolicy::Required {
                if let Some(token) = call.token.as_deref() {
                    self.session.invalidate(token);
                }
            }
            let text = response.text().await.unwrap_or_default();
            return Err(ClientError::Http { status: status.as_u16(), message: error_message(&text) });
        }

        let text = response.text().await.map_err(|e| ClientError::Network(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::warn!(status = status.as_u16(), error = %e, "response body did not match schema");
            ClientError::UnexpectedResponse
        })
    }
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{base_url}{path}")
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body).ok().and_then(|b| b.error)
}
