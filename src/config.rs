//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::path::PathBuf;

use crate::error::ClientError;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const SESSION_FILE_NAME: &str = "session.json";
const FALLBACK_SESSION_FILE: &str = ".komunal-session.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL without a trailing slash.
    pub api_url: String,
    /// Location of the file-backed session store.
    pub session_file: PathBuf,
    pub connect_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            session_file: default_session_file(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `KOMUNAL_API_URL`: default `http://localhost:8080/api`
    /// - `KOMUNAL_SESSION_FILE`: default `<data dir>/komunal/session.json`
    /// - `KOMUNAL_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if the API URL is not http(s) or the
    /// timeout is not a number.
    pub fn from_env() -> Result<Self, ClientError> {
        let api_url = parse_api_url(std::env::var("KOMUNAL_API_URL").ok().as_deref())?;
        let session_file = std::env::var_os("KOMUNAL_SESSION_FILE").map_or_else(default_session_file, PathBuf::from);
        let connect_timeout_secs = match std::env::var("KOMUNAL_CONNECT_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ClientError::Config(format!("KOMUNAL_CONNECT_TIMEOUT_SECS is not a number: {raw}")))?,
            Err(_) => DEFAULT_CONNECT_TIMEOUT_SECS,
        };
        Ok(Self { api_url, session_file, connect_timeout_secs })
    }

    /// Override the API URL, applying the same checks as `from_env`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if `url` is not http(s).
    pub fn with_api_url(mut self, url: &str) -> Result<Self, ClientError> {
        self.api_url = parse_api_url(Some(url))?;
        Ok(self)
    }
}

pub(crate) fn parse_api_url(raw: Option<&str>) -> Result<String, ClientError> {
    let url = raw.map_or(DEFAULT_API_URL, str::trim).trim_end_matches('/');
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ClientError::Config(format!("api url must start with http:// or https://: {url}")));
    }
    Ok(url.to_owned())
}

fn default_session_file() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from(FALLBACK_SESSION_FILE),
        |dir| dir.join("komunal").join(SESSION_FILE_NAME),
    )
}
