//! Login against the catalog's fixed authentication endpoint.
//!
//! Token storage and refresh prompts belong to the shell; the core only
//! exchanges credentials for a bearer token and reads the persisted token
//! from [`LibraryConfig`](crate::LibraryConfig).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

/// Default timeout for the login request.
pub const DEFAULT_LOGIN_TIMEOUT_SECS: u64 = 30;

/// Catalog account credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account username.
    pub username: String,
    /// Account password.
    pub password: String,
}

impl Credentials {
    /// Create credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Build the login request body.
fn login_request_body(credentials: &Credentials) -> serde_json::Value {
    serde_json::json!({
        "user": {
            "username": credentials.username,
            "password": credentials.password,
        }
    })
}

/// Decode the login response body into a bearer token.
fn parse_login_response(raw: &str) -> Result<String> {
    #[derive(Deserialize)]
    struct LoginResponse {
        #[serde(default)]
        bearer: Option<String>,
    }

    if raw.trim().is_empty() {
        return Err(Error::NoResponse);
    }

    let response: LoginResponse = serde_json::from_str(raw)?;
    match response.bearer {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(Error::NoResponse),
    }
}

/// Exchange credentials for a bearer token at `endpoint`.
///
/// # Errors
///
/// Returns [`Error::RequestFailed`] on a non-success status or transport
/// failure, and [`Error::NoResponse`] if the response carries no token.
pub fn login(endpoint: &str, credentials: &Credentials, timeout: Duration) -> Result<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Configuration(format!("Failed to create HTTP client: {e}")))?;

    let response = client
        .post(endpoint)
        .json(&login_request_body(credentials))
        .send()
        .map_err(|e| Error::RequestFailed {
            status: None,
            reason: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::RequestFailed {
            status: Some(status.as_u16()),
            reason: status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string(),
        });
    }

    let raw = response.text().map_err(|e| Error::RequestFailed {
        status: None,
        reason: format!("Failed to read login response: {e}"),
    })?;

    let token = parse_login_response(&raw)?;
    info!("Logged in as {}", credentials.username);
    Ok(token)
}
