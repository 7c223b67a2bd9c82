//! Remote catalog client: query construction, transport, and response
//! envelope decoding.
//!
//! The catalog speaks a query language over a single HTTP endpoint: the
//! client posts `{"query": <document>}` and receives either
//! `{"data": {...}}` or `{"errors": [{"message": ...}, ...]}`. One request
//! is issued per sync step; the raw body is returned in memory and decoded
//! by the caller, which knows the expected payload shape from the query it
//! issued.

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Error, Result};

/// Default timeout for catalog requests.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// One of the four catalog queries issued during a sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogQuery {
    /// Components the authenticated user has favorited.
    FavoriteComponents,
    /// Modifications of one component.
    ComponentModifications {
        /// Identifier of the parent component.
        component_uuid: String,
    },
    /// Filesets of one modification, filtered server-side by target program.
    Filesets {
        /// Identifier of the parent modification.
        modification_uuid: String,
        /// Identifier of the target program to filter by.
        program_id: u32,
    },
    /// Files of one fileset.
    FilesetFiles {
        /// Identifier of the parent fileset.
        fileset_uuid: String,
    },
}

impl CatalogQuery {
    /// Render the query document sent to the catalog.
    ///
    /// String arguments are JSON-quoted so identifiers containing quotes
    /// cannot break out of the document.
    #[must_use]
    pub fn document(&self) -> String {
        match self {
            Self::FavoriteComponents => concat!(
                "{ favoriteComponents { uuid name ",
                "ownerUser { uuid username } imageFile { downloadUrl } } }"
            )
            .to_string(),
            Self::ComponentModifications { component_uuid } => format!(
                "{{ componentModifications(componentUuid: {}) {{ uuid modificationName }} }}",
                quote(component_uuid)
            ),
            Self::Filesets {
                modification_uuid,
                program_id,
            } => format!(
                "{{ filesets(modificationUuid: {}, programId: {program_id}) \
                 {{ uuid program {{ id name }} }} }}",
                quote(modification_uuid)
            ),
            Self::FilesetFiles { fileset_uuid } => format!(
                "{{ filesetFiles(filesetUuid: {}) {{ uuid filename downloadUrl }} }}",
                quote(fileset_uuid)
            ),
        }
    }

    /// Name of the `data` field carrying this query's payload.
    #[must_use]
    pub const fn data_field(&self) -> &'static str {
        match self {
            Self::FavoriteComponents => "favoriteComponents",
            Self::ComponentModifications { .. } => "componentModifications",
            Self::Filesets { .. } => "filesets",
            Self::FilesetFiles { .. } => "filesetFiles",
        }
    }
}

/// JSON-quote a string argument for embedding in a query document.
fn quote(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

/// Transport seam for catalog requests.
///
/// `execute` sends exactly one request and returns the raw response body.
/// Implementations must not retry; the orchestrator treats every call as
/// one user-visible sync step.
pub trait CatalogClient {
    /// Send `query` to the catalog and return the raw response body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RequestFailed`] on a non-success status or a
    /// transport failure.
    fn execute(&self, query: &CatalogQuery) -> Result<String>;
}

/// HTTP implementation of [`CatalogClient`].
pub struct HttpCatalogClient {
    endpoint: String,
    bearer_token: String,
    client: reqwest::blocking::Client,
}

impl HttpCatalogClient {
    /// Create a client against `endpoint` authenticating with `bearer_token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, bearer_token: impl Into<String>) -> Result<Self> {
        Self::with_timeout(
            endpoint,
            bearer_token,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Create a client with an explicit per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn with_timeout(
        endpoint: impl Into<String>,
        bearer_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            endpoint: endpoint.into(),
            bearer_token: bearer_token.into(),
            client,
        })
    }
}

impl CatalogClient for HttpCatalogClient {
    fn execute(&self, query: &CatalogQuery) -> Result<String> {
        let document = query.document();
        debug!("Executing catalog query: {}", query.data_field());

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.bearer_token)
            .json(&serde_json::json!({ "query": document }))
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

        response.text().map_err(|e| Error::RequestFailed {
            status: None,
            reason: format!("Failed to read response body: {e}"),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ResponseEnvelope {
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    errors: Option<Vec<RemoteMessage>>,
}

#[derive(Debug, Deserialize)]
struct RemoteMessage {
    message: String,
}

/// Decode a raw catalog response body into its `data` payload.
///
/// The `errors` list is checked before `data`: the catalog can set both,
/// and the presence of `errors` is treated as failure regardless.
///
/// # Errors
///
/// Returns [`Error::Remote`] when the response carries an errors list,
/// [`Error::NoResponse`] when the body is blank or carries no data, and a
/// serialization error when the body is not valid JSON.
pub fn parse_response(raw: &str) -> Result<serde_json::Value> {
    if raw.trim().is_empty() {
        return Err(Error::NoResponse);
    }

    let envelope: ResponseEnvelope = serde_json::from_str(raw)?;

    if let Some(errors) = envelope.errors {
        return Err(Error::Remote {
            messages: errors.into_iter().map(|e| e.message).collect(),
        });
    }

    envelope.data.ok_or(Error::NoResponse)
}

/// Extract and decode the typed list stored under `field` in a `data`
/// payload.
///
/// The payload carries no shape tag; the caller knows what to expect from
/// the query it issued.
///
/// # Errors
///
/// Returns [`Error::NoResponse`] if `field` is absent, or a serialization
/// error if the list does not match `T`.
pub fn decode_list<T: DeserializeOwned>(
    data: serde_json::Value,
    field: &str,
) -> Result<Vec<T>> {
    let mut data = data;
    let payload = match data.get_mut(field) {
        Some(value) => value.take(),
        None => return Err(Error::NoResponse),
    };
    Ok(serde_json::from_value(payload)?)
}
