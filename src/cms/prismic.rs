//! REST client for a Prismic repository
//!
//! Wraps the document API (`/api/v2`): ref discovery, document search and
//! next-page cursors, using [`reqwest`].

use serde::Deserialize;

use super::query::{encode_params, encode_value, Query};
use super::{ContentFetcher, RawPage};
use crate::error::FetchError;

/// HTTP client for a single Prismic repository
pub struct PrismicClient {
    client: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
}

/// API root response: the refs content can be resolved against
#[derive(Debug, Deserialize)]
struct ApiInfo {
    #[serde(default)]
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

impl PrismicClient {
    /// Create a client for a repository API endpoint
    ///
    /// * `endpoint` - API root, e.g. `https://my-repo.cdn.prismic.io/api/v2`.
    pub fn new(endpoint: impl Into<String>, access_token: Option<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint, access_token)
    }

    /// Create a client reusing an existing [`reqwest::Client`]
    pub fn with_client(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        access_token: Option<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            access_token: access_token.filter(|t| !t.is_empty()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Resolve the ref of the currently published content
    pub async fn master_ref(&self) -> Result<String, FetchError> {
        let url = self.with_token(self.endpoint.clone());
        let info: ApiInfo = self.get_json(&url).await?;
        info.refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference)
            .ok_or_else(|| FetchError::NoMasterRef(self.endpoint.clone()))
    }

    /// URL of a document search
    fn search_url(&self, query: &Query, reference: &str) -> String {
        let params = query.to_params(reference);
        let query_string = encode_params(params.iter().map(|(k, v)| (*k, v.as_str())));
        self.with_token(format!("{}/documents/search?{}", self.endpoint, query_string))
    }

    /// Append the access token unless the URL already carries one
    fn with_token(&self, url: String) -> String {
        match &self.access_token {
            Some(token) if !url.contains("access_token=") => {
                let sep = if url.contains('?') { '&' } else { '?' };
                format!("{}{}access_token={}", url, sep, encode_value(token))
            }
            _ => url,
        }
    }

    /// The origin (scheme and host) of the endpoint
    fn origin(&self) -> &str {
        let after_scheme = self.endpoint.find("://").map(|i| i + 3).unwrap_or(0);
        match self.endpoint[after_scheme..].find('/') {
            Some(i) => &self.endpoint[..after_scheme + i],
            None => &self.endpoint,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[async_trait::async_trait]
impl ContentFetcher for PrismicClient {
    async fn resolve_ref(&self) -> Result<Option<String>, FetchError> {
        self.master_ref().await.map(Some)
    }

    async fn query(&self, query: &Query) -> Result<RawPage, FetchError> {
        let reference = match &query.reference {
            Some(r) => r.clone(),
            None => self.master_ref().await?,
        };
        let url = self.search_url(query, &reference);
        self.get_json(&url).await
    }

    async fn fetch_page(&self, cursor: &str) -> Result<RawPage, FetchError> {
        // Cursors come back from clients; only follow ones on our own host
        let origin = self.origin();
        let same_origin = cursor
            .strip_prefix(origin)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));
        if !same_origin {
            return Err(FetchError::InvalidCursor(cursor.to_string()));
        }

        let url = self.with_token(cursor.to_string());
        self.get_json(&url).await
    }
}
