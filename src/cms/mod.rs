//! CMS backend access
//!
//! The rest of the crate only talks to the backend through the
//! [`ContentFetcher`] trait. A handle is passed explicitly to whatever
//! needs content, so tests and preview sessions can swap the backend.

mod prismic;
mod query;

pub use prismic::PrismicClient;
pub use query::{encode_params, encode_value, Predicate, Query};

use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// A document as the backend sends it, before normalization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDocument {
    /// Backend document id
    pub id: Option<String>,

    /// Human-readable unique key within the document type
    pub uid: Option<String>,

    #[serde(rename = "type")]
    pub doc_type: Option<String>,

    pub first_publication_date: Option<String>,
    pub last_publication_date: Option<String>,

    /// Custom-type fields (title, author, banner, content...)
    pub data: serde_json::Value,
}

/// One page of search results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPage {
    pub page: u32,
    pub results_per_page: u32,
    pub total_results_size: u32,
    pub total_pages: u32,
    pub results: Vec<RawDocument>,

    /// URL of the next page of results, if any
    pub next_page: Option<String>,
}

/// Read access to the CMS backend
#[async_trait::async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Run a document search
    async fn query(&self, query: &Query) -> Result<RawPage, FetchError>;

    /// Follow an opaque next-page cursor returned by a previous page
    async fn fetch_page(&self, cursor: &str) -> Result<RawPage, FetchError>;

    /// Pin the ref of the currently published content
    ///
    /// Passing the result to every query of a run keeps the run on one
    /// content snapshot. `None` leaves each query to pick the ref itself.
    async fn resolve_ref(&self) -> Result<Option<String>, FetchError> {
        Ok(None)
    }

    /// Fetch a single document by its type and uid
    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        reference: Option<String>,
    ) -> Result<Option<RawDocument>, FetchError> {
        let query = Query::default()
            .predicate(Predicate::at(format!("my.{}.uid", doc_type), uid))
            .page_size(1)
            .with_ref(reference);
        Ok(self.query(&query).await?.results.into_iter().next())
    }

    /// Fetch a single document by its backend id
    async fn get_by_id(
        &self,
        id: &str,
        reference: Option<String>,
    ) -> Result<Option<RawDocument>, FetchError> {
        let query = Query::default()
            .predicate(Predicate::at("document.id", id))
            .page_size(1)
            .with_ref(reference);
        Ok(self.query(&query).await?.results.into_iter().next())
    }
}
