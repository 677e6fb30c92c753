//! Incremental listing pagination
//!
//! The listing starts from the page rendered at build time and grows as
//! further pages are fetched through their opaque cursors. Merging only
//! ever appends: summaries keep backend order and are never de-duplicated,
//! since the backend guarantees pages do not overlap.

use serde::{Deserialize, Serialize};

use crate::cms::{ContentFetcher, RawPage};
use crate::content::{normalize_summary, Page, PostSummary};
use crate::error::Result;

/// Posts loaded so far and where to continue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationState {
    pub loaded_posts: Vec<PostSummary>,
    pub next_cursor: Option<String>,
}

impl PaginationState {
    /// Whether another page can be requested
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

/// Which pages the listing holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Only the build-time page
    Initial,
    /// One or more fetched pages merged in
    Extended,
}

/// Result of a "load more" request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMore {
    /// This many summaries were appended
    Appended(usize),
    /// There was no cursor; nothing was fetched
    Exhausted,
}

/// Owns the listing state and merges new pages into it
#[derive(Debug, Clone)]
pub struct PaginationController {
    state: PaginationState,
    phase: Phase,
}

impl PaginationController {
    /// Start from the build-time page
    pub fn initialize(page: Page) -> Self {
        Self {
            state: PaginationState {
                loaded_posts: page.results,
                next_cursor: page.next_cursor,
            },
            phase: Phase::Initial,
        }
    }

    /// Resume from a previously captured state
    pub fn resume(state: PaginationState, phase: Phase) -> Self {
        Self { state, phase }
    }

    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    pub fn into_state(self) -> PaginationState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Fetch the next page and append it
    ///
    /// Without a cursor nothing is fetched and [`LoadMore::Exhausted`] is
    /// returned. If the fetch or the normalization of any result fails,
    /// the state is left exactly as it was and the error is returned.
    pub async fn load_more<F>(&mut self, fetcher: &F) -> Result<LoadMore>
    where
        F: ContentFetcher + ?Sized,
    {
        let Some(cursor) = self.state.next_cursor.as_deref() else {
            tracing::debug!("No further pages to load");
            return Ok(LoadMore::Exhausted);
        };

        tracing::debug!("Loading next page: {}", cursor);
        let raw = fetcher.fetch_page(cursor).await?;
        let page = normalize_page(&raw)?;

        let appended = page.results.len();
        self.state.loaded_posts.extend(page.results);
        self.state.next_cursor = page.next_cursor;
        self.phase = Phase::Extended;

        tracing::debug!(
            "Appended {} posts ({} loaded, more: {})",
            appended,
            self.state.loaded_posts.len(),
            self.state.has_more()
        );
        Ok(LoadMore::Appended(appended))
    }
}

/// Normalize every result of a raw page, failing on the first bad document
pub fn normalize_page(raw: &RawPage) -> Result<Page> {
    let results = raw
        .results
        .iter()
        .map(normalize_summary)
        .collect::<Result<Vec<_>>>()?;
    Ok(Page {
        results,
        next_cursor: raw.next_page.clone(),
    })
}
