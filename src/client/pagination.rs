//! Pagination helpers for Azure Resource Manager list operations
//!
//! ARM list endpoints return `{ "value": [...], "nextLink": "..." }`. A listing is
//! modelled as a cursor: `has_more()` reports whether another page can be fetched
//! and `next_page()` fetches it. A cursor is finite and cannot be restarted.

use std::marker::PhantomData;

use async_trait::async_trait;
use log::trace;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::arm::ArmClient;
use crate::error::Result;

/// A single page of an ARM list response.
#[derive(Debug, Clone, Deserialize)]
pub struct ArmPage<T> {
    /// The items on this page
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,

    /// Absolute URL of the next page, absent (or empty) on the last page
    #[serde(rename = "nextLink", default)]
    pub next_link: Option<String>,
}

impl<T> ArmPage<T> {
    /// The next page URL, treating an empty string as "no more pages".
    pub fn next(&self) -> Option<&str> {
        self.next_link.as_deref().filter(|link| !link.is_empty())
    }
}

/// Cursor over the pages of one listing.
#[async_trait]
pub trait PageCursor<T: Send>: Send {
    /// Whether another page can be fetched.
    fn has_more(&self) -> bool;

    /// Fetch the next page. Calling this after `has_more()` returned false yields an empty page.
    async fn next_page(&mut self) -> Result<Vec<T>>;
}

/// Boxed cursor handed out by API clients.
pub type Pager<T> = Box<dyn PageCursor<T>>;

/// Drain a cursor, failing on the first page error.
///
/// Partial results are dropped on error: a listing is either complete or unknown.
pub async fn collect_all<T: Send>(mut pager: Pager<T>) -> Result<Vec<T>> {
    let mut items = Vec::new();
    while pager.has_more() {
        items.extend(pager.next_page().await?);
    }
    Ok(items)
}

/// Cursor that follows ARM `nextLink` URLs.
pub struct ArmPager<T> {
    client: ArmClient,
    next: Option<String>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ArmPager<T> {
    /// Start a listing at the given absolute URL.
    pub fn new(client: ArmClient, first_url: String) -> Self {
        Self {
            client,
            next: Some(first_url),
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T> PageCursor<T> for ArmPager<T>
where
    T: DeserializeOwned + Send + 'static,
{
    fn has_more(&self) -> bool {
        self.next.is_some()
    }

    async fn next_page(&mut self) -> Result<Vec<T>> {
        let Some(url) = self.next.take() else {
            return Ok(Vec::new());
        };

        trace!("fetching page {}", url);
        let page: ArmPage<T> = self.client.get_json(&url).await?;
        self.next = page.next().map(str::to_string);

        Ok(page.value)
    }
}

/// Cursor over pre-built pages, used by test doubles.
#[cfg(test)]
pub struct StaticPager<T> {
    pages: std::collections::VecDeque<Result<Vec<T>>>,
}

#[cfg(test)]
impl<T> StaticPager<T> {
    /// Pages are yielded in order; an `Err` page fails the listing at that point.
    pub fn new(pages: Vec<Result<Vec<T>>>) -> Self {
        Self {
            pages: pages.into(),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl<T: Send> PageCursor<T> for StaticPager<T> {
    fn has_more(&self) -> bool {
        !self.pages.is_empty()
    }

    async fn next_page(&mut self) -> Result<Vec<T>> {
        self.pages.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}
