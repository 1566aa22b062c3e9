// Infrastructure traits for the two network collaborators.
//
// Real adapters live in `deps`, mocks in `testing`.
// Naming convention: Base* for trait names (matches the rest of the codebase).

use async_trait::async_trait;
use url::Url;

use crate::error::Result;

// =============================================================================
// Page Fetcher Trait
// =============================================================================

#[async_trait]
pub trait BasePageFetcher: Send + Sync {
    /// GET `url` and return the body text.
    ///
    /// Transport failures, timeouts, and non-success statuses are all
    /// `SaleWatchError::Network`.
    async fn fetch(&self, url: &Url) -> Result<String>;
}

// =============================================================================
// Push Service Trait
// =============================================================================

#[async_trait]
pub trait BasePushService: Send + Sync {
    /// Deliver one text message to one recipient.
    async fn push_text(&self, to: &str, text: &str) -> Result<()>;
}
