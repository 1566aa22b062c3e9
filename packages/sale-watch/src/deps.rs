use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use line::{LineOptions, LineService};

use crate::config::{LineCredentials, NotifyConfig};
use crate::error::{Result, SaleWatchError};
use crate::traits::{BasePageFetcher, BasePushService};

// =============================================================================
// HTTP Page Fetcher (reqwest)
// =============================================================================

pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| SaleWatchError::Network(Box::new(e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl BasePageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &Url) -> Result<String> {
        debug!(url = %url, "HTTP fetch starting");
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "HTTP request failed");
            SaleWatchError::Network(Box::new(e))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SaleWatchError::Network(
                format!("HTTP {} for {}", status, url).into(),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| SaleWatchError::Network(Box::new(e)))
    }
}

// =============================================================================
// LineService Adapter (implements BasePushService trait)
// =============================================================================

/// Wrapper around LineService that implements BasePushService trait
pub struct LinePushAdapter(pub Arc<LineService>);

impl LinePushAdapter {
    pub fn new(service: Arc<LineService>) -> Self {
        Self(service)
    }

    pub fn from_config(credentials: &LineCredentials, notify: &NotifyConfig) -> Result<Self> {
        let options = LineOptions::new(credentials.channel_access_token.clone())
            .with_endpoint(notify.endpoint.clone())
            .with_timeout(notify.push_timeout);
        let service = LineService::new(options)?;
        Ok(Self::new(Arc::new(service)))
    }
}

#[async_trait]
impl BasePushService for LinePushAdapter {
    async fn push_text(&self, to: &str, text: &str) -> Result<()> {
        self.0.push_text(to, text).await.map_err(Into::into)
    }
}
