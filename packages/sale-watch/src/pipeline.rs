//! One watcher run: extract, diff against the seen set, push.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::deps::{HttpPageFetcher, LinePushAdapter};
use crate::error::Result;
use crate::extractor::ArticleExtractor;
use crate::notifier::{Notifier, PushOutcome};
use crate::store;
use crate::traits::{BasePageFetcher, BasePushService};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Keyword-matched rows on the page
    pub extracted: usize,
    /// Rows not delivered on any earlier run
    pub new: usize,
    pub outcome: PushOutcome,
}

pub struct SaleWatch {
    config: Config,
    extractor: ArticleExtractor,
    notifier: Notifier,
}

impl SaleWatch {
    pub fn new(
        config: Config,
        fetcher: Arc<dyn BasePageFetcher>,
        push: Arc<dyn BasePushService>,
    ) -> Self {
        let extractor = ArticleExtractor::new(fetcher, config.listing.clone());
        let notifier = Notifier::new(push, config.line.user_id.clone(), config.notify.clone());
        Self {
            config,
            extractor,
            notifier,
        }
    }

    /// Production wiring: reqwest fetcher and LINE push client.
    pub fn from_config(config: Config) -> Result<Self> {
        let fetcher = HttpPageFetcher::new(config.listing.fetch_timeout)?;
        let push = LinePushAdapter::from_config(&config.line, &config.notify)?;
        Ok(Self::new(config, Arc::new(fetcher), Arc::new(push)))
    }

    /// Run the pipeline once as of `now`.
    ///
    /// Fails fast: a fetch or parse error leaves the seen set untouched; a
    /// delivery error happens after the seen set is committed.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<RunSummary> {
        let records = self.extractor.fetch_target_articles(now).await?;
        let diff = store::diff_since_last_run(&self.config.seen_db_path, &records).await?;
        let outcome = self
            .notifier
            .push_line(&diff.new_messages, diff.page_url.as_ref())
            .await?;

        let summary = RunSummary {
            extracted: records.len(),
            new: diff.new_messages.len(),
            outcome,
        };
        info!(
            extracted = summary.extracted,
            new = summary.new,
            "Run complete"
        );
        Ok(summary)
    }
}
