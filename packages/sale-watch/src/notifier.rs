use std::sync::Arc;
use tracing::info;
use url::Url;

use crate::config::NotifyConfig;
use crate::error::Result;
use crate::traits::BasePushService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Nothing new this run; no request was made.
    NothingNew,
    Delivered { count: usize },
}

/// Header, per-store blocks separated by a blank line, then the link footer.
pub fn compose_message(config: &NotifyConfig, msgs: &[String], page_url: Option<&Url>) -> String {
    let mut text = config.header.clone();
    text.push_str(&msgs.join("\n\n"));
    text.push_str("\n\n");
    text.push_str(&config.footer_label);
    if let Some(url) = page_url {
        text.push('\n');
        text.push_str(url.as_str());
    }
    text
}

pub struct Notifier {
    push: Arc<dyn BasePushService>,
    recipient: String,
    config: NotifyConfig,
}

impl Notifier {
    pub fn new(
        push: Arc<dyn BasePushService>,
        recipient: impl Into<String>,
        config: NotifyConfig,
    ) -> Self {
        Self {
            push,
            recipient: recipient.into(),
            config,
        }
    }

    /// Send every new listing as one combined message.
    ///
    /// An empty `msgs` is a no-op, not an error.
    pub async fn push_line(&self, msgs: &[String], page_url: Option<&Url>) -> Result<PushOutcome> {
        if msgs.is_empty() {
            info!("No new sale info.");
            return Ok(PushOutcome::NothingNew);
        }

        let text = compose_message(&self.config, msgs, page_url);
        self.push.push_text(&self.recipient, &text).await?;

        info!("Pushed {} sale(s) to LINE.", msgs.len());
        Ok(PushOutcome::Delivered { count: msgs.len() })
    }
}
