use dotenvy::dotenv;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::{Result, SaleWatchError};

pub const LISTING_BASE_URL: &str = "https://map.kaldi.co.jp/kaldi/articleList";

/// Store-name substrings worth watching (stores around Saitama).
pub const DEFAULT_KEYWORDS: &[&str] = &["浦和", "赤羽", "川口", "レイクタウン"];

pub const HEADLINE: &str = "☕️ KALDIの新着セール情報が届いたよ！\n\n";
pub const FOOTER_LABEL: &str = "🔗 一覧ページはこちら";
pub const STORE_MARKER: &str = "🛒";
pub const SEEN_DB_FILE: &str = "seen.db";

pub const LINE_TOKEN_VAR: &str = "LINE_TOKEN";
pub const LINE_USER_ID_VAR: &str = "LINE_USER_ID";

/// What to do when a keyword-matched row lacks a required field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedRowPolicy {
    /// Fail the whole run before anything is recorded as seen.
    #[default]
    Abort,
    /// Log and drop the row, keep the rest.
    Skip,
}

/// Listing page location and row filtering.
#[derive(Debug, Clone)]
pub struct ListingConfig {
    pub base_url: Url,
    pub account: String,
    /// Offset applied to UTC for the `kkw001` timestamp. Fixed, not the host zone.
    pub utc_offset_hours: i32,
    pub keywords: Vec<String>,
    pub store_marker: String,
    pub fetch_timeout: Duration,
    pub malformed_rows: MalformedRowPolicy,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(LISTING_BASE_URL).expect("listing base URL should parse"),
            account: "kaldi".to_string(),
            utc_offset_hours: 9,
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            store_marker: STORE_MARKER.to_string(),
            fetch_timeout: Duration::from_secs(15),
            malformed_rows: MalformedRowPolicy::Abort,
        }
    }
}

/// Combined-message framing and push transport settings.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    pub header: String,
    pub footer_label: String,
    pub endpoint: String,
    pub push_timeout: Duration,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            header: HEADLINE.to_string(),
            footer_label: FOOTER_LABEL.to_string(),
            endpoint: line::PUSH_ENDPOINT.to_string(),
            push_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Clone)]
pub struct LineCredentials {
    pub channel_access_token: String,
    pub user_id: String,
}

impl fmt::Debug for LineCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineCredentials")
            .field("channel_access_token", &"<redacted>")
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// Immutable run configuration, handed to each component at construction.
#[derive(Debug, Clone)]
pub struct Config {
    pub listing: ListingConfig,
    pub notify: NotifyConfig,
    pub line: LineCredentials,
    pub seen_db_path: PathBuf,
}

impl Config {
    /// Defaults plus the given credentials. Does not read the environment.
    pub fn new(channel_access_token: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            listing: ListingConfig::default(),
            notify: NotifyConfig::default(),
            line: LineCredentials {
                channel_access_token: channel_access_token.into(),
                user_id: user_id.into(),
            },
            seen_db_path: PathBuf::from(SEEN_DB_FILE),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self::new(required(LINE_TOKEN_VAR)?, required(LINE_USER_ID_VAR)?))
    }
}

fn required(var: &'static str) -> Result<String> {
    match env::var(var) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(SaleWatchError::Config { var }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_listing_site() {
        let config = Config::new("token", "U1");
        assert_eq!(config.listing.base_url.as_str(), LISTING_BASE_URL);
        assert_eq!(config.listing.account, "kaldi");
        assert_eq!(config.listing.utc_offset_hours, 9);
        assert_eq!(config.listing.fetch_timeout, Duration::from_secs(15));
        assert_eq!(config.notify.push_timeout, Duration::from_secs(10));
        assert_eq!(config.listing.malformed_rows, MalformedRowPolicy::Abort);
        assert_eq!(config.seen_db_path, PathBuf::from("seen.db"));
        assert!(config.listing.keywords.iter().any(|k| k == "浦和"));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = Config::new("super-secret", "U1");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("U1"));
    }

    #[test]
    fn test_missing_var_is_config_error() {
        let err = required("SALE_WATCH_TEST_DEFINITELY_UNSET_VAR").unwrap_err();
        assert!(matches!(
            err,
            SaleWatchError::Config {
                var: "SALE_WATCH_TEST_DEFINITELY_UNSET_VAR"
            }
        ));
    }
}
