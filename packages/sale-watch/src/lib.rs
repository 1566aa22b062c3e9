//! Sale-listing watcher.
//!
//! Fetches the KALDI sale-listing page, keeps rows for the stores we care
//! about, drops (store, period) pairs already delivered on an earlier run,
//! and pushes whatever is left to LINE as a single message.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sale_watch::{Config, SaleWatch};
//!
//! let watch = SaleWatch::from_config(Config::from_env()?)?;
//! let summary = watch.run_once(chrono::Utc::now()).await?;
//! ```
//!
//! # Modules
//!
//! - [`url_builder`] - Listing URL with the +09:00 timestamp parameter
//! - [`extractor`] - Fetch, keyword filter, field extraction
//! - [`store`] - SQLite seen set
//! - [`notifier`] - Combined message and push
//! - [`pipeline`] - One end-to-end run
//! - [`testing`] - Mock collaborators and page fixtures

pub mod config;
pub mod deps;
pub mod error;
pub mod extractor;
pub mod listing;
pub mod notifier;
pub mod pipeline;
pub mod store;
pub mod testing;
pub mod traits;
pub mod url_builder;

pub use config::{Config, ListingConfig, MalformedRowPolicy, NotifyConfig};
pub use deps::{HttpPageFetcher, LinePushAdapter};
pub use error::{Result, SaleWatchError};
pub use extractor::{extract_listings, ArticleExtractor};
pub use listing::{Listing, ListingRecord};
pub use notifier::{compose_message, Notifier, PushOutcome};
pub use pipeline::{RunSummary, SaleWatch};
pub use store::{diff_since_last_run, RunDiff, SeenStore};
pub use traits::{BasePageFetcher, BasePushService};
pub use url_builder::build_url;
