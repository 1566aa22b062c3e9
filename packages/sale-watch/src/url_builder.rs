//! Listing-page URL with the current-time cache-buster.

use chrono::{DateTime, Duration, Utc};
use url::Url;

use crate::config::ListingConfig;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// `now` shifted by the configured fixed offset, formatted `YYYY-MM-DDTHH:MM:SS`.
pub fn listing_timestamp(config: &ListingConfig, now: DateTime<Utc>) -> String {
    let local = now + Duration::hours(i64::from(config.utc_offset_hours));
    local.format(TIMESTAMP_FORMAT).to_string()
}

pub fn build_url(config: &ListingConfig, now: DateTime<Utc>) -> Url {
    let mut url = config.base_url.clone();
    url.query_pairs_mut()
        .clear()
        .append_pair("account", &config.account)
        .append_pair("accmd", "1")
        .append_pair("ftop", "1")
        .append_pair("kkw001", &listing_timestamp(config, now));
    url
}
