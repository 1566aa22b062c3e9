//! Listing-page scraping.
//!
//! Fetches the sale table, keeps rows whose store name matches a keyword,
//! and turns each kept row into a [`ListingRecord`]. Order follows the
//! document; nothing is re-sorted.

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{ListingConfig, MalformedRowPolicy};
use crate::error::{Result, SaleWatchError};
use crate::listing::{Listing, ListingRecord};
use crate::traits::BasePageFetcher;
use crate::url_builder::build_url;

const ROW_SELECTOR: &str = "table.cz_sp_table tr";

/// A field lookup that tries `primary`, then `fallback`.
struct FieldSelector {
    name: &'static str,
    primary: Selector,
    fallback: Option<Selector>,
}

impl FieldSelector {
    fn new(name: &'static str, primary: &str, fallback: Option<&str>) -> Result<Self> {
        Ok(Self {
            name,
            primary: parse_selector(primary)?,
            fallback: fallback.map(parse_selector).transpose()?,
        })
    }

    /// Trimmed text of the first match, or `None` if neither selector hits.
    fn lookup(&self, row: ElementRef<'_>) -> Option<String> {
        row.select(&self.primary)
            .next()
            .or_else(|| {
                self.fallback
                    .as_ref()
                    .and_then(|sel| row.select(sel).next())
            })
            .map(element_text)
    }

    /// Like `lookup`, but absent or blank text is a malformed row.
    fn required(&self, row: ElementRef<'_>, store: &str) -> Result<String> {
        let text = self.present(row, store)?;
        if text.is_empty() {
            return Err(self.malformed(store));
        }
        Ok(text)
    }

    /// The element must exist; its text may be empty.
    fn present(&self, row: ElementRef<'_>, store: &str) -> Result<String> {
        self.lookup(row).ok_or_else(|| self.malformed(store))
    }

    fn malformed(&self, store: &str) -> SaleWatchError {
        SaleWatchError::MalformedRow {
            store: store.to_string(),
            field: self.name,
        }
    }

    /// Like `lookup`, with the empty string standing in for "absent".
    fn optional(&self, row: ElementRef<'_>) -> String {
        self.lookup(row).unwrap_or_default()
    }
}

/// Compiled selectors for one sale row.
struct RowSelectors {
    row: Selector,
    store: FieldSelector,
    address: FieldSelector,
    title: FieldSelector,
    term: FieldSelector,
    detail: FieldSelector,
    notes: FieldSelector,
}

impl RowSelectors {
    fn compile() -> Result<Self> {
        Ok(Self {
            row: parse_selector(ROW_SELECTOR)?,
            store: FieldSelector::new("store", "span.salename", None)?,
            address: FieldSelector::new("address", "span.saleadress", None)?,
            title: FieldSelector::new("title", "span.saletitle", Some("span.saletitle_f"))?,
            term: FieldSelector::new("term", "p.saledate", Some("p.saledate_f"))?,
            detail: FieldSelector::new("detail", "p.saledetail", None)?,
            notes: FieldSelector::new("notes", "p.saledetail_notes", None)?,
        })
    }

    fn listing(&self, row: ElementRef<'_>, store: String) -> Result<Listing> {
        Ok(Listing {
            address: self.address.required(row, &store)?,
            title: self.title.required(row, &store)?,
            term: self.term.required(row, &store)?,
            detail: self.detail.present(row, &store)?,
            notes: self.notes.optional(row),
            store,
        })
    }
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| SaleWatchError::Parse {
        reason: format!("invalid selector {css:?}: {e:?}"),
    })
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Case-sensitive substring match against any keyword.
pub fn matches_keywords(store: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| store.contains(k.as_str()))
}

/// Parse a listing page and return the keyword-matched listings in
/// document order.
pub fn extract_listings(html: &str, config: &ListingConfig) -> Result<Vec<Listing>> {
    if !html.contains('<') {
        return Err(SaleWatchError::Parse {
            reason: "response body contains no markup".to_string(),
        });
    }

    let selectors = RowSelectors::compile()?;
    let document = Html::parse_document(html);

    let mut listings = Vec::new();
    let mut rows_seen = 0usize;

    for row in document.select(&selectors.row) {
        // Header and spacer rows carry no store name.
        let Some(store) = selectors.store.lookup(row) else {
            continue;
        };
        rows_seen += 1;

        if !matches_keywords(&store, &config.keywords) {
            continue;
        }

        match selectors.listing(row, store) {
            Ok(listing) => listings.push(listing),
            Err(e @ SaleWatchError::MalformedRow { .. })
                if config.malformed_rows == MalformedRowPolicy::Skip =>
            {
                warn!(error = %e, "Skipping malformed sale row");
            }
            Err(e) => return Err(e),
        }
    }

    debug!(rows = rows_seen, kept = listings.len(), "Listing page parsed");
    Ok(listings)
}

pub struct ArticleExtractor {
    fetcher: Arc<dyn BasePageFetcher>,
    config: ListingConfig,
}

impl ArticleExtractor {
    pub fn new(fetcher: Arc<dyn BasePageFetcher>, config: ListingConfig) -> Self {
        Self { fetcher, config }
    }

    /// Fetch the listing page as of `now` and return one record per kept row.
    ///
    /// Each call re-fetches. Any fetch, parse, or (under the default policy)
    /// malformed-row error fails the whole call.
    pub async fn fetch_target_articles(&self, now: DateTime<Utc>) -> Result<Vec<ListingRecord>> {
        let url = build_url(&self.config, now);
        let html = self.fetcher.fetch(&url).await?;
        let listings = extract_listings(&html, &self.config)?;

        info!(count = listings.len(), "Matched sale listings");

        Ok(listings
            .iter()
            .map(|listing| ListingRecord::new(listing, &self.config.store_marker, url.clone()))
            .collect())
    }
}
