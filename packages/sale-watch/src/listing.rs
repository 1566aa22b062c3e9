use url::Url;

/// One sale row scraped from the listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub store: String,
    pub address: String,
    pub title: String,
    pub term: String,
    pub detail: String,
    /// Empty when the page has no notes element for the row.
    pub notes: String,
}

impl Listing {
    /// Dedup identity: same store and sale period means same listing,
    /// regardless of detail or notes.
    pub fn identity_key(&self) -> String {
        format!("{}_{}", self.store, self.term)
    }

    /// Per-store block of the pushed message.
    pub fn message_body(&self, marker: &str) -> String {
        let body = format!(
            "{marker} {}\n{}\n{}（{}）\n{}\n{}",
            self.store, self.address, self.title, self.term, self.detail, self.notes
        );
        body.trim_end().to_string()
    }
}

/// Extractor output, one per kept row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRecord {
    pub id: String,
    pub body: String,
    pub page_url: Url,
}

impl ListingRecord {
    pub fn new(listing: &Listing, marker: &str, page_url: Url) -> Self {
        Self {
            id: listing.identity_key(),
            body: listing.message_body(marker),
            page_url,
        }
    }
}
