//! Extraction rules and record types
//!
//! Extraction rules are the site-specific collaborators of the pipeline: they
//! turn listing-page HTML into item links plus a next-page link, and item-page
//! HTML into a [`Record`]. Rules never fail — a field the page does not carry
//! is simply an absent key.

mod selectors;
pub mod text;

pub use selectors::{SelectorConfig, SelectorRule, TableKind};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// Base field names present in every record (values may still be absent when
/// the page omits them). Detail-table keys are discovered per page on top of
/// these.
pub mod fields {
    pub const SCRAPE_DATE: &str = "date";
    pub const SOURCE_URL: &str = "source_url";
    pub const SITE: &str = "site";
    pub const CATEGORY: &str = "category";
    pub const TITLE: &str = "title";
    pub const RATING: &str = "rating";
    pub const PRICE: &str = "price";
    pub const PRICE_BEFORE_DISCOUNT: &str = "price_before_discount";
    pub const DISCOUNT: &str = "discount";
    pub const IMAGE_URL: &str = "image_url";
    pub const DESCRIPTION: &str = "description";

    /// Base column order for tabular export
    pub const BASE_ORDER: &[&str] = &[
        SCRAPE_DATE,
        SOURCE_URL,
        SITE,
        CATEGORY,
        TITLE,
        RATING,
        PRICE,
        PRICE_BEFORE_DISCOUNT,
        DISCOUNT,
        IMAGE_URL,
        DESCRIPTION,
    ];
}

/// One customer review attached to a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub reviewer: String,
    pub rating: String,
    pub date: String,
    pub text: String,
}

/// An extracted item record: an open field mapping plus nested reviews
///
/// The key set varies per record because detail tables differ between items;
/// downstream consumers must compute the column union lazily.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub fields: BTreeMap<String, String>,
    pub reviews: Vec<Review>,
}

impl Record {
    /// Creates a record seeded with the provenance fields every record carries
    pub fn new(source_url: &str, site: &str, category: &str) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(
            fields::SCRAPE_DATE.to_string(),
            chrono::Utc::now().format("%Y-%m-%d").to_string(),
        );
        fields.insert(fields::SOURCE_URL.to_string(), source_url.to_string());
        fields.insert(fields::SITE.to_string(), site.to_string());
        fields.insert(fields::CATEGORY.to_string(), category.to_string());
        Self {
            fields,
            reviews: Vec::new(),
        }
    }

    /// Inserts a field, dropping empty values so absence stays absence
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() {
            self.fields.insert(key.to_string(), value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

/// Links pulled from one listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Item links in document order, resolved to absolute URLs
    pub item_links: Vec<String>,
    /// Absolute URL of the next listing page, if any
    pub next_page_url: Option<String>,
}

/// A site-specific extraction rule
///
/// Implementations must tolerate missing optional fields: any field the DOM
/// omits is left out of the record rather than aborting the extraction.
pub trait ExtractRule: Send + Sync {
    /// Extracts item links and the next-page link from listing-page HTML
    fn listing(&self, html: &str, base: &Url) -> ListingPage;

    /// Extracts a record from item-page HTML
    fn item(&self, html: &str, url: &str) -> Record;
}
