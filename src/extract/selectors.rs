//! CSS-selector-driven extraction rule
//!
//! [`SelectorRule`] implements [`ExtractRule`] from a table of selector
//! strings, compiled once at construction. The catalog defaults reproduce the
//! storefront selectors the production system shipped with; tests and other
//! sites swap in their own [`SelectorConfig`].

use crate::extract::text::{clean_text, strip_key_prefix};
use crate::extract::{fields, ExtractRule, ListingPage, Record, Review};
use crate::{HarvestError, Result};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Shape of a detail table on an item page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// `<tr>` rows with a th/td key cell and a td value cell
    Rows,
    /// `<li>` entries with a bold key span and a plain value span
    BulletList,
}

/// Selector strings for one site
#[derive(Debug, Clone)]
pub struct SelectorConfig {
    /// Site label stamped into every record
    pub site: String,
    /// Category label stamped into every record
    pub category: String,

    pub item_link: String,
    pub next_page: String,

    pub title: String,
    /// Primary price selector, tried first
    pub price_primary: String,
    /// Fallback price selector
    pub price_fallback: String,
    pub price_before_discount: String,
    /// Tried in order; first element matching the discount pattern wins
    pub discount_candidates: Vec<String>,
    pub rating: String,
    pub image: String,
    pub description: String,

    /// Detail tables: (selector, shape), keys discovered per page
    pub detail_tables: Vec<(String, TableKind)>,

    pub review_card: String,
    pub reviewer_name: String,
    pub review_rating: String,
    pub review_date: String,
    pub review_body: String,
    /// Reviews kept per item
    pub max_reviews: usize,
}

impl SelectorConfig {
    /// The storefront defaults the production system shipped with
    pub fn catalog_defaults() -> Self {
        Self {
            site: "amazon_sa".to_string(),
            category: "mobile phones".to_string(),
            item_link: "a.a-link-normal.s-underline-text.s-underline-link-text.s-link-style.a-text-normal".to_string(),
            next_page: "a.s-pagination-next".to_string(),
            title: "#productTitle".to_string(),
            price_primary: "#corePriceDisplay_desktop_feature_div .a-price-whole".to_string(),
            price_fallback: "div.a-section.a-spacing-micro span.a-price.a-text-price.a-size-medium span.a-offscreen".to_string(),
            price_before_discount: "span.a-size-small.aok-offscreen".to_string(),
            discount_candidates: vec![
                "span.a-color-price".to_string(),
                ".savingsPercentage".to_string(),
            ],
            rating: "span.a-icon-alt".to_string(),
            image: "#imgTagWrapperId img".to_string(),
            description: "#feature-bullets".to_string(),
            detail_tables: vec![
                (".a-normal.a-spacing-micro".to_string(), TableKind::Rows),
                ("#productDetails_techSpec_section_1".to_string(), TableKind::Rows),
                ("#productDetails_detailBullets_sections1".to_string(), TableKind::Rows),
                (
                    "ul.a-unordered-list.a-nostyle.a-vertical.a-spacing-none.detail-bullet-list".to_string(),
                    TableKind::BulletList,
                ),
            ],
            review_card: "div[data-hook='review']".to_string(),
            reviewer_name: "span.a-profile-name".to_string(),
            review_rating: "i.a-icon-star span.a-icon-alt".to_string(),
            review_date: "span.review-date".to_string(),
            review_body: "span[data-hook='review-body']".to_string(),
            max_reviews: 5,
        }
    }
}

/// An [`ExtractRule`] compiled from a [`SelectorConfig`]
pub struct SelectorRule {
    site: String,
    category: String,

    item_link: Selector,
    next_page: Selector,

    title: Selector,
    price_primary: Selector,
    price_fallback: Selector,
    price_before_discount: Selector,
    discount_candidates: Vec<Selector>,
    discount_pattern: Regex,
    rating: Selector,
    image: Selector,
    description: Selector,

    detail_tables: Vec<(Selector, TableKind)>,
    table_row: Selector,
    table_key_cell: Selector,
    table_value_cell: Selector,
    bullet_item: Selector,
    bullet_key: Selector,
    bullet_span: Selector,

    review_card: Selector,
    reviewer_name: Selector,
    review_rating: Selector,
    review_date: Selector,
    review_body: Selector,
    max_reviews: usize,
}

/// Suffix the storefront appends to star ratings
const RATING_SUFFIX: &str = "out of 5 stars";

fn parse_selector(raw: &str) -> Result<Selector> {
    Selector::parse(raw).map_err(|e| HarvestError::Selector(format!("{raw}: {e}")))
}

impl SelectorRule {
    pub fn new(config: SelectorConfig) -> Result<Self> {
        let discount_candidates = config
            .discount_candidates
            .iter()
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<_>>>()?;
        let detail_tables = config
            .detail_tables
            .iter()
            .map(|(s, kind)| Ok((parse_selector(s)?, *kind)))
            .collect::<Result<Vec<_>>>()?;

        // The pattern is a literal; a failure here is a programming error, but
        // it is still propagated rather than unwrapped.
        let discount_pattern = Regex::new(r"(-?\d+%)")
            .map_err(|e| HarvestError::Selector(format!("discount pattern: {e}")))?;

        Ok(Self {
            site: config.site,
            category: config.category,
            item_link: parse_selector(&config.item_link)?,
            next_page: parse_selector(&config.next_page)?,
            title: parse_selector(&config.title)?,
            price_primary: parse_selector(&config.price_primary)?,
            price_fallback: parse_selector(&config.price_fallback)?,
            price_before_discount: parse_selector(&config.price_before_discount)?,
            discount_candidates,
            discount_pattern,
            rating: parse_selector(&config.rating)?,
            image: parse_selector(&config.image)?,
            description: parse_selector(&config.description)?,
            detail_tables,
            table_row: parse_selector("tr")?,
            table_key_cell: parse_selector("th, td")?,
            table_value_cell: parse_selector("td")?,
            bullet_item: parse_selector("li")?,
            bullet_key: parse_selector("span.a-text-bold")?,
            bullet_span: parse_selector("span")?,
            review_card: parse_selector(&config.review_card)?,
            reviewer_name: parse_selector(&config.reviewer_name)?,
            review_rating: parse_selector(&config.review_rating)?,
            review_date: parse_selector(&config.review_date)?,
            review_body: parse_selector(&config.review_body)?,
            max_reviews: config.max_reviews,
        })
    }

    /// Rule with the production storefront selectors
    pub fn catalog() -> Result<Self> {
        Self::new(SelectorConfig::catalog_defaults())
    }

    fn text_of(element: ElementRef<'_>) -> String {
        element.text().collect::<String>().trim().to_string()
    }

    fn select_text(&self, doc: &Html, selector: &Selector) -> Option<String> {
        doc.select(selector)
            .next()
            .map(Self::text_of)
            .filter(|t| !t.is_empty())
    }

    fn extract_price(&self, doc: &Html) -> Option<String> {
        self.select_text(doc, &self.price_primary)
            .or_else(|| self.select_text(doc, &self.price_fallback))
    }

    fn extract_discount(&self, doc: &Html) -> Option<String> {
        for selector in &self.discount_candidates {
            for element in doc.select(selector) {
                let text = Self::text_of(element);
                if let Some(m) = self.discount_pattern.find(&text) {
                    return Some(m.as_str().to_string());
                }
            }
        }
        None
    }

    fn extract_rating(&self, doc: &Html) -> Option<String> {
        let text = self.select_text(doc, &self.rating)?;
        if text.contains(RATING_SUFFIX) {
            Some(text.replace(RATING_SUFFIX, "").trim().to_string())
        } else {
            None
        }
    }

    /// Folds detail-table rows into the record's open field mapping
    fn extract_detail_tables(&self, doc: &Html, record: &mut Record) {
        for (selector, kind) in &self.detail_tables {
            let Some(table) = doc.select(selector).next() else {
                continue;
            };
            match kind {
                TableKind::Rows => {
                    for row in table.select(&self.table_row) {
                        let Some(key_cell) = row.select(&self.table_key_cell).next() else {
                            continue;
                        };
                        let Some(value_cell) = row.select(&self.table_value_cell).last() else {
                            continue;
                        };
                        let key = clean_text(&Self::text_of(key_cell));
                        let value = clean_text(&Self::text_of(value_cell));
                        if !key.is_empty() {
                            record.set(&key, value);
                        }
                    }
                }
                TableKind::BulletList => {
                    for item in table.select(&self.bullet_item) {
                        let Some(key_span) = item.select(&self.bullet_key).next() else {
                            continue;
                        };
                        let Some(value_span) = item.select(&self.bullet_span).find(|span| {
                            span.value()
                                .attr("class")
                                .map_or(true, |c| !c.contains("a-text-bold"))
                        }) else {
                            continue;
                        };
                        let key = clean_text(&Self::text_of(key_span).replace(':', ""));
                        let value = strip_key_prefix(&key, &Self::text_of(value_span));
                        if !key.is_empty() {
                            record.set(&key, value);
                        }
                    }
                }
            }
        }
    }

    fn extract_reviews(&self, doc: &Html) -> Vec<Review> {
        doc.select(&self.review_card)
            .take(self.max_reviews)
            .map(|card| {
                let field = |selector: &Selector| {
                    card.select(selector)
                        .next()
                        .map(Self::text_of)
                        .unwrap_or_default()
                };
                Review {
                    reviewer: field(&self.reviewer_name),
                    rating: field(&self.review_rating)
                        .replace(RATING_SUFFIX, "")
                        .trim()
                        .to_string(),
                    date: field(&self.review_date),
                    text: field(&self.review_body),
                }
            })
            .collect()
    }
}

impl ExtractRule for SelectorRule {
    fn listing(&self, html: &str, base: &Url) -> ListingPage {
        let doc = Html::parse_document(html);

        let item_links = doc
            .select(&self.item_link)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| base.join(href).ok())
            .map(String::from)
            .collect();

        let next_page_url = doc
            .select(&self.next_page)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| base.join(href).ok())
            .map(String::from);

        ListingPage {
            item_links,
            next_page_url,
        }
    }

    fn item(&self, html: &str, url: &str) -> Record {
        let doc = Html::parse_document(html);
        let mut record = Record::new(url, &self.site, &self.category);

        if let Some(title) = self.select_text(&doc, &self.title) {
            record.set(fields::TITLE, title);
        }
        if let Some(rating) = self.extract_rating(&doc) {
            record.set(fields::RATING, rating);
        }
        if let Some(price) = self.extract_price(&doc) {
            record.set(fields::PRICE, price);
        }
        if let Some(before) = self.select_text(&doc, &self.price_before_discount) {
            record.set(fields::PRICE_BEFORE_DISCOUNT, before);
        }
        if let Some(discount) = self.extract_discount(&doc) {
            record.set(fields::DISCOUNT, discount);
        }
        if let Some(image) = doc
            .select(&self.image)
            .next()
            .and_then(|img| img.value().attr("src"))
        {
            record.set(fields::IMAGE_URL, image);
        }
        if let Some(description) = self.select_text(&doc, &self.description) {
            record.set(fields::DESCRIPTION, description);
        }

        self.extract_detail_tables(&doc, &mut record);
        record.reviews = self.extract_reviews(&doc);

        record
    }
}
