//! Region resolution
//!
//! A region name selects the storefront base URL that relative item and
//! pagination links are resolved against. The table is process-wide and
//! read-only; an unknown region is a fatal input error, never retried.

use crate::{HarvestError, Result};
use url::Url;

/// Supported regions and their storefront base URLs
const REGIONS: &[(&str, &str)] = &[
    ("egypt", "https://www.amazon.eg"),
    ("saudi", "https://www.amazon.sa"),
];

/// Resolves a region name to its base URL
///
/// # Errors
///
/// Returns [`HarvestError::UnsupportedRegion`] for a region not in the table.
pub fn base_url(region: &str) -> Result<Url> {
    let raw = REGIONS
        .iter()
        .find(|(name, _)| *name == region)
        .map(|(_, url)| *url)
        .ok_or_else(|| HarvestError::UnsupportedRegion(region.to_string()))?;

    Ok(Url::parse(raw)?)
}

/// Returns the list of supported region names
pub fn supported() -> Vec<&'static str> {
    REGIONS.iter().map(|(name, _)| *name).collect()
}
