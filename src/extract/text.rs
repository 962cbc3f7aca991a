//! Text cleaning helpers shared by extraction rules

/// Strips directional marks and collapses runs of whitespace
///
/// Storefront pages in RTL locales pepper values with U+200E/U+200F marks;
/// they are invisible but break downstream comparisons.
pub fn clean_text(text: &str) -> String {
    let without_marks: String = text
        .chars()
        .filter(|c| *c != '\u{200e}' && *c != '\u{200f}')
        .collect();
    without_marks.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Removes a repeated key prefix from a detail-table value
///
/// Bullet-list tables render "Key: value" inside the value span; when the
/// cleaned value starts with the cleaned key, the key and any separating
/// " :" characters are stripped.
pub fn strip_key_prefix(key: &str, value: &str) -> String {
    let key_cleaned = clean_text(key);
    let value_cleaned = clean_text(value);
    if let Some(rest) = value_cleaned.strip_prefix(&key_cleaned) {
        rest.trim_start_matches([' ', ':']).to_string()
    } else {
        value_cleaned
    }
}
