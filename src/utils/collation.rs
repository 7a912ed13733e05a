//! Locale-aware ordering of catalog titles.
//!
//! Titles are German. The primary key ignores case and diacritics so that
//! "Ölfarbe" sorts with "Oberputz" rather than after "Zaun", and `ß` compares
//! like "ss". Ties fall back to the raw title so the order is total.

use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Primary collation key: decomposed, marks stripped, lowercased.
pub fn collation_key(title: &str) -> String {
    let mut key = String::with_capacity(title.len());
    for c in title.trim().nfd().filter(|c| !is_combining_mark(*c)) {
        match c {
            'ß' | 'ẞ' => key.push_str("ss"),
            c => key.extend(c.to_lowercase()),
        }
    }
    key
}

/// Compare two titles the way the catalog lists them.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}
