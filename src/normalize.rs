//! Text normalizers producing comparable keys from noisy export fields.
//!
//! Every function here is total: empty or malformed input yields an empty
//! (or best-effort) string, never an error. All of them are idempotent, so
//! a value that has already been normalized passes through unchanged.

use crate::regex::Regex;
use itertools::Itertools;
use std::sync::LazyLock;

static TITLE_STRIP_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9 ]+").unwrap());

static YEAR_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b([0-9]{4})\b").unwrap());

/// Normalizes an article title into a deduplication key.
///
/// Lower-cases the text, replaces every run of characters outside
/// `[a-z0-9 ]` with a single space, collapses whitespace and trims.
///
/// # Examples
///
/// ```
/// use bibmerge::normalize::normalize_title;
///
/// assert_eq!(normalize_title("Deep Learning for X!"), "deep learning for x");
/// assert_eq!(normalize_title("  DEEP-learning   for x "), "deep learning for x");
/// ```
pub fn normalize_title(text: &str) -> String {
    let lowered = text.to_lowercase();
    TITLE_STRIP_REGEX
        .replace_all(&lowered, " ")
        .split_whitespace()
        .join(" ")
}

/// Folds a single author name into a `"<lastname> <initials>"` key.
///
/// Handles both `"Smith, John A."` and `"Smith JA"` layouts. Initials are the
/// upper-case letters of the given-name part; when the given-name part has no
/// upper-case letters (an already folded key such as `"smith ja"`) its
/// letters are kept as they are. Punctuation and inner spaces of the last
/// name are dropped.
///
/// # Examples
///
/// ```
/// use bibmerge::normalize::normalize_author_name;
///
/// assert_eq!(normalize_author_name("Smith, J."), "smith j");
/// assert_eq!(normalize_author_name("Smith J"), "smith j");
/// assert_eq!(normalize_author_name("Smith, John Adam"), "smith ja");
/// ```
pub fn normalize_author_name(name: &str) -> String {
    let name = name.trim();
    let (last, rest) = match name.split_once(',') {
        Some((last, rest)) => (last, rest),
        None => match name.split_once(char::is_whitespace) {
            Some((last, rest)) => (last, rest),
            None => (name, ""),
        },
    };

    let last = fold_alphanumeric(last);
    let initials = extract_initials(rest);

    match (last.is_empty(), initials.is_empty()) {
        (_, true) => last,
        (true, false) => initials,
        (false, false) => format!("{last} {initials}"),
    }
}

/// Normalizes a semicolon-separated author list, folding every name with
/// [`normalize_author_name`] and joining the keys with `"; "`.
///
/// ```
/// use bibmerge::normalize::normalize_authors;
///
/// assert_eq!(normalize_authors("Smith, J.; Doe, Anna"), "smith j; doe a");
/// ```
pub fn normalize_authors(list: &str) -> String {
    list.split(';')
        .map(normalize_author_name)
        .filter(|key| !key.is_empty())
        .join("; ")
}

/// Normalizes a journal name: upper-cases, drops periods, collapses
/// whitespace and trims.
///
/// ```
/// use bibmerge::normalize::normalize_journal_name;
///
/// assert_eq!(normalize_journal_name("J. Appl.  Phys."), "J APPL PHYS");
/// ```
pub fn normalize_journal_name(text: &str) -> String {
    text.to_uppercase()
        .replace('.', "")
        .split_whitespace()
        .join(" ")
}

/// Extracts the publication year as a 4-digit string.
///
/// Spreadsheet exports often carry the year as `2019.0`; the first
/// standalone 4-digit run wins. Returns an empty string when there is none.
pub fn normalize_year(text: &str) -> String {
    YEAR_REGEX
        .captures(text)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default()
}

/// Title-cases a token the way spreadsheet tools do: the first letter after
/// any non-letter is upper-cased, every other letter lower-cased.
pub(crate) fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.trim().chars() {
        if c.is_alphabetic() {
            if at_word_start {
                result.extend(c.to_uppercase());
            } else {
                result.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            result.push(c);
            at_word_start = true;
        }
    }
    result
}

fn fold_alphanumeric(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

fn extract_initials(rest: &str) -> String {
    let initials: String = rest
        .chars()
        .filter(|c| c.is_uppercase())
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect();

    if initials.is_empty() {
        fold_alphanumeric(rest)
    } else {
        initials
    }
}
