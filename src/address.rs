//! Affiliation address canonicalization.
//!
//! An address field holds one chunk per affiliation, separated by `;`. Each
//! chunk is comma separated and ends with the country, which is rewritten
//! to its canonical name. Web of Science prefixes chunks with a bracketed
//! author list (`[Smith, J.; Doe, A.] Univ X, ...`); semicolons inside the
//! brackets do not separate chunks.

use crate::country::CountryTable;
use itertools::Itertools;

/// Number of trailing commas treated as segment boundaries within a chunk.
const MAX_TRAILING_SPLITS: usize = 5;

/// Canonicalizes the trailing country token of every affiliation chunk.
///
/// Chunk count and every non-country segment are preserved; only the last
/// segment of each chunk is replaced by [`CountryTable::canonical`].
///
/// # Examples
///
/// ```
/// use bibmerge::address::canonicalize_addresses;
/// use bibmerge::country::CountryTable;
///
/// let countries = CountryTable::default();
/// assert_eq!(
///     canonicalize_addresses("Tsinghua Univ, Beijing, Peoples R China; MIT, Cambridge, USA", &countries),
///     "Tsinghua Univ, Beijing, China; MIT, Cambridge, United States"
/// );
/// ```
pub fn canonicalize_addresses(text: &str, countries: &CountryTable) -> String {
    split_chunks(text)
        .into_iter()
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| canonicalize_chunk(chunk, countries))
        .join("; ")
}

/// Rewrites the country segment of a single chunk.
fn canonicalize_chunk(chunk: &str, countries: &CountryTable) -> String {
    let mut segments: Vec<&str> = chunk.rsplitn(MAX_TRAILING_SPLITS + 1, ',').collect();
    segments.reverse();

    let Some((country, rest)) = segments.split_last() else {
        return String::new();
    };
    let country = countries.canonical(country);

    rest.iter()
        .map(|segment| segment.trim())
        .chain(std::iter::once(country.as_str()))
        .join(", ")
}

/// Splits on `;` outside square brackets.
fn split_chunks(text: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                chunks.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    chunks.push(&text[start..]);
    chunks
}
