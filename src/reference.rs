//! Cited-reference parsing.
//!
//! A cited-references field is a `;`-joined list of free-text references.
//! Web of Science writes them as
//!
//! ```text
//! Smith J, 2019, J APPL PHYS, V12, P123, DOI 10.1063/1.123
//! ```
//!
//! while Scopus writes
//!
//! ```text
//! Smith J., Doe A., Some Title, J Appl Phys, 12(3), pp. 123-130, 2019
//! Smith, J., Some Title (2019) J Appl Phys, 12 (3), pp. 123-130
//! ```
//!
//! Neither export says which layout it uses, so the [`Grammar`] is inferred
//! from where the year sits. A `(YYYY) Source` segment is always Scopus. Every parsable reference folds to a
//! [`CitationTriple`] of `(author, year, journal)`; anything else is dropped.

use crate::normalize::{normalize_author_name, normalize_journal_name};
use crate::regex::Regex;
use compact_str::CompactString;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

static YEAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([0-9]{4})\b").unwrap());

/// `Title (2019) Journal Name`, the Scopus year-then-source segment.
static SOURCE_YEAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([0-9]{4})\)\s*(.*)$").unwrap());

/// Scopus splits `Smith, J.` on the comma; the initials land in their own segment.
static INITIALS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[A-Z]\.(?:\s|-)?)+$").unwrap());

/// WoS volume and page tokens: `V12`, `P123`, `12`.
static WOS_VOLUME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[vp]?\d+").unwrap());

/// Scopus volume/issue tokens: `12`, `12(3)`, `12 (3)`.
static SCOPUS_VOLUME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v?\d+\s*\(?\d*\)?").unwrap());

/// Page ranges: `pp. 123-130`, `p. 5-9`, `123-130`.
static PAGE_RANGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:pp?\.?\s*)?\d+\s*-\s*\d+").unwrap());

static YEAR_TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(?[0-9]{4}\)?\.?$").unwrap());

/// A cited reference folded to comparable parts.
///
/// The string form `"<author>, <year>, <journal>"` is what ends up in the
/// co-citation view; it sorts and deduplicates as plain text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CitationTriple {
    /// First author key as produced by [`normalize_author_name`]
    pub author: CompactString,
    /// Four-digit publication year
    pub year: CompactString,
    /// Journal key as produced by [`normalize_journal_name`]; never empty, never contains a digit
    pub journal: String,
}

impl fmt::Display for CitationTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.author, self.year, self.journal)
    }
}

/// The two reference layouts found in the exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// `author, year, journal, volume, page, doi`
    WosStyle,
    /// `authors, title, journal, volume(issue), pages, year`
    ScopusStyle,
}

impl Grammar {
    /// Picks the grammar from the segment index holding a bare year.
    ///
    /// Only the Web of Science layout puts the year directly after the author.
    /// A `(YYYY) Source` segment is Scopus wherever it sits and never reaches
    /// this check.
    pub fn detect(year_index: usize) -> Self {
        if year_index == 1 {
            Grammar::WosStyle
        } else {
            Grammar::ScopusStyle
        }
    }

    /// Extracts the raw journal span from the segments of one reference.
    ///
    /// Returns `None` when the layout leaves no room for a journal.
    pub fn journal_span(self, segments: &[&str], year_index: usize) -> Option<String> {
        match self {
            Grammar::WosStyle => wos_journal_span(segments),
            Grammar::ScopusStyle => scopus_journal_span(segments, year_index),
        }
    }
}

fn wos_journal_span(segments: &[&str]) -> Option<String> {
    let tail = segments.get(2..)?;
    let end = tail
        .iter()
        .position(|segment| WOS_VOLUME_REGEX.is_match(segment) || contains_doi(segment))
        .unwrap_or(tail.len());

    if end == 0 {
        return None;
    }
    Some(tail[..end].join(", "))
}

fn scopus_journal_span(segments: &[&str], year_index: usize) -> Option<String> {
    if let Some((_, journal)) = segments
        .get(year_index)
        .and_then(|segment| source_with_year(segment))
    {
        return Some(journal.to_string());
    }

    let boundary = segments
        .iter()
        .enumerate()
        .skip(1)
        .find(|(i, segment)| *i == year_index || is_scopus_boundary(segment))
        .map(|(i, _)| i)?;

    // authors, title, journal: the journal is the last segment before the boundary
    if boundary < 3 {
        return None;
    }
    Some(segments[boundary - 1].to_string())
}

/// Splits `Title (2019) Journal` into the year and the text after it.
fn source_with_year(segment: &str) -> Option<(CompactString, &str)> {
    let caps = SOURCE_YEAR_REGEX.captures(segment)?;
    let journal = caps.get(2)?.as_str().trim();
    if journal.is_empty() {
        return None;
    }
    Some((CompactString::from(&caps[1]), journal))
}

/// First segment carrying a 4-digit year; page ranges never do.
fn locate_year(segments: &[&str]) -> Option<(usize, CompactString)> {
    segments
        .iter()
        .enumerate()
        .filter(|(_, segment)| !PAGE_RANGE_REGEX.is_match(segment))
        .find_map(|(i, segment)| {
            YEAR_REGEX
                .captures(segment)
                .map(|caps| (i, CompactString::from(&caps[1])))
        })
}

fn is_scopus_boundary(segment: &str) -> bool {
    SCOPUS_VOLUME_REGEX.is_match(segment)
        || PAGE_RANGE_REGEX.is_match(segment)
        || YEAR_TOKEN_REGEX.is_match(segment)
        || contains_doi(segment)
}

fn contains_doi(segment: &str) -> bool {
    segment.to_lowercase().contains("doi")
}

/// Splits on commas outside parentheses, trimming and dropping empty segments.
///
/// ```
/// use bibmerge::reference::split_top_level;
///
/// assert_eq!(
///     split_top_level("Smith J (Ed., 2nd), 2020, NATURE"),
///     vec!["Smith J (Ed., 2nd)", "2020", "NATURE"]
/// );
/// ```
pub fn split_top_level(text: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                segments.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    segments.push(&text[start..]);

    segments
        .into_iter()
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Parses one raw reference into a [`CitationTriple`].
///
/// Returns `None` for anything that does not yield an author, a year and a
/// digit-free journal name.
///
/// # Examples
///
/// ```
/// use bibmerge::reference::parse_reference;
///
/// let wos = parse_reference("Smith J., 2019, J APPL PHYS, V12, P123").unwrap();
/// assert_eq!(wos.to_string(), "smith j, 2019, J APPL PHYS");
///
/// let scopus =
///     parse_reference("Smith J., Doe A., Some Title, J Appl Phys, 12(3), pp. 123-130, 2019");
/// assert_eq!(scopus.unwrap().to_string(), "smith j, 2019, J APPL PHYS");
///
/// assert!(parse_reference("Smith J., 2019").is_none());
/// ```
pub fn parse_reference(raw: &str) -> Option<CitationTriple> {
    let joined_author: String;
    let mut segments = split_top_level(raw);
    if segments.len() < 2 {
        return None;
    }

    if segments.len() > 2 && INITIALS_REGEX.is_match(segments[1]) {
        joined_author = format!("{}, {}", segments[0], segments[1]);
        segments.remove(1);
        segments[0] = &joined_author;
    }

    let author = normalize_author_name(segments[0]);
    if author.is_empty() {
        return None;
    }

    let source_year = segments
        .iter()
        .enumerate()
        .skip(1)
        .find_map(|(i, segment)| source_with_year(segment).map(|(year, _)| (i, year)));
    let (year_index, year, grammar) = match source_year {
        Some((i, year)) => (i, year, Grammar::ScopusStyle),
        None => {
            let (i, year) = locate_year(&segments)?;
            (i, year, Grammar::detect(i))
        }
    };

    let journal = normalize_journal_name(&grammar.journal_span(&segments, year_index)?);
    if journal.is_empty() || journal.chars().any(char::is_numeric) {
        return None;
    }

    Some(CitationTriple {
        author: CompactString::from(author),
        year,
        journal,
    })
}

/// Iterates the individual references of a `;`-joined field.
pub fn split_references(field: &str) -> impl Iterator<Item = &str> {
    field
        .split(';')
        .map(str::trim)
        .filter(|reference| !reference.is_empty())
}

/// The co-citation view: every parsable reference as a triple string,
/// deduplicated and sorted. Unparsable references are skipped.
pub fn parse_references(field: &str) -> BTreeSet<String> {
    split_references(field)
        .filter_map(|raw| {
            let triple = parse_reference(raw);
            if triple.is_none() {
                tracing::trace!(reference = raw, "skipping unparsable cited reference");
            }
            triple
        })
        .map(|triple| triple.to_string())
        .collect()
}

/// The citation view: every reference verbatim, deduplicated and sorted.
pub fn verbatim_references(field: &str) -> BTreeSet<String> {
    split_references(field).map(String::from).collect()
}
