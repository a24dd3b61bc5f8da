//! Canonical country names for affiliation addresses.
//!
//! Both export formats spell countries their own way ("Peoples R China",
//! "U Arab Emirates", "Boston, MA 02115 USA"). A [`CountryTable`] maps such
//! tokens onto one canonical name through an ordered list of patterns.

use crate::error::{MergeError, Result};
use crate::normalize::title_case;
use crate::regex::Regex;

/// Built-in patterns, matched case-insensitively against the whole token.
///
/// Order matters: more specific patterns come before the ones they overlap
/// with ("north korea" before "korea", "northern ireland" before "ireland").
const DEFAULT_PATTERNS: &[(&str, &str)] = &[
    (r"taiwan|.*\btaiwan\b.*", "Taiwan"),
    (r"hong kong|.*\bhong kong\b.*", "Hong Kong"),
    (
        r"peoples?\s+r(ep)?\.?(\s+of)?\s+china|p\.?\s*r\.?\s*china|prc|china|.*\bchina",
        "China",
    ),
    (
        r"u\.?\s?s\.?\s?a\.?|united\s+states(\s+of\s+america)?|us|.*\busa\.?",
        "United States",
    ),
    (
        r"u\.?\s?a\.?\s?e\.?|united\s+arab\s+emirates|u\s+arab\s+emirates",
        "United Arab Emirates",
    ),
    (r"northern\s+ireland|north\s+ireland", "United Kingdom"),
    (
        r"u\.?\s?k\.?|united\s+kingdom|england|scotland|wales|great\s+britain",
        "United Kingdom",
    ),
    (r"ireland|republic\s+of\s+ireland|eire", "Ireland"),
    (
        r"north\s+korea|dem(ocratic)?\s+peoples?\s+r(ep)?\.?(\s+of)?\s+korea",
        "North Korea",
    ),
    (
        r"south\s+korea|republic\s+of\s+korea|rep(ublic)?\.?\s+korea|korea",
        "South Korea",
    ),
    (r"russian\s+federation|russia", "Russia"),
    (r"islamic\s+republic\s+of\s+iran|iran", "Iran"),
    (r"viet\s*nam", "Vietnam"),
    (r"t(u|ü)rkiye|turkey", "Turkey"),
    (r"czech\s+republic|czechia", "Czech Republic"),
    (r"(the\s+)?netherlands|holland", "Netherlands"),
];

/// Ordered `pattern → canonical name` lookup for country tokens.
///
/// The first matching pattern wins. Tokens that match nothing are returned
/// title-cased, so the table never fails on unexpected input.
///
/// # Examples
///
/// ```
/// use bibmerge::country::CountryTable;
///
/// let countries = CountryTable::default();
/// assert_eq!(countries.canonical("Peoples R China"), "China");
/// assert_eq!(countries.canonical("U.S.A."), "United States");
/// assert_eq!(countries.canonical("GERMANY"), "Germany");
/// ```
#[derive(Debug, Clone)]
pub struct CountryTable {
    entries: Vec<(Regex, String)>,
}

impl Default for CountryTable {
    fn default() -> Self {
        let entries = DEFAULT_PATTERNS
            .iter()
            .map(|(pattern, name)| (compile_pattern(pattern).unwrap(), (*name).to_string()))
            .collect();
        Self { entries }
    }
}

impl CountryTable {
    /// Builds a table from custom `(pattern, canonical name)` pairs.
    ///
    /// Patterns are anchored to the whole token and matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::InvalidConfig`] if a pattern is not a valid regex.
    pub fn from_patterns<P, N>(patterns: impl IntoIterator<Item = (P, N)>) -> Result<Self>
    where
        P: AsRef<str>,
        N: Into<String>,
    {
        let entries = patterns
            .into_iter()
            .map(|(pattern, name)| {
                compile_pattern(pattern.as_ref())
                    .map(|regex| (regex, name.into()))
                    .map_err(|e| {
                        MergeError::InvalidConfig(format!(
                            "country pattern \"{}\": {e}",
                            pattern.as_ref()
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// Returns the canonical country name for `token`.
    pub fn canonical(&self, token: &str) -> String {
        let token = token.trim();
        self.entries
            .iter()
            .find(|(regex, _)| regex.is_match(token))
            .map(|(_, name)| name.clone())
            .unwrap_or_else(|| title_case(token))
    }

    /// Number of patterns in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn compile_pattern(pattern: &str) -> std::result::Result<Regex, impl std::error::Error> {
    Regex::new(&format!(r"(?i)^(?:{pattern})$"))
}
