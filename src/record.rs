//! Unified bibliographic records.

use crate::address::canonicalize_addresses;
use crate::country::CountryTable;
use crate::normalize::normalize_journal_name;
use crate::reference::{parse_references, verbatim_references};
use crate::schema::Schema;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// The export a record came from.
///
/// Ordering matters: when both origins hold the same publication, the one
/// loaded first provides the merged record's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Source {
    /// Web of Science
    #[serde(rename = "WoS")]
    A,
    /// Scopus
    #[serde(rename = "Scopus")]
    B,
}

impl Source {
    pub const ALL: [Source; 2] = [Source::A, Source::B];

    /// The label written to the `Source` output column.
    pub fn label(self) -> &'static str {
        match self {
            Source::A => "WoS",
            Source::B => "Scopus",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which derived view of the cited references is written to the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceView {
    /// Parsed `(author, year, journal)` triples, for co-citation networks
    #[default]
    CoCitation,
    /// The original reference strings, verbatim
    Citation,
}

/// Both derived views of a record's cited references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSet {
    /// Parsed triples in their string form
    pub co_citation: BTreeSet<String>,
    /// Original reference strings
    pub citation: BTreeSet<String>,
}

impl ReferenceSet {
    /// Derives both views from a `;`-joined cited-references field.
    pub fn from_field(field: &str) -> Self {
        Self {
            co_citation: parse_references(field),
            citation: verbatim_references(field),
        }
    }

    /// Set-unions another record's references into this one.
    pub fn union_with(&mut self, other: ReferenceSet) {
        self.co_citation.extend(other.co_citation);
        self.citation.extend(other.citation);
    }

    pub fn view(&self, view: ReferenceView) -> &BTreeSet<String> {
        match view {
            ReferenceView::CoCitation => &self.co_citation,
            ReferenceView::Citation => &self.citation,
        }
    }

    /// Renders one view back into a `;`-joined field value.
    pub fn render(&self, view: ReferenceView) -> String {
        self.view(view).iter().join("; ")
    }
}

/// A single publication mapped onto the unified schema.
///
/// Field access is total: a field the record does not carry reads as `""`.
///
/// # Examples
///
/// ```
/// use bibmerge::record::{Record, Source};
///
/// let record = Record::new(Source::A)
///     .with_field("Article Title", "Deep Learning for X")
///     .with_field("Publication Year", "2020");
/// assert_eq!(record.get("Article Title"), "Deep Learning for X");
/// assert_eq!(record.get("Abstract"), "");
/// assert_eq!(record.sources_label(), "WoS");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: HashMap<String, String>,
    sources: BTreeSet<Source>,
    references: ReferenceSet,
}

impl Record {
    /// Creates an empty record from one origin.
    #[must_use]
    pub fn new(source: Source) -> Self {
        Self {
            fields: HashMap::new(),
            sources: BTreeSet::from([source]),
            references: ReferenceSet::default(),
        }
    }

    /// Builder-style [`Record::set`].
    #[must_use]
    pub fn with_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(name.to_string(), value.into());
    }

    /// Returns the field value, or `""` if the record does not carry it.
    pub fn get(&self, name: &str) -> &str {
        self.fields.get(name).map_or("", String::as_str)
    }

    pub fn fields(&self) -> &HashMap<String, String> {
        &self.fields
    }

    pub fn sources(&self) -> &BTreeSet<Source> {
        &self.sources
    }

    /// Origins joined by a space in canonical order, e.g. `"WoS Scopus"`.
    pub fn sources_label(&self) -> String {
        self.sources.iter().map(|s| s.label()).join(" ")
    }

    pub fn references(&self) -> &ReferenceSet {
        &self.references
    }

    /// The first non-empty external identifier field, or `""`.
    pub fn external_id(&self, schema: &Schema) -> &str {
        schema
            .external_id_fields()
            .iter()
            .map(|field| self.get(field).trim())
            .find(|id| !id.is_empty())
            .unwrap_or("")
    }

    /// Runs the per-record normalization pass.
    ///
    /// Canonicalizes the country of every address field, normalizes the
    /// journal name and derives both reference views from the raw
    /// cited-references field. Reads and writes only this record.
    pub fn normalize(&mut self, schema: &Schema, countries: &CountryTable) {
        for field in schema.address_fields() {
            if let Some(value) = self.fields.get_mut(field) {
                *value = canonicalize_addresses(value, countries);
            }
        }

        if let Some(journal) = self.fields.get_mut(schema.journal_field()) {
            *journal = normalize_journal_name(journal);
        }

        self.references = ReferenceSet::from_field(self.get(schema.cited_references_field()));
    }

    /// Folds a duplicate into this record: provenance and cited references
    /// are unioned, every other field stays as it is.
    pub(crate) fn absorb(&mut self, duplicate: Record) {
        self.sources.extend(duplicate.sources);
        self.references.union_with(duplicate.references);
    }

    /// Writes the selected reference view back into the cited-references field.
    pub(crate) fn write_references(&mut self, schema: &Schema, view: ReferenceView) {
        let rendered = self.references.render(view);
        self.set(schema.cited_references_field(), rendered);
    }
}
