//! Record merge engine.
//!
//! Combines the records of both exports into one collection in which every
//! publication appears once.
//!
//! ## Usage
//!
//! ```rust
//! use bibmerge::merge::Merger;
//! use bibmerge::record::{Record, Source};
//!
//! let records = vec![
//!     Record::new(Source::A)
//!         .with_field("Article Title", "Deep Learning for X")
//!         .with_field("Authors", "Smith, J.")
//!         .with_field("Publication Year", "2020")
//!         .with_field("Cited References", "Doe A, 2018, NATURE, V5"),
//!     Record::new(Source::B)
//!         .with_field("Article Title", "Deep learning for X.")
//!         .with_field("Authors", "Smith J")
//!         .with_field("Publication Year", "2020")
//!         .with_field("Cited References", "Roe B., A Title, Science, 12, 2017"),
//! ];
//!
//! let outcome = Merger::new().merge(records);
//! assert_eq!(outcome.records.len(), 1);
//! assert_eq!(outcome.records[0].sources_label(), "WoS Scopus");
//! assert_eq!(
//!     outcome.records[0].get("Cited References"),
//!     "doe a, 2018, NATURE; roe b, 2017, SCIENCE"
//! );
//! ```
//!
//! ## Algorithm
//!
//! 1. Every record is normalized on its own (addresses, journal, cited
//!    references). This pass runs in parallel when enabled.
//! 2. Each record gets an [`IdentityKey`] of normalized title, normalized
//!    authors and year.
//! 3. Records sharing a key form a group. The first record of a group in
//!    arrival order is kept; the others only contribute their origins and
//!    cited references.
//! 4. Survivors that still share a [`SecondaryKey`] (raw author text instead
//!    of normalized authors) are collapsed to the first one, and every record
//!    involved is reported in [`MergeOutcome::dropped`].

use crate::country::CountryTable;
use crate::normalize::{normalize_authors, normalize_title, normalize_year};
use crate::record::{Record, ReferenceView, Source};
use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Configuration options for the merge.
///
/// # Examples
///
/// ```
/// use bibmerge::merge::MergerConfig;
/// use bibmerge::record::ReferenceView;
///
/// let config = MergerConfig {
///     run_in_parallel: true,
///     reference_view: ReferenceView::Citation,
/// };
/// ```
#[derive(Debug, Default, Clone)]
pub struct MergerConfig {
    /// Whether to normalize and key records in parallel.
    /// Ignored unless the `parallel` feature is enabled.
    pub run_in_parallel: bool,
    /// Which reference view is written to the cited-references field.
    pub reference_view: ReferenceView,
}

/// The key under which two records count as the same publication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    pub title: String,
    pub authors: String,
    pub year: String,
}

impl IdentityKey {
    pub fn of(record: &Record, schema: &Schema) -> Self {
        Self {
            title: normalize_title(record.get(schema.title_field())),
            authors: normalize_authors(record.get(schema.authors_field())),
            year: normalize_year(record.get(schema.year_field())),
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {} | {}", self.title, self.authors, self.year)
    }
}

/// Like [`IdentityKey`], but over the raw author text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SecondaryKey {
    pub title: String,
    pub raw_authors: String,
    pub year: String,
}

impl SecondaryKey {
    pub fn of(record: &Record, schema: &Schema) -> Self {
        Self {
            title: normalize_title(record.get(schema.title_field())),
            raw_authors: record.get(schema.authors_field()).trim().to_string(),
            year: normalize_year(record.get(schema.year_field())),
        }
    }
}

/// One row of the dropped-records report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedRecord {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Source")]
    pub sources: String,
    #[serde(rename = "External ID")]
    pub external_id: String,
    #[serde(rename = "Identity Key")]
    pub identity_key: String,
    #[serde(rename = "Authors")]
    pub authors: String,
    #[serde(rename = "Year")]
    pub year: String,
}

impl DroppedRecord {
    fn from_record(record: &Record, schema: &Schema) -> Self {
        Self {
            title: record.get(schema.title_field()).to_string(),
            sources: record.sources_label(),
            external_id: record.external_id(schema).to_string(),
            identity_key: IdentityKey::of(record, schema).to_string(),
            authors: record.get(schema.authors_field()).to_string(),
            year: normalize_year(record.get(schema.year_field())),
        }
    }
}

/// Counters describing the inputs and the merged output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSummary {
    /// Records received per origin
    pub input_counts: BTreeMap<Source, usize>,
    /// Distinct normalized titles per origin
    pub unique_titles: BTreeMap<Source, usize>,
    /// Normalized titles present in both origins
    pub title_overlap: usize,
    /// Normalized titles present only in origin B
    pub titles_only_in_b: usize,
    /// Output records carrying each origin; a merged record counts for both
    pub output_counts: BTreeMap<Source, usize>,
    /// Output records carrying more than one origin
    pub merged_records: usize,
    /// Output records in total
    pub total: usize,
}

impl MergeSummary {
    fn from_inputs(records: &[Record], schema: &Schema) -> Self {
        let mut input_counts = per_source(|| 0);
        let mut titles: BTreeMap<Source, HashSet<String>> = per_source(HashSet::new);
        for record in records {
            let title = normalize_title(record.get(schema.title_field()));
            for &source in record.sources() {
                *input_counts.entry(source).or_insert(0) += 1;
                titles.entry(source).or_default().insert(title.clone());
            }
        }

        let empty = HashSet::new();
        let titles_a = titles.get(&Source::A).unwrap_or(&empty);
        let titles_b = titles.get(&Source::B).unwrap_or(&empty);

        Self {
            unique_titles: titles.iter().map(|(s, t)| (*s, t.len())).collect(),
            title_overlap: titles_a.intersection(titles_b).count(),
            titles_only_in_b: titles_b.difference(titles_a).count(),
            input_counts,
            output_counts: per_source(|| 0),
            ..Default::default()
        }
    }

    fn record_outputs(&mut self, records: &[Record]) {
        for record in records {
            for &source in record.sources() {
                *self.output_counts.entry(source).or_insert(0) += 1;
            }
        }
        self.merged_records = records.iter().filter(|r| r.sources().len() > 1).count();
        self.total = records.len();
    }
}

/// A map with an entry for every origin, so lookups by origin never miss.
fn per_source<T>(init: impl Fn() -> T) -> BTreeMap<Source, T> {
    Source::ALL.into_iter().map(|source| (source, init())).collect()
}

/// The result of a merge.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// Deduplicated records, in arrival order of their first member
    pub records: Vec<Record>,
    /// Every record involved in a secondary-key collision
    pub dropped: Vec<DroppedRecord>,
    pub summary: MergeSummary,
}

/// Merges records from both exports into one deduplicated collection.
///
/// # Examples
///
/// ```
/// use bibmerge::merge::{Merger, MergerConfig};
/// use bibmerge::record::ReferenceView;
///
/// let merger = Merger::new().with_config(MergerConfig {
///     run_in_parallel: true,
///     reference_view: ReferenceView::Citation,
/// });
/// let outcome = merger.merge(Vec::new());
/// assert!(outcome.records.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Merger {
    config: MergerConfig,
    schema: Schema,
    countries: CountryTable,
}

impl Merger {
    /// Creates a merger over the default schema and country table, running sequentially.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(mut self, config: MergerConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    #[must_use]
    pub fn with_countries(mut self, countries: CountryTable) -> Self {
        self.countries = countries;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Normalizes, groups and merges `records`.
    ///
    /// Records are expected in arrival order, with the preferred export
    /// first; that order decides which record represents a duplicate group.
    pub fn merge(&self, mut records: Vec<Record>) -> MergeOutcome {
        let mut summary = MergeSummary::from_inputs(&records, &self.schema);

        self.normalize_all(&mut records);
        let keys = self.identity_keys(&records);
        let representatives = self.combine_groups(records, keys);
        let (mut survivors, dropped) = collapse_secondary(representatives, &self.schema);

        for record in &mut survivors {
            record.write_references(&self.schema, self.config.reference_view);
        }
        summary.record_outputs(&survivors);

        tracing::info!(
            input = ?summary.input_counts,
            unique_titles = ?summary.unique_titles,
            title_overlap = summary.title_overlap,
            titles_only_in_b = summary.titles_only_in_b,
            output = ?summary.output_counts,
            merged = summary.merged_records,
            dropped = dropped.len(),
            total = summary.total,
            "merge finished"
        );

        MergeOutcome {
            records: survivors,
            dropped,
            summary,
        }
    }

    fn normalize_all(&self, records: &mut [Record]) {
        #[cfg(feature = "parallel")]
        if self.config.run_in_parallel {
            use rayon::prelude::*;

            records
                .par_iter_mut()
                .for_each(|record| record.normalize(&self.schema, &self.countries));
            return;
        }

        for record in records.iter_mut() {
            record.normalize(&self.schema, &self.countries);
        }
    }

    fn identity_keys(&self, records: &[Record]) -> Vec<IdentityKey> {
        #[cfg(feature = "parallel")]
        if self.config.run_in_parallel {
            use rayon::prelude::*;

            return records
                .par_iter()
                .map(|record| IdentityKey::of(record, &self.schema))
                .collect();
        }

        records
            .iter()
            .map(|record| IdentityKey::of(record, &self.schema))
            .collect()
    }

    /// Collapses each identity-key group onto its first member.
    fn combine_groups(&self, records: Vec<Record>, keys: Vec<IdentityKey>) -> Vec<Record> {
        let mut group_of: HashMap<IdentityKey, usize> = HashMap::new();
        let mut representatives: Vec<Record> = Vec::new();

        for (record, key) in records.into_iter().zip(keys) {
            match group_of.get(&key) {
                Some(&index) => {
                    tracing::debug!(
                        key = %key,
                        duplicate = %record.sources_label(),
                        "merging duplicate into earlier record"
                    );
                    representatives[index].absorb(record);
                }
                None => {
                    group_of.insert(key, representatives.len());
                    representatives.push(record);
                }
            }
        }

        representatives
    }
}

/// Collapses records sharing a [`SecondaryKey`], keeping the first of each.
///
/// Returns the survivors in their original order and a report row for every
/// record that took part in a collision, the kept one included.
pub fn collapse_secondary(
    records: Vec<Record>,
    schema: &Schema,
) -> (Vec<Record>, Vec<DroppedRecord>) {
    let keys: Vec<SecondaryKey> = records
        .iter()
        .map(|record| SecondaryKey::of(record, schema))
        .collect();

    let mut counts: HashMap<&SecondaryKey, usize> = HashMap::new();
    for key in &keys {
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut seen: HashSet<&SecondaryKey> = HashSet::new();
    let mut survivors = Vec::with_capacity(records.len());
    let mut dropped = Vec::new();

    for (record, key) in records.into_iter().zip(&keys) {
        if counts[key] > 1 {
            tracing::debug!(title = %key.title, year = %key.year, "secondary key collision");
            dropped.push(DroppedRecord::from_record(&record, schema));
        }
        if seen.insert(key) {
            survivors.push(record);
        }
    }

    (survivors, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(source: Source, title: &str, authors: &str, year: &str, refs: &str) -> Record {
        Record::new(source)
            .with_field("Article Title", title)
            .with_field("Authors", authors)
            .with_field("Publication Year", year)
            .with_field("Cited References", refs)
    }

    #[test]
    fn test_identity_key() {
        let schema = Schema::new();
        let a = record(Source::A, "Deep Learning for X", "Smith, J.", "2020", "");
        let b = record(Source::B, "deep-learning for x.", "Smith J", "2020.0", "");
        assert_eq!(IdentityKey::of(&a, &schema), IdentityKey::of(&b, &schema));
        assert_eq!(
            IdentityKey::of(&a, &schema).to_string(),
            "deep learning for x | smith j | 2020"
        );
    }

    #[test]
    fn test_merge_end_to_end_scenario() {
        let records = vec![
            record(
                Source::A,
                "Deep Learning for X",
                "Smith, J.",
                "2020",
                "Doe A, 2018, NATURE, V5; Roe B, 2017, SCIENCE, V3",
            ),
            record(
                Source::B,
                "Deep learning for X.",
                "Smith J",
                "2020",
                "Doe A., A Title, Nature, 5, 2018; Poe C., Other Title, Cell, 9, 2016",
            ),
        ];

        let outcome = Merger::new().merge(records);

        assert_eq!(outcome.records.len(), 1);
        let merged = &outcome.records[0];
        assert_eq!(merged.get("Article Title"), "Deep Learning for X");
        assert_eq!(merged.sources_label(), "WoS Scopus");
        assert_eq!(
            merged.get("Cited References"),
            "doe a, 2018, NATURE; poe c, 2016, CELL; roe b, 2017, SCIENCE"
        );
        assert!(outcome.dropped.is_empty());
    }

    #[test]
    fn test_merge_citation_view_keeps_verbatim_text() {
        let records = vec![
            record(Source::A, "T", "Smith J", "2020", "ref one; ref two"),
            record(Source::B, "T", "Smith J", "2020", "ref two; ref three"),
        ];
        let merger = Merger::new().with_config(MergerConfig {
            run_in_parallel: false,
            reference_view: ReferenceView::Citation,
        });

        let outcome = merger.merge(records);
        assert_eq!(
            outcome.records[0].get("Cited References"),
            "ref one; ref three; ref two"
        );
    }

    #[test]
    fn test_first_record_wins() {
        let records = vec![
            record(Source::B, "Title", "Smith J", "2020", "").with_field("Abstract", "from scopus"),
            record(Source::A, "Title", "Smith J", "2020", "").with_field("Abstract", "from wos"),
        ];
        let outcome = Merger::new().merge(records);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].get("Abstract"), "from scopus");
        assert_eq!(outcome.records[0].sources_label(), "WoS Scopus");
    }

    #[test]
    fn test_distinct_years_do_not_merge() {
        let records = vec![
            record(Source::A, "Title", "Smith J", "2020", ""),
            record(Source::B, "Title", "Smith J", "2021", ""),
            record(Source::B, "Title", "Doe A", "2020", ""),
        ];
        let outcome = Merger::new().merge(records);
        assert_eq!(outcome.records.len(), 3);
        assert!(outcome.records.iter().all(|r| r.sources().len() == 1));
    }

    #[test]
    fn test_output_identity_keys_are_unique() {
        let schema = Schema::new();
        let records = vec![
            record(Source::A, "Alpha", "Smith, J.", "2020", ""),
            record(Source::A, "Alpha!", "Smith J", "2020", ""),
            record(Source::B, "ALPHA", "Smith J.", "2020.0", ""),
            record(Source::B, "Beta", "Smith J", "2020", ""),
            record(Source::A, "Beta", "Doe A", "2020", ""),
            record(Source::B, "beta", "Doe, Anna", "2020", ""),
        ];
        let outcome = Merger::new().merge(records);

        let keys: HashSet<IdentityKey> = outcome
            .records
            .iter()
            .map(|r| IdentityKey::of(r, &schema))
            .collect();
        assert_eq!(keys.len(), outcome.records.len());
        assert_eq!(outcome.records.len(), 3);
    }

    #[test]
    fn test_summary() {
        let records = vec![
            record(Source::A, "Alpha", "Smith J", "2020", ""),
            record(Source::A, "Gamma", "Smith J", "2020", ""),
            record(Source::B, "alpha.", "Smith J", "2020", ""),
            record(Source::B, "Beta", "Smith J", "2020", ""),
            record(Source::B, "Beta", "Smith J", "2020", ""),
        ];
        let outcome = Merger::new().merge(records);
        let summary = &outcome.summary;

        assert_eq!(summary.input_counts[&Source::A], 2);
        assert_eq!(summary.input_counts[&Source::B], 3);
        assert_eq!(summary.unique_titles[&Source::A], 2);
        assert_eq!(summary.unique_titles[&Source::B], 2);
        assert_eq!(summary.title_overlap, 1);
        assert_eq!(summary.titles_only_in_b, 1);
        assert_eq!(summary.output_counts[&Source::A], 2);
        assert_eq!(summary.output_counts[&Source::B], 2);
        assert_eq!(summary.merged_records, 1);
        assert_eq!(summary.total, 3);
    }

    #[test]
    fn test_summary_counts_every_origin_even_when_empty() {
        let records = vec![record(Source::A, "Only WoS", "Smith J", "2020", "")];
        let summary = Merger::new().merge(records).summary;

        assert_eq!(summary.input_counts[&Source::B], 0);
        assert_eq!(summary.unique_titles[&Source::B], 0);
        assert_eq!(summary.output_counts[&Source::B], 0);
        assert_eq!(summary.output_counts[&Source::A], 1);
        assert_eq!(summary.titles_only_in_b, 0);

        let empty = Merger::new().merge(Vec::new()).summary;
        assert_eq!(empty.input_counts.len(), Source::ALL.len());
        assert_eq!(empty.output_counts[&Source::A], 0);
        assert_eq!(empty.total, 0);
    }

    #[test]
    fn test_collapse_secondary_reports_every_colliding_record() {
        let schema = Schema::new();
        let records = vec![
            record(Source::A, "Title", "Smith J", "2020", "").with_field("DOI", "10.1/a"),
            record(Source::B, "Other", "Smith J", "2020", ""),
            record(Source::B, "Title.", "Smith J", "2020", "").with_field("DOI", "10.1/b"),
        ];

        let (survivors, dropped) = collapse_secondary(records, &schema);

        assert_eq!(survivors.len(), 2);
        assert_eq!(survivors[0].get("DOI"), "10.1/a");
        assert_eq!(survivors[1].get("Article Title"), "Other");
        assert_eq!(
            dropped,
            vec![
                DroppedRecord {
                    title: "Title".to_string(),
                    sources: "WoS".to_string(),
                    external_id: "10.1/a".to_string(),
                    identity_key: "title | smith j | 2020".to_string(),
                    authors: "Smith J".to_string(),
                    year: "2020".to_string(),
                },
                DroppedRecord {
                    title: "Title.".to_string(),
                    sources: "Scopus".to_string(),
                    external_id: "10.1/b".to_string(),
                    identity_key: "title | smith j | 2020".to_string(),
                    authors: "Smith J".to_string(),
                    year: "2020".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_secondary_key_uses_raw_authors() {
        let schema = Schema::new();
        let a = record(Source::A, "Title", "Smith, J.", "2020", "");
        let b = record(Source::B, "Title", "Smith J", "2020", "");
        assert_ne!(SecondaryKey::of(&a, &schema), SecondaryKey::of(&b, &schema));
        assert_eq!(IdentityKey::of(&a, &schema), IdentityKey::of(&b, &schema));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let records: Vec<Record> = (0..200)
            .map(|i| {
                let source = if i % 2 == 0 { Source::A } else { Source::B };
                record(
                    source,
                    &format!("Title {}", i % 70),
                    "Smith, J.",
                    "2020",
                    &format!("Doe A, {}, NATURE, V1", 1900 + i),
                )
            })
            .collect();

        let sequential = Merger::new().merge(records.clone());
        let parallel = Merger::new()
            .with_config(MergerConfig {
                run_in_parallel: true,
                ..Default::default()
            })
            .merge(records);

        assert_eq!(sequential.records, parallel.records);
        assert_eq!(sequential.summary, parallel.summary);
        assert_eq!(parallel.records.len(), 70);
    }
}
