//! Merge Web of Science and Scopus exports into one deduplicated record set.
//!
//! `bibmerge` reconciles the two citation-database schemas so that
//! bibliometric analysis (citation counts, co-citation networks, affiliation
//! geography) works on comparable values.
//!
//! # Key Features
//!
//! - **Text normalization**: titles, author names, journal names and
//!   affiliation countries fold to comparable keys
//! - **Cited-reference parsing**: both reference layouts are recognized
//!   automatically and folded to `(author, year, journal)` triples
//! - **Merging**: duplicates are found by a composite identity key, their
//!   cited references are unioned and their provenance is recorded
//! - **Audit**: secondary-key collisions are reported instead of discarded
//! - **CSV I/O**: load either export and write the merged result
//!
//! # Basic Usage
//!
//! ```rust
//! use bibmerge::csv::CsvRecordSource;
//! use bibmerge::merge::Merger;
//! use bibmerge::record::Source;
//!
//! let wos = "Article Title,Authors,Publication Year,Cited References\n\
//!            Deep Learning for X,\"Smith, J.\",2020,\"Doe A, 2018, NATURE, V5\"";
//! let scopus = "Title,Authors,Year,References\n\
//!               Deep learning for X.,Smith J,2020,\"Doe A., Some Title, Nature, 5, 2018\"";
//!
//! let mut records = CsvRecordSource::new(Source::A).parse(wos).unwrap();
//! records.extend(CsvRecordSource::new(Source::B).parse(scopus).unwrap());
//!
//! let outcome = Merger::new().merge(records);
//! assert_eq!(outcome.records.len(), 1);
//! assert_eq!(outcome.records[0].get("Cited References"), "doe a, 2018, NATURE");
//! assert_eq!(outcome.summary.title_overlap, 1);
//! ```
//!
//! # Error Handling
//!
//! Normalizers never fail. Loading can fail with a [`MergeError`]:
//!
//! ```rust
//! use bibmerge::csv::CsvRecordSource;
//! use bibmerge::record::Source;
//! use bibmerge::MergeError;
//!
//! match CsvRecordSource::new(Source::A).parse("Authors\nSmith J") {
//!     Err(MergeError::SchemaMismatch { field, .. }) => assert_eq!(field, "Article Title"),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```
//!
//! # Logging
//!
//! Progress and merge counters are emitted through [`tracing`]; install a
//! subscriber in the host to see them.
//!
//! # Thread Safety
//!
//! All normalizers are pure functions. The merger normalizes and keys
//! records in parallel when `run_in_parallel` is set and the `parallel`
//! feature is enabled.

pub mod address;
pub mod country;
#[cfg(feature = "csv")]
pub mod csv;
pub mod error;
pub mod merge;
pub mod normalize;
pub mod record;
pub mod reference;
pub mod schema;

mod regex;

// Reexports
pub use country::CountryTable;
pub use error::{MergeError, Result};
pub use merge::{DroppedRecord, MergeOutcome, MergeSummary, Merger, MergerConfig};
pub use record::{Record, ReferenceView, Source};
pub use reference::{CitationTriple, Grammar};
pub use schema::Schema;
