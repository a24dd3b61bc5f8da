//! CSV record source and writers.
//!
//! Loads Web of Science or Scopus CSV exports onto the unified [`Schema`]
//! and writes merged records and the dropped-records report back out.
//!
//! # Example
//!
//! ```
//! use bibmerge::csv::CsvRecordSource;
//! use bibmerge::record::Source;
//!
//! let input = "Title,Authors,Year\nExample Paper,Smith J.,2023";
//!
//! let records = CsvRecordSource::new(Source::B).parse(input).unwrap();
//! assert_eq!(records[0].get("Article Title"), "Example Paper");
//! assert_eq!(records[0].get("Publication Year"), "2023");
//! ```

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{MergeError, Result};
use crate::merge::DroppedRecord;
use crate::record::{Record, Source};
use crate::schema::Schema;

/// Name of the provenance column appended to the merged output.
pub const SOURCE_COLUMN: &str = "Source";

/// Column names of the dropped-records report, matching [`DroppedRecord`]'s serde names.
pub const DROPPED_HEADERS: [&str; 6] = [
    "Title",
    "Source",
    "External ID",
    "Identity Key",
    "Authors",
    "Year",
];

/// CSV dialect options.
///
/// # Examples
///
/// ```
/// use bibmerge::csv::CsvConfig;
///
/// let mut config = CsvConfig::new();
/// config.set_delimiter(b'\t').set_flexible(false);
/// ```
#[derive(Debug, Clone)]
pub struct CsvConfig {
    /// Delimiter to use for parsing the CSV
    pub(crate) delimiter: u8,
    /// Quote character
    pub(crate) quote: u8,
    /// Accept rows with fewer or more fields than the header
    pub(crate) flexible: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvConfig {
    /// Creates a new CSV configuration with default settings
    #[must_use]
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            flexible: true,
        }
    }

    /// Sets the delimiter character
    pub fn set_delimiter(&mut self, delimiter: u8) -> &mut Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets the quote character
    pub fn set_quote(&mut self, quote: u8) -> &mut Self {
        self.quote = quote;
        self
    }

    /// Sets whether ragged rows are accepted
    pub fn set_flexible(&mut self, flexible: bool) -> &mut Self {
        self.flexible = flexible;
        self
    }
}

/// Reads one export into schema-mapped [`Record`]s tagged with its origin.
///
/// Column names are trimmed and renamed through the schema's table for the
/// origin. When two columns map to the same schema field the first wins.
/// Schema fields without a column read as empty strings; columns outside
/// the schema are dropped. Rows with an empty title are skipped.
#[derive(Debug, Clone)]
pub struct CsvRecordSource {
    source: Source,
    schema: Schema,
    config: CsvConfig,
}

impl CsvRecordSource {
    /// Creates a source for one origin with the default schema.
    #[must_use]
    pub fn new(source: Source) -> Self {
        Self {
            source,
            schema: Schema::new(),
            config: CsvConfig::new(),
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: CsvConfig) -> Self {
        self.config = config;
        self
    }

    /// Parses CSV text.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::SchemaMismatch`] if no column maps to the title
    /// field, and [`MergeError::Csv`] on malformed CSV.
    pub fn parse(&self, input: &str) -> Result<Vec<Record>> {
        self.read(input.as_bytes())
    }

    /// Opens and reads a CSV file.
    pub fn read_path(&self, path: impl AsRef<Path>) -> Result<Vec<Record>> {
        let file = File::open(path.as_ref())?;
        self.read(file)
    }

    /// Reads CSV from any reader.
    pub fn read<R: Read>(&self, reader: R) -> Result<Vec<Record>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.config.delimiter)
            .quote(self.config.quote)
            .flexible(self.config.flexible)
            .has_headers(true)
            .from_reader(reader);

        let columns = self.map_columns(reader.headers()?)?;

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for row in reader.records() {
            let row = row?;
            let record = self.build_record(&columns, &row);
            if record.get(self.schema.title_field()).trim().is_empty() {
                skipped += 1;
                continue;
            }
            records.push(record);
        }

        tracing::debug!(
            source = %self.source,
            records = records.len(),
            skipped_without_title = skipped,
            "loaded record source"
        );
        Ok(records)
    }

    /// Maps schema field names to column indices.
    fn map_columns(&self, headers: &StringRecord) -> Result<HashMap<String, usize>> {
        let mut columns = HashMap::new();

        for (i, header) in headers.iter().enumerate() {
            let header = header.trim_start_matches('\u{feff}').trim();
            let field = self.schema.rename(self.source, header);
            if !self.schema.headers().iter().any(|h| h == field) {
                continue;
            }
            if columns.contains_key(field) {
                tracing::debug!(source = %self.source, column = header, "ignoring duplicate column");
                continue;
            }
            columns.insert(field.to_string(), i);
        }

        if !columns.contains_key(self.schema.title_field()) {
            return Err(MergeError::SchemaMismatch {
                origin: self.source,
                field: self.schema.title_field().to_string(),
            });
        }

        let bootstrapped = self.schema.headers().len() - columns.len();
        tracing::debug!(
            source = %self.source,
            mapped = columns.len(),
            bootstrapped,
            "mapped columns onto schema"
        );
        Ok(columns)
    }

    fn build_record(&self, columns: &HashMap<String, usize>, row: &StringRecord) -> Record {
        let mut record = Record::new(self.source);
        for header in self.schema.headers() {
            let value = columns
                .get(header)
                .and_then(|&i| row.get(i))
                .unwrap_or_default();
            record.set(header, value);
        }
        record
    }
}

/// Writes records in schema column order plus a trailing `Source` column.
pub fn write_records<W: Write>(writer: W, schema: &Schema, records: &[Record]) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(writer);

    writer.write_record(
        schema
            .headers()
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(SOURCE_COLUMN)),
    )?;

    for record in records {
        let label = record.sources_label();
        writer.write_record(
            schema
                .headers()
                .iter()
                .map(|header| record.get(header))
                .chain(std::iter::once(label.as_str())),
        )?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes the dropped-records report. The header row is written even when
/// nothing was dropped.
pub fn write_dropped<W: Write>(writer: W, dropped: &[DroppedRecord]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(writer);
    writer.write_record(DROPPED_HEADERS)?;
    for row in dropped {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
