//! The unified record schema.
//!
//! Records from both exports are mapped onto the Web of Science column
//! layout. Scopus columns are renamed through a fixed table; columns the
//! schema does not know are dropped and missing ones are filled with empty
//! strings by the record source.

use crate::error::{MergeError, Result};
use crate::record::Source;
use std::collections::HashMap;

/// The Web of Science export header list, in output order.
pub const WOS_HEADERS: &[&str] = &[
    "Publication Type",
    "Authors",
    "Book Authors",
    "Book Editors",
    "Book Group Authors",
    "Author Full Names",
    "Book Author Full Names",
    "Group Authors",
    "Article Title",
    "Source Title",
    "Book Series Title",
    "Book Series Subtitle",
    "Language",
    "Document Type",
    "Conference Title",
    "Conference Date",
    "Conference Location",
    "Conference Sponsor",
    "Conference Host",
    "Author Keywords",
    "Keywords Plus",
    "Abstract",
    "Addresses",
    "Affiliations",
    "Reprint Addresses",
    "Email Addresses",
    "Researcher Ids",
    "ORCIDs",
    "Funding Orgs",
    "Funding Name Preferred",
    "Funding Text",
    "Cited References",
    "Cited Reference Count",
    "Times Cited, WoS Core",
    "Times Cited, All Databases",
    "180 Day Usage Count",
    "Since 2013 Usage Count",
    "Publisher",
    "Publisher City",
    "Publisher Address",
    "ISSN",
    "eISSN",
    "ISBN",
    "Journal Abbreviation",
    "Journal ISO Abbreviation",
    "Publication Date",
    "Publication Year",
    "Volume",
    "Issue",
    "Part Number",
    "Supplement",
    "Special Issue",
    "Meeting Abstract",
    "Start Page",
    "End Page",
    "Article Number",
    "DOI",
    "DOI Link",
    "Book DOI",
    "Early Access Date",
    "Number of Pages",
    "WoS Categories",
    "Web of Science Index",
    "Research Areas",
    "IDS Number",
    "Pubmed Id",
    "Open Access Designations",
    "Highly Cited Status",
    "Hot Paper Status",
    "Date of Export",
    "UT (Unique WOS ID)",
    "Web of Science Record",
];

/// Scopus column → Web of Science column.
pub const SCOPUS_RENAMES: &[(&str, &str)] = &[
    ("Authors", "Authors"),
    ("Author(s) ID", "Researcher Ids"),
    ("Author full names", "Author Full Names"),
    ("Title", "Article Title"),
    ("Source title", "Source Title"),
    ("Volume", "Volume"),
    ("Issue", "Issue"),
    ("Art. No.", "Article Number"),
    ("Page start", "Start Page"),
    ("Page end", "End Page"),
    ("DOI", "DOI"),
    ("Abstract", "Abstract"),
    ("Author Keywords", "Author Keywords"),
    ("Index Keywords", "Keywords Plus"),
    ("Authors with affiliations", "Affiliations"),
    ("Publisher", "Publisher"),
    ("Conference name", "Conference Title"),
    ("Conference date", "Conference Date"),
    ("Conference location", "Conference Location"),
    ("ISSN", "ISSN"),
    ("ISBN", "ISBN"),
    ("PubMed ID", "Pubmed Id"),
    ("Document Type", "Document Type"),
    ("Open Access", "Open Access Designations"),
    ("Funding Details", "Funding Orgs"),
    ("Funding Text", "Funding Text"),
    ("References", "Cited References"),
    ("Cited by", "Times Cited, WoS Core"),
    ("Language of Original Document", "Language"),
    ("Year", "Publication Year"),
];

/// Column layout and the semantic fields the engine reads.
///
/// # Examples
///
/// ```
/// use bibmerge::record::Source;
/// use bibmerge::schema::Schema;
///
/// let mut schema = Schema::new();
/// schema.set_rename(Source::B, "Titel", "Article Title");
/// assert_eq!(schema.rename(Source::B, "Titel"), "Article Title");
/// assert_eq!(schema.rename(Source::A, "Titel"), "Titel");
/// ```
#[derive(Debug, Clone)]
pub struct Schema {
    /// Output columns, in order
    pub(crate) headers: Vec<String>,
    /// Per-origin column renames applied while loading
    pub(crate) renames: HashMap<Source, HashMap<String, String>>,
    pub(crate) title: String,
    pub(crate) authors: String,
    pub(crate) year: String,
    pub(crate) journal: String,
    pub(crate) cited_references: String,
    /// Fields tried in order for the external identifier in the dropped report
    pub(crate) external_ids: Vec<String>,
    /// Affiliation fields whose trailing country tokens get canonicalized
    pub(crate) addresses: Vec<String>,
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema {
    /// Creates the Web of Science schema with the Scopus rename table.
    #[must_use]
    pub fn new() -> Self {
        let scopus = SCOPUS_RENAMES
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect();

        Self {
            headers: WOS_HEADERS.iter().map(|h| h.to_string()).collect(),
            renames: HashMap::from([(Source::B, scopus)]),
            title: "Article Title".to_string(),
            authors: "Authors".to_string(),
            year: "Publication Year".to_string(),
            journal: "Source Title".to_string(),
            cited_references: "Cited References".to_string(),
            external_ids: vec!["UT (Unique WOS ID)".to_string(), "DOI".to_string()],
            addresses: vec![
                "Addresses".to_string(),
                "Affiliations".to_string(),
                "Reprint Addresses".to_string(),
            ],
        }
    }

    /// Replaces the output header list.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::InvalidConfig`] if the title field is not among
    /// the headers, since no identity key could be computed.
    pub fn set_headers(&mut self, headers: Vec<String>) -> Result<&mut Self> {
        if !headers.contains(&self.title) {
            return Err(MergeError::InvalidConfig(format!(
                "header list does not contain the title field \"{}\"",
                self.title
            )));
        }
        self.headers = headers;
        Ok(self)
    }

    /// Adds or replaces a column rename for one origin.
    pub fn set_rename(&mut self, source: Source, from: &str, to: &str) -> &mut Self {
        self.renames
            .entry(source)
            .or_default()
            .insert(from.to_string(), to.to_string());
        self
    }

    /// Sets the field holding the article title.
    pub fn set_title_field(&mut self, field: &str) -> &mut Self {
        self.title = field.to_string();
        self
    }

    /// Sets the field holding the author list.
    pub fn set_authors_field(&mut self, field: &str) -> &mut Self {
        self.authors = field.to_string();
        self
    }

    /// Sets the field holding the publication year.
    pub fn set_year_field(&mut self, field: &str) -> &mut Self {
        self.year = field.to_string();
        self
    }

    /// Sets the field holding the journal name.
    pub fn set_journal_field(&mut self, field: &str) -> &mut Self {
        self.journal = field.to_string();
        self
    }

    /// Sets the field holding the `;`-joined cited references.
    pub fn set_cited_references_field(&mut self, field: &str) -> &mut Self {
        self.cited_references = field.to_string();
        self
    }

    /// Sets the fields tried in order for a record's external identifier.
    pub fn set_external_id_fields(&mut self, fields: Vec<String>) -> &mut Self {
        self.external_ids = fields;
        self
    }

    /// Sets the affiliation fields whose countries get canonicalized.
    pub fn set_address_fields(&mut self, fields: Vec<String>) -> &mut Self {
        self.addresses = fields;
        self
    }

    /// Maps a source column name onto its schema name.
    pub fn rename<'a>(&'a self, source: Source, header: &'a str) -> &'a str {
        self.renames
            .get(&source)
            .and_then(|table| table.get(header))
            .map_or(header, String::as_str)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn title_field(&self) -> &str {
        &self.title
    }

    pub fn authors_field(&self) -> &str {
        &self.authors
    }

    pub fn year_field(&self) -> &str {
        &self.year
    }

    pub fn journal_field(&self) -> &str {
        &self.journal
    }

    pub fn cited_references_field(&self) -> &str {
        &self.cited_references
    }

    pub fn address_fields(&self) -> &[String] {
        &self.addresses
    }

    pub fn external_id_fields(&self) -> &[String] {
        &self.external_ids
    }
}
