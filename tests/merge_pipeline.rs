#![cfg(feature = "csv")]

use bibmerge::csv::{CsvRecordSource, write_dropped, write_records};
use bibmerge::merge::{IdentityKey, Merger, MergerConfig};
use bibmerge::record::{ReferenceView, Source};
use bibmerge::schema::Schema;
use pretty_assertions::assert_eq;
use std::collections::HashSet;

const WOS_EXPORT: &str = "\
Publication Type,Authors,Article Title,Source Title,Addresses,Cited References,Publication Year,DOI,UT (Unique WOS ID)
J,\"Smith, J.\",Deep Learning for X,J. Appl. Phys.,\"[Smith, J.] Tsinghua Univ, Beijing, Peoples R China\",\"Doe A, 2018, NATURE, V5; Roe B, 2017, SCIENCE, V3, DOI 10.1/x\",2020,10.1/dl,WOS:0001
J,\"Lee, K.\",Graph Methods,PHYS REV E,\"Seoul Natl Univ, Seoul, South Korea\",\"Kim H, 2015, PHYS REV E, V9\",2019,,WOS:0002
";

const SCOPUS_EXPORT: &str = "\
Authors,Title,Year,Source title,Authors with affiliations,References,DOI,EID
Smith J,Deep learning for X.,2020,Journal of Applied Physics,\"Smith, J., Tsinghua University, Beijing, China\",\"Doe A., A Title, Nature, 5, 2018; Poe C., Other Title, Cell, 9 (2), pp. 1-9, 2016\",10.1/dl,2-s2.0-1
Park S.,Quantum Things,2021,Nature,\"Park, S., KAIST, Daejeon, Korea\",\"Broken reference; Kim, H., Waves, (2015) Phys. Rev. E, 9, pp. 1-2\",10.1/qt,2-s2.0-2
,,2021,,,,,
";

fn load_both() -> Vec<bibmerge::Record> {
    let mut records = CsvRecordSource::new(Source::A).parse(WOS_EXPORT).unwrap();
    records.extend(CsvRecordSource::new(Source::B).parse(SCOPUS_EXPORT).unwrap());
    records
}

#[test]
fn merges_both_exports() {
    let records = load_both();
    assert_eq!(records.len(), 4);

    let outcome = Merger::new().merge(records);

    assert_eq!(outcome.records.len(), 3);
    assert!(outcome.dropped.is_empty());

    let merged = &outcome.records[0];
    assert_eq!(merged.get("Article Title"), "Deep Learning for X");
    assert_eq!(merged.sources_label(), "WoS Scopus");
    assert_eq!(merged.get("Source Title"), "J APPL PHYS");
    assert_eq!(
        merged.get("Addresses"),
        "[Smith, J.] Tsinghua Univ, Beijing, China"
    );
    assert_eq!(
        merged.get("Cited References"),
        "doe a, 2018, NATURE; poe c, 2016, CELL; roe b, 2017, SCIENCE"
    );

    let graph = &outcome.records[1];
    assert_eq!(graph.sources_label(), "WoS");
    assert_eq!(graph.get("Cited References"), "kim h, 2015, PHYS REV E");

    let quantum = &outcome.records[2];
    assert_eq!(quantum.sources_label(), "Scopus");
    assert_eq!(quantum.get("Affiliations"), "Park, S., KAIST, Daejeon, South Korea");
    assert_eq!(quantum.get("Cited References"), "kim h, 2015, PHYS REV E");
}

#[test]
fn summary_counts_both_origins() {
    let outcome = Merger::new().merge(load_both());
    let summary = &outcome.summary;

    assert_eq!(summary.input_counts[&Source::A], 2);
    assert_eq!(summary.input_counts[&Source::B], 2);
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
fn citation_view_preserves_original_text() {
    let merger = Merger::new().with_config(MergerConfig {
        run_in_parallel: true,
        reference_view: ReferenceView::Citation,
    });
    let outcome = merger.merge(load_both());

    assert_eq!(
        outcome.records[0].get("Cited References"),
        "Doe A, 2018, NATURE, V5; \
         Doe A., A Title, Nature, 5, 2018; \
         Poe C., Other Title, Cell, 9 (2), pp. 1-9, 2016; \
         Roe B, 2017, SCIENCE, V3, DOI 10.1/x"
    );
    assert_eq!(
        outcome.records[2].get("Cited References"),
        "Broken reference; Kim, H., Waves, (2015) Phys. Rev. E, 9, pp. 1-2"
    );
}

#[test]
fn identity_keys_are_unique_in_output() {
    let schema = Schema::new();
    let mut records = load_both();
    records.extend(load_both());

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
fn writes_merged_output_and_report() {
    let schema = Schema::new();
    let outcome = Merger::new().merge(load_both());

    let mut out = Vec::new();
    write_records(&mut out, &schema, &outcome.records).unwrap();
    let text = String::from_utf8(out).unwrap();
    let mut lines = text.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("Publication Type,Authors,"));
    assert!(header.ends_with(",Web of Science Record,Source"));

    let reread = CsvRecordSource::new(Source::A).parse(&text).unwrap();
    assert_eq!(reread.len(), 3);
    assert_eq!(reread[0].get("Article Title"), "Deep Learning for X");
    assert_eq!(
        reread[0].get("Cited References"),
        outcome.records[0].get("Cited References")
    );

    let mut report = Vec::new();
    write_dropped(&mut report, &outcome.dropped).unwrap();
    assert_eq!(
        String::from_utf8(report).unwrap(),
        "Title,Source,External ID,Identity Key,Authors,Year\n"
    );
}
