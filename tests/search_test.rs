//! Integration tests for cache search: scoring, filters, pagination and
//! tier selection.

use std::sync::Arc;

use biomodels_cache::search;
use biomodels_cache::{
    Biomodels, CacheQuery, CacheTier, DateRange, KeyValueTier, MatchField, ModelRecord,
    RecordTable,
};

fn table(records: impl IntoIterator<Item = ModelRecord>) -> RecordTable {
    records.into_iter().collect()
}

// ============================================================================
// Scoring
// ============================================================================

#[test]
fn title_and_synopsis_score_four() {
    let records = table([ModelRecord::new("BIOMD0000000001")
        .with_title("Glycolysis model")
        .with_synopsis("study of glycolysis pathway")]);

    let results = search::rank(&records, &CacheQuery::new("glycolysis"));
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].score, 4);

    let fields: Vec<MatchField> = results[0].matches.iter().map(|m| m.field).collect();
    assert_eq!(fields, vec![MatchField::Title, MatchField::Synopsis]);
}

#[test]
fn match_is_case_insensitive_substring() {
    let records = table([ModelRecord::new("BIOMD0000000002").with_title("MAPK Cascade")]);
    let results = search::rank(&records, &CacheQuery::new("mapk cas"));
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].matches[0].snippet, "MAPK Cascade");
}

#[test]
fn people_score_per_field() {
    let records = table([ModelRecord::new("BIOMD0000000003")
        .with_curator("Lukas Endler")
        .with_author("Endler L")]);
    let results = search::rank(&records, &CacheQuery::new("endler"));
    assert_eq!(results[0].score, 4);
}

#[test]
fn non_matching_records_are_dropped() {
    let records = table([
        ModelRecord::new("BIOMD0000000004").with_title("calcium"),
        ModelRecord::new("BIOMD0000000005").with_title("circadian clock"),
    ]);
    let results = search::rank(&records, &CacheQuery::new("clock"));
    let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["BIOMD0000000005"]);
}

// ============================================================================
// Filters
// ============================================================================

#[test]
fn journal_filter_keeps_exact_match() {
    let records = table([
        ModelRecord::new("A").with_title("cell cycle").with_journal("Nature"),
        ModelRecord::new("B").with_title("cell cycle").with_journal("Cell"),
    ]);
    let results = search::rank(&records, &CacheQuery::new("cell cycle").journal("Nature"));
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "A");
}

#[test]
fn date_range_is_inclusive() {
    let records = table([ModelRecord::new("A")
        .with_title("oscillator")
        .with_date("2020-06-15")]);

    let inside = CacheQuery::new("oscillator")
        .date_range(DateRange::parse("2019-01-01", "2020-12-31").unwrap());
    assert_eq!(search::rank(&records, &inside).len(), 1);

    let outside = CacheQuery::new("oscillator")
        .date_range(DateRange::parse("2021-01-01", "2021-12-31").unwrap());
    assert!(search::rank(&records, &outside).is_empty());

    let on_bound = CacheQuery::new("oscillator")
        .date_range(DateRange::parse("2020-06-15", "2020-06-15").unwrap());
    assert_eq!(search::rank(&records, &on_bound).len(), 1);
}

#[test]
fn author_filter_matches_curators_or_authors() {
    let records = table([
        ModelRecord::new("A").with_title("insulin").with_curator("Vijayalakshmi Chelliah"),
        ModelRecord::new("B").with_title("insulin").with_author("Sedaghat AR"),
        ModelRecord::new("C").with_title("insulin"),
    ]);
    let query = CacheQuery::new("insulin")
        .author("sedaghat ar")
        .author("Vijayalakshmi Chelliah");
    let ids: Vec<String> = search::rank(&records, &query)
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec!["A", "B"]);
}

#[test]
fn invalid_date_is_rejected() {
    assert!(DateRange::parse("2020-13-01", "2020-12-31").is_err());
}

// ============================================================================
// Ordering and pagination
// ============================================================================

#[test]
fn page_two_of_fifteen() {
    // Five records score 3 (title), the rest 1 (synopsis).
    let records = table((1..=15).map(|n| {
        let record = ModelRecord::new(format!("BIOMD{n:010}"));
        if n % 3 == 0 {
            record.with_title("apoptosis")
        } else {
            record.with_synopsis("apoptosis")
        }
    }));

    let results = search::search(&records, &CacheQuery::new("apoptosis").page(2, 10));
    assert_eq!(results.len(), 5);
    assert!(results.iter().all(|r| r.score == 1));

    // Ties keep insertion order among the synopsis-only records.
    let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "BIOMD0000000008",
            "BIOMD0000000010",
            "BIOMD0000000011",
            "BIOMD0000000013",
            "BIOMD0000000014",
        ]
    );
}

#[test]
fn json_query_with_flat_page_fields_is_paginated() {
    let records = table((1..=15).map(|n| {
        ModelRecord::new(format!("BIOMD{n:010}")).with_title("calcium oscillations")
    }));

    let query: CacheQuery =
        serde_json::from_str(r#"{"term": "calcium", "page": 2, "pageSize": 10}"#).unwrap();
    assert_eq!(search::search(&records, &query).len(), 5);

    // Without pageSize the default of ten applies.
    let query: CacheQuery = serde_json::from_str(r#"{"term": "calcium", "page": 1}"#).unwrap();
    assert_eq!(search::search(&records, &query).len(), 10);
}

#[test]
fn offset_past_end_is_empty() {
    let records = table([ModelRecord::new("A").with_title("glucose")]);
    let results = search::search(&records, &CacheQuery::new("glucose").offset(5));
    assert!(results.is_empty());
}

// ============================================================================
// Tier selection
// ============================================================================

#[tokio::test]
async fn first_tier_with_matches_answers() {
    let first = Arc::new(KeyValueTier::in_memory());
    let second = Arc::new(KeyValueTier::in_memory());
    first
        .write_batch(&table([ModelRecord::new("A").with_title("glucose")]))
        .await
        .unwrap();
    second
        .write_batch(&table([
            ModelRecord::new("B").with_title("calcium"),
            ModelRecord::new("C").with_title("calcium spikes"),
        ]))
        .await
        .unwrap();

    let client = Biomodels::builder()
        .tier(first)
        .tier(second)
        .build()
        .unwrap();

    // No match in the first tier: the second one answers.
    let hits = client.search(&CacheQuery::new("calcium")).await.unwrap();
    assert_eq!(hits.len(), 2);

    // A match in the first tier suppresses the second.
    let hits = client.search(&CacheQuery::new("c")).await.unwrap();
    let ids: Vec<&str> = hits.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["A"]);
}

#[tokio::test]
async fn no_match_anywhere_is_empty() {
    let client = Biomodels::builder().key_value().build().unwrap();
    let hits = client.search(&CacheQuery::new("nothing")).await.unwrap();
    assert!(hits.is_empty());
}
