//! Search engine over a single record set.
//!
//! Scoring is a fixed heuristic over case-insensitive substring matches:
//!
//! | field               | points            |
//! |---------------------|-------------------|
//! | `title`             | 3                 |
//! | each curator        | 2                 |
//! | each author         | 2                 |
//! | `synopsis`          | 1                 |
//! | `name`              | 0 (still a match) |
//!
//! Empty fields never match. Records with no match are dropped before
//! filters run. Survivors are
//! sorted by descending score with a stable sort, so ties keep the source
//! set's insertion order.

use crate::types::{CacheQuery, Match, MatchField, ModelRecord, SearchFilters, SearchResult};

/// Score, filter and rank `records` against `query`, without pagination.
pub fn rank<'a, I>(records: I, query: &CacheQuery) -> Vec<SearchResult>
where
    I: IntoIterator<Item = &'a ModelRecord>,
{
    let needle = query.term.to_lowercase();
    let mut results: Vec<SearchResult> = records
        .into_iter()
        .filter_map(|record| score(record, &needle))
        .filter(|result| passes_filters(&result.metadata, &query.filters))
        .collect();

    // `sort_by` is stable.
    results.sort_by(|a, b| b.score.cmp(&a.score));
    results
}

/// [`rank`] followed by the query's pagination.
pub fn search<'a, I>(records: I, query: &CacheQuery) -> Vec<SearchResult>
where
    I: IntoIterator<Item = &'a ModelRecord>,
{
    query.pagination.apply(rank(records, query))
}

fn score(record: &ModelRecord, needle: &str) -> Option<SearchResult> {
    let mut matches = Vec::new();
    let mut hit = |field: MatchField, text: &str| {
        if !text.is_empty() && text.to_lowercase().contains(needle) {
            matches.push(Match {
                field,
                snippet: text.to_string(),
            });
        }
    };

    hit(MatchField::Title, &record.title);
    for curator in &record.curators {
        hit(MatchField::Curators, curator);
    }
    for author in &record.authors {
        hit(MatchField::PublicationAuthors, author);
    }
    hit(MatchField::Synopsis, &record.synopsis);
    hit(MatchField::Name, &record.name);

    if matches.is_empty() {
        return None;
    }
    Some(SearchResult {
        id: record.id.clone(),
        score: matches.iter().map(|m| m.field.weight()).sum(),
        matches,
        metadata: record.clone(),
    })
}

fn passes_filters(record: &ModelRecord, filters: &SearchFilters) -> bool {
    if !filters.authors.is_empty() {
        let wanted = |person: &str| {
            let person = person.to_lowercase();
            filters
                .authors
                .iter()
                .any(|name| name.to_lowercase() == person)
        };
        if !record.people().any(wanted) {
            return false;
        }
    }

    if !filters.journals.is_empty() && !filters.journals.iter().any(|j| *j == record.journal) {
        return false;
    }

    if let Some(range) = &filters.date_range {
        match record.calendar_date() {
            Some(date) if range.contains(date) => {}
            _ => return false,
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DateRange;

    fn glycolysis() -> ModelRecord {
        ModelRecord::new("BIOMD0000000001")
            .with_title("Glycolysis model")
            .with_synopsis("study of glycolysis pathway")
    }

    #[test]
    fn title_and_synopsis_score() {
        let results = rank([&glycolysis()], &CacheQuery::new("glycolysis"));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 4);
        let fields: Vec<_> = results[0].matches.iter().map(|m| m.field).collect();
        assert_eq!(fields, vec![MatchField::Title, MatchField::Synopsis]);
    }

    #[test]
    fn every_matching_person_counts() {
        let record = ModelRecord::new("BIOMD0000000002")
            .with_curator("Ann Smith")
            .with_curator("Bob Smithers")
            .with_author("Carol Jones")
            .with_author("Dan Smith");
        let results = rank([&record], &CacheQuery::new("SMITH"));
        assert_eq!(results[0].score, 6);
        assert_eq!(results[0].matches.len(), 3);
    }

    #[test]
    fn name_only_match_scores_zero_but_is_kept() {
        let record = ModelRecord::new("BIOMD0000000003").with_name("Repressilator");
        let results = rank([&record], &CacheQuery::new("repress"));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 0);
        assert_eq!(results[0].matches[0].field, MatchField::Name);
    }

    #[test]
    fn no_match_is_excluded() {
        assert!(rank([&glycolysis()], &CacheQuery::new("insulin")).is_empty());
    }

    #[test]
    fn journal_filter_is_exact() {
        let nature = glycolysis().with_journal("Nature");
        let cell = ModelRecord::new("BIOMD0000000002")
            .with_title("glycolysis in cells")
            .with_journal("Cell");
        let records = [nature, cell];

        let results = rank(&records, &CacheQuery::new("glycolysis").journal("Nature"));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "BIOMD0000000001");

        let results = rank(&records, &CacheQuery::new("glycolysis").journal("nature"));
        assert!(results.is_empty());
    }

    #[test]
    fn author_filter_ignores_case_and_checks_curators() {
        let record = glycolysis()
            .with_curator("Jane Doe")
            .with_author("John Roe");
        let records = [record];

        assert_eq!(
            rank(&records, &CacheQuery::new("glycolysis").author("jane doe")).len(),
            1
        );
        assert_eq!(
            rank(&records, &CacheQuery::new("glycolysis").author("JOHN ROE")).len(),
            1
        );
        assert!(rank(&records, &CacheQuery::new("glycolysis").author("Jane")).is_empty());
    }

    #[test]
    fn date_range_is_inclusive() {
        let records = [glycolysis().with_date("2020-06-15")];
        let inside = DateRange::parse("2019-01-01", "2020-12-31").unwrap();
        let outside = DateRange::parse("2021-01-01", "2021-12-31").unwrap();
        let edge = DateRange::parse("2020-06-15", "2020-06-15").unwrap();

        assert_eq!(rank(&records, &CacheQuery::new("glycolysis").date_range(inside)).len(), 1);
        assert!(rank(&records, &CacheQuery::new("glycolysis").date_range(outside)).is_empty());
        assert_eq!(rank(&records, &CacheQuery::new("glycolysis").date_range(edge)).len(), 1);
    }

    #[test]
    fn missing_or_bad_date_fails_range_filter() {
        let records = [
            glycolysis(),
            ModelRecord::new("BIOMD0000000009")
                .with_title("glycolysis")
                .with_date("someday"),
        ];
        let range = DateRange::parse("1900-01-01", "2100-01-01").unwrap();
        assert!(rank(&records, &CacheQuery::new("glycolysis").date_range(range)).is_empty());
    }

    #[test]
    fn ties_keep_insertion_order() {
        let records: Vec<_> = (1..=4)
            .map(|n| ModelRecord::new(format!("BIOMD000000000{n}")).with_synopsis("kinase"))
            .chain(std::iter::once(
                ModelRecord::new("BIOMD0000000005").with_title("kinase cascade"),
            ))
            .collect();
        let ids: Vec<_> = rank(&records, &CacheQuery::new("kinase"))
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(
            ids,
            vec![
                "BIOMD0000000005",
                "BIOMD0000000001",
                "BIOMD0000000002",
                "BIOMD0000000003",
                "BIOMD0000000004"
            ]
        );
    }

    #[test]
    fn second_page_of_fifteen() {
        let records: Vec<_> = (1..=15)
            .map(|n| ModelRecord::new(format!("BIOMD{n:010}")).with_title("calcium"))
            .collect();
        let results = search(&records, &CacheQuery::new("calcium").page(2, 10));
        let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "BIOMD0000000011",
                "BIOMD0000000012",
                "BIOMD0000000013",
                "BIOMD0000000014",
                "BIOMD0000000015"
            ]
        );
        assert!(search(&records, &CacheQuery::new("calcium").page(3, 10)).is_empty());
        assert!(search(&records, &CacheQuery::new("calcium").offset(40)).is_empty());
    }
}
