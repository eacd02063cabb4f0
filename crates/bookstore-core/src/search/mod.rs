//! Candidate gathering, filtering, and ranking.
//!
//! The catalog supplies joined rows; deduplication, format filtering and
//! rating math happen in Rust so the ordering rules stay in one place.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::catalog::BookSource;
use crate::error::Result;
use crate::types::{BookQuery, BookRecord, SearchHit};

/// SQL for candidate rows matched by author last name (case-insensitive
/// exact). `lower()` keeps matching case-insensitive regardless of the
/// connection's collation setup. `ORDER BY b.id` pins store iteration
/// order so tie-breaks are deterministic.
pub const BOOKS_BY_AUTHOR_SQL: &str = r#"
    SELECT
        b.id,
        b.title,
        a.first_name,
        a.last_name,
        p.name
    FROM books b
    JOIN authors a ON a.id = b.author_id
    JOIN publishers p ON p.id = b.publisher_id
    WHERE lower(a.last_name) = lower(?1)
    ORDER BY b.id
"#;

/// SQL for candidate rows matched by publisher name (case-insensitive
/// exact).
pub const BOOKS_BY_PUBLISHER_SQL: &str = r#"
    SELECT
        b.id,
        b.title,
        a.first_name,
        a.last_name,
        p.name
    FROM books b
    JOIN authors a ON a.id = b.author_id
    JOIN publishers p ON p.id = b.publisher_id
    WHERE lower(p.name) = lower(?1)
    ORDER BY b.id
"#;

/// SQL for candidate rows matched by title substring (case-insensitive).
pub const BOOKS_BY_TITLE_SQL: &str = r#"
    SELECT
        b.id,
        b.title,
        a.first_name,
        a.last_name,
        p.name
    FROM books b
    JOIN authors a ON a.id = b.author_id
    JOIN publishers p ON p.id = b.publisher_id
    WHERE lower(b.title) LIKE '%' || lower(?1) || '%'
    ORDER BY b.id
"#;

/// Arithmetic mean of a book's review ratings. `None` for a book with no
/// reviews; callers must not coerce that to `0.0`.
pub fn average_rating(ratings: &[i64]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let sum: i64 = ratings.iter().sum();
    Some(sum as f64 / ratings.len() as f64)
}

/// Search the catalog for books matching `query`, ranked by descending
/// average rating.
///
/// Candidates are gathered as author-match, then publisher-match, then
/// title-match (title-match alone in title-only mode), deduplicated by
/// book id keeping the first occurrence. Format filters narrow the set
/// independently (AND). The final sort is stable, so books with equal
/// averages keep candidate-gathering order, and unreviewed books sort
/// after every rated book.
pub fn search(source: &dyn BookSource, query: &BookQuery) -> Result<Vec<SearchHit>> {
    let text = query.text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let mut candidates = if query.title_only {
        source.books_by_title(text)?
    } else {
        let mut gathered = source.books_by_author_last_name(text)?;
        gathered.extend(source.books_by_publisher_name(text)?);
        gathered.extend(source.books_by_title(text)?);
        gathered
    };

    // A book matching several criteria appears once.
    let mut seen = HashSet::new();
    candidates.retain(|record| seen.insert(record.id));

    if let Some(format_type_id) = query.format_type_id {
        candidates = filter_by_format_type(source, candidates, format_type_id)?;
    }
    if let Some(physical) = query.format_physical {
        candidates = filter_by_physical(source, candidates, physical)?;
    }

    let mut hits = Vec::with_capacity(candidates.len());
    for record in candidates {
        let ratings = source.ratings_for(record.id)?;
        hits.push(SearchHit {
            id: record.id,
            author_name: record.author_name(),
            title: record.title,
            publisher_name: record.publisher_name,
            average_rating: average_rating(&ratings),
            review_count: ratings.len(),
        });
    }

    hits.sort_by(|a, b| compare_average_ratings(a.average_rating, b.average_rating));

    tracing::debug!(query = %text, hits = hits.len(), "search complete");
    Ok(hits)
}

/// Descending by rating; `None` (no reviews) after every rated value.
fn compare_average_ratings(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn filter_by_format_type(
    source: &dyn BookSource,
    candidates: Vec<BookRecord>,
    format_type_id: i64,
) -> Result<Vec<BookRecord>> {
    let mut kept = Vec::with_capacity(candidates.len());
    for record in candidates {
        let formats = source.format_types_for(record.id)?;
        if formats.iter().any(|ft| ft.id == format_type_id) {
            kept.push(record);
        }
    }
    Ok(kept)
}

fn filter_by_physical(
    source: &dyn BookSource,
    candidates: Vec<BookRecord>,
    physical: bool,
) -> Result<Vec<BookRecord>> {
    let mut kept = Vec::with_capacity(candidates.len());
    for record in candidates {
        let formats = source.format_types_for(record.id)?;
        if formats.iter().any(|ft| ft.physical == physical) {
            kept.push(record);
        }
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FormatType;

    #[test]
    fn average_of_three_ratings() {
        assert_eq!(average_rating(&[3, 5, 4]), Some(4.0));
    }

    #[test]
    fn average_of_no_ratings_is_none() {
        assert_eq!(average_rating(&[]), None);
    }

    #[test]
    fn rated_books_order_descending() {
        assert_eq!(
            compare_average_ratings(Some(4.0), Some(2.0)),
            Ordering::Less
        );
        assert_eq!(
            compare_average_ratings(Some(2.0), Some(4.0)),
            Ordering::Greater
        );
        assert_eq!(
            compare_average_ratings(Some(3.0), Some(3.0)),
            Ordering::Equal
        );
    }

    #[test]
    fn unrated_sorts_after_any_rated_value() {
        // A low rated book still outranks an unreviewed one.
        assert_eq!(compare_average_ratings(Some(1.0), None), Ordering::Less);
        assert_eq!(compare_average_ratings(None, Some(1.0)), Ordering::Greater);
        assert_eq!(compare_average_ratings(None, None), Ordering::Equal);
    }

    /// Fixed-data source for exercising the search flow without SQLite.
    struct StubSource {
        author_rows: Vec<BookRecord>,
        publisher_rows: Vec<BookRecord>,
        title_rows: Vec<BookRecord>,
        formats: Vec<(i64, FormatType)>,
    }

    impl BookSource for StubSource {
        fn books_by_author_last_name(&self, _last_name: &str) -> Result<Vec<BookRecord>> {
            Ok(self.author_rows.clone())
        }

        fn books_by_publisher_name(&self, _name: &str) -> Result<Vec<BookRecord>> {
            Ok(self.publisher_rows.clone())
        }

        fn books_by_title(&self, _fragment: &str) -> Result<Vec<BookRecord>> {
            Ok(self.title_rows.clone())
        }

        fn ratings_for(&self, _book_id: i64) -> Result<Vec<i64>> {
            Ok(Vec::new())
        }

        fn format_types_for(&self, book_id: i64) -> Result<Vec<FormatType>> {
            Ok(self
                .formats
                .iter()
                .filter(|(id, _)| *id == book_id)
                .map(|(_, ft)| ft.clone())
                .collect())
        }
    }

    fn record(id: i64, title: &str) -> BookRecord {
        BookRecord {
            id,
            title: title.into(),
            author_first_name: "Stephen".into(),
            author_last_name: "King".into(),
            publisher_name: "Pearson".into(),
        }
    }

    #[test]
    fn candidates_deduplicate_keeping_first_match_order() {
        let source = StubSource {
            author_rows: vec![record(1, "The Shining"), record(2, "King Lear")],
            publisher_rows: vec![record(3, "Carrie")],
            title_rows: vec![record(2, "King Lear"), record(4, "Kingmaker")],
            formats: vec![],
        };

        let hits = search(&source, &BookQuery::new("king")).unwrap();
        let ids: Vec<i64> = hits.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn title_only_skips_author_and_publisher_rows() {
        let source = StubSource {
            author_rows: vec![record(1, "The Shining")],
            publisher_rows: vec![record(2, "Carrie")],
            title_rows: vec![record(3, "Kingmaker")],
            formats: vec![],
        };

        let hits = search(&source, &BookQuery::new("king").title_only()).unwrap();
        let ids: Vec<i64> = hits.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn blank_query_returns_nothing() {
        let source = StubSource {
            author_rows: vec![record(1, "The Shining")],
            publisher_rows: vec![],
            title_rows: vec![],
            formats: vec![],
        };

        assert!(search(&source, &BookQuery::new("")).unwrap().is_empty());
        assert!(search(&source, &BookQuery::new("   ")).unwrap().is_empty());
    }
}
