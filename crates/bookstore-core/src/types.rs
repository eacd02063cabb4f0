//! Row and query types shared by the catalog and the search engine.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publisher {
    pub id: i64,
    pub name: String,
}

/// A format a book can be published in (Hardcover, Kindle, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatType {
    pub id: i64,
    pub name: String,
    pub physical: bool,
}

/// A single review. Ratings are typically 1-5 but the core does not
/// range-check them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub book_id: i64,
    pub rating: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author_id: i64,
    pub publisher_id: i64,
}

/// A candidate row as returned by the gathering queries: the book joined
/// with its author and publisher names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: i64,
    pub title: String,
    pub author_first_name: String,
    pub author_last_name: String,
    pub publisher_name: String,
}

impl BookRecord {
    /// Author display name in "Last, First" form.
    pub fn author_name(&self) -> String {
        format!("{}, {}", self.author_last_name, self.author_first_name)
    }
}

/// A ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: i64,
    pub title: String,
    pub author_name: String,
    pub publisher_name: String,
    /// Mean review rating; `None` when the book has no reviews.
    pub average_rating: Option<f64>,
    pub review_count: usize,
}

/// A search request.
#[derive(Debug, Clone, PartialEq)]
pub struct BookQuery {
    /// Free text, matched case-insensitively against author last name
    /// (exact), publisher name (exact), and book title (substring).
    pub text: String,
    /// Restrict matching to the title substring check only.
    pub title_only: bool,
    /// Keep only books available in this format type.
    pub format_type_id: Option<i64>,
    /// Keep only books available in at least one format type with this
    /// physical flag.
    pub format_physical: Option<bool>,
}

impl BookQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            title_only: false,
            format_type_id: None,
            format_physical: None,
        }
    }

    pub fn title_only(mut self) -> Self {
        self.title_only = true;
        self
    }

    pub fn with_format_type(mut self, format_type_id: i64) -> Self {
        self.format_type_id = Some(format_type_id);
        self
    }

    pub fn with_physical(mut self, physical: bool) -> Self {
        self.format_physical = Some(physical);
        self
    }
}

/// An unvalidated book, as assembled from user input. Run [`validate`]
/// before handing it to the catalog.
///
/// [`validate`]: BookDraft::validate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookDraft {
    pub title: String,
    pub author_id: Option<i64>,
    pub publisher_id: Option<i64>,
}

impl BookDraft {
    pub fn new(title: impl Into<String>, author_id: i64, publisher_id: i64) -> Self {
        Self {
            title: title.into(),
            author_id: Some(author_id),
            publisher_id: Some(publisher_id),
        }
    }

    /// Precondition check: title present, author and publisher references
    /// set. Returns the validated view used for insertion.
    pub fn validate(&self) -> std::result::Result<ValidBook<'_>, ValidationError> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.author_id.is_none() {
            missing.push("author_id");
        }
        if self.publisher_id.is_none() {
            missing.push("publisher_id");
        }

        match (self.author_id, self.publisher_id) {
            (Some(author_id), Some(publisher_id)) if missing.is_empty() => Ok(ValidBook {
                title: self.title.trim(),
                author_id,
                publisher_id,
            }),
            _ => Err(ValidationError { missing }),
        }
    }
}

/// A draft that passed validation; all required references are present.
#[derive(Debug, Clone, Copy)]
pub struct ValidBook<'a> {
    pub title: &'a str,
    pub author_id: i64,
    pub publisher_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_with_all_fields_is_valid() {
        let draft = BookDraft::new("Romeo and Juliet", 1, 2);
        let valid = draft.validate().unwrap();
        assert_eq!(valid.title, "Romeo and Juliet");
        assert_eq!(valid.author_id, 1);
        assert_eq!(valid.publisher_id, 2);
    }

    #[test]
    fn draft_without_title_is_invalid() {
        let draft = BookDraft {
            title: "  ".into(),
            author_id: Some(1),
            publisher_id: Some(2),
        };
        let err = draft.validate().unwrap_err();
        assert_eq!(err.missing, vec!["title"]);
    }

    #[test]
    fn draft_without_references_reports_each_field() {
        let draft = BookDraft {
            title: "Romeo and Juliet".into(),
            author_id: None,
            publisher_id: None,
        };
        let err = draft.validate().unwrap_err();
        assert_eq!(err.missing, vec!["author_id", "publisher_id"]);
    }

    #[test]
    fn author_name_is_last_comma_first() {
        let record = BookRecord {
            id: 1,
            title: "Romeo and Juliet".into(),
            author_first_name: "William".into(),
            author_last_name: "Shakespeare".into(),
            publisher_name: "Pearson".into(),
        };
        assert_eq!(record.author_name(), "Shakespeare, William");
    }
}
