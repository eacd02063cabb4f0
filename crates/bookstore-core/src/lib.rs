//! Bookstore Catalog Core
//!
//! Search and ranking engine over a SQLite catalog of books, authors,
//! publishers, format types and reviews. Matching and rating math run in
//! Rust; the catalog only supplies rows.

pub mod catalog;
pub mod error;
pub mod schema;
pub mod search;
pub mod types;

pub use catalog::{BookSource, Catalog};
pub use error::{Error, Result, ValidationError};
pub use types::{
    Author, Book, BookDraft, BookQuery, BookRecord, FormatType, Publisher, Review, SearchHit,
};
