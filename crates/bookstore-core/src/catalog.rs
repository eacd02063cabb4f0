//! SQLite catalog wrapper.
//!
//! Provides a high-level interface for querying the book catalog and the
//! `BookSource` trait the search engine consumes.

use std::path::Path;

use rusqlite::{params, Connection, OpenFlags};

use crate::error::Result;
use crate::schema;
use crate::search::{BOOKS_BY_AUTHOR_SQL, BOOKS_BY_PUBLISHER_SQL, BOOKS_BY_TITLE_SQL};
use crate::types::{Author, Book, BookDraft, BookRecord, FormatType, Publisher, Review};

/// Data access the search engine depends on. Implemented by [`Catalog`];
/// tests may substitute a fixed-data source.
pub trait BookSource {
    /// Books whose author's last name equals `last_name`, case-insensitively.
    fn books_by_author_last_name(&self, last_name: &str) -> Result<Vec<BookRecord>>;

    /// Books whose publisher's name equals `name`, case-insensitively.
    fn books_by_publisher_name(&self, name: &str) -> Result<Vec<BookRecord>>;

    /// Books whose title contains `fragment`, case-insensitively.
    fn books_by_title(&self, fragment: &str) -> Result<Vec<BookRecord>>;

    /// Ratings of the book's reviews, in store order.
    fn ratings_for(&self, book_id: i64) -> Result<Vec<i64>>;

    /// Format types the book is available in.
    fn format_types_for(&self, book_id: i64) -> Result<Vec<FormatType>>;
}

/// A SQLite connection to a book catalog.
pub struct Catalog {
    conn: Connection,
}

impl Catalog {
    /// Open (or create) a catalog file, applying pending migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        schema::migrate(&conn)?;
        Ok(Self { conn })
    }

    /// Open an existing catalog read-only, tuned for queries.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.execute_batch(
            "PRAGMA cache_size = -64000; -- 64MB
             PRAGMA temp_store = MEMORY;",
        )?;

        Ok(Self { conn })
    }

    /// A fresh, fully migrated in-memory catalog.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", true)?;
        schema::migrate(&conn)?;
        Ok(Self { conn })
    }

    pub fn add_author(&self, first_name: &str, last_name: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO authors (first_name, last_name) VALUES (?1, ?2)",
            params![first_name, last_name],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn add_publisher(&self, name: &str) -> Result<i64> {
        self.conn
            .execute("INSERT INTO publishers (name) VALUES (?1)", params![name])?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn add_format_type(&self, name: &str, physical: bool) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO book_format_types (name, physical) VALUES (?1, ?2)",
            params![name, physical],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Validate and insert a book draft, returning the new book id.
    pub fn add_book(&self, draft: &BookDraft) -> Result<i64> {
        let book = draft.validate()?;
        self.conn.execute(
            "INSERT INTO books (title, author_id, publisher_id) VALUES (?1, ?2, ?3)",
            params![book.title, book.author_id, book.publisher_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn add_review(&self, book_id: i64, rating: i64) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO book_reviews (book_id, rating) VALUES (?1, ?2)",
            params![book_id, rating],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Mark a book as available in a format type.
    pub fn add_format(&self, book_id: i64, format_type_id: i64) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO book_formats (book_id, book_format_type_id) VALUES (?1, ?2)",
            params![book_id, format_type_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Look up a book by id.
    pub fn book(&self, id: i64) -> Result<Option<Book>> {
        let result = self.conn.query_row(
            "SELECT id, title, author_id, publisher_id FROM books WHERE id = ?1",
            [id],
            |row| {
                Ok(Book {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    author_id: row.get(2)?,
                    publisher_id: row.get(3)?,
                })
            },
        );

        match result {
            Ok(book) => Ok(Some(book)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Look up a format type by name, case-insensitively.
    pub fn format_type_by_name(&self, name: &str) -> Result<Option<FormatType>> {
        let result = self.conn.query_row(
            "SELECT id, name, physical FROM book_format_types WHERE lower(name) = lower(?1)",
            [name],
            |row| {
                Ok(FormatType {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    physical: row.get(2)?,
                })
            },
        );

        match result {
            Ok(format_type) => Ok(Some(format_type)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn authors(&self) -> Result<Vec<Author>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, first_name, last_name FROM authors ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Author {
                id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
            })
        })?;
        rows.collect::<std::result::Result<_, _>>().map_err(Into::into)
    }

    pub fn publishers(&self) -> Result<Vec<Publisher>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, name FROM publishers ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Publisher {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        rows.collect::<std::result::Result<_, _>>().map_err(Into::into)
    }

    pub fn format_types(&self) -> Result<Vec<FormatType>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, name, physical FROM book_format_types ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(FormatType {
                id: row.get(0)?,
                name: row.get(1)?,
                physical: row.get(2)?,
            })
        })?;
        rows.collect::<std::result::Result<_, _>>().map_err(Into::into)
    }

    pub fn reviews_for(&self, book_id: i64) -> Result<Vec<Review>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, book_id, rating FROM book_reviews WHERE book_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([book_id], |row| {
            Ok(Review {
                id: row.get(0)?,
                book_id: row.get(1)?,
                rating: row.get(2)?,
            })
        })?;
        rows.collect::<std::result::Result<_, _>>().map_err(Into::into)
    }

    /// Number of books in the catalog.
    pub fn book_count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Populate an empty catalog with the canonical sample data: two
    /// publishers, two authors, three format types, and a few reviewed
    /// books to search against.
    pub fn seed(&self) -> Result<()> {
        let simon = self.add_publisher("Simon & Schuster Inc")?;
        let pearson = self.add_publisher("Pearson")?;

        let king = self.add_author("Stephen", "King")?;
        let shakespeare = self.add_author("William", "Shakespeare")?;

        let hardcover = self.add_format_type("Hardcover", true)?;
        let softcover = self.add_format_type("Softcover", true)?;
        let kindle = self.add_format_type("Kindle", false)?;

        let shining = self.add_book(&BookDraft::new("The Shining", king, simon))?;
        self.add_format(shining, hardcover)?;
        self.add_format(shining, kindle)?;
        for rating in [5, 4, 5] {
            self.add_review(shining, rating)?;
        }

        let carrie = self.add_book(&BookDraft::new("Carrie", king, simon))?;
        self.add_format(carrie, softcover)?;
        for rating in [3, 5, 4] {
            self.add_review(carrie, rating)?;
        }

        let romeo = self.add_book(&BookDraft::new("Romeo and Juliet", shakespeare, pearson))?;
        self.add_format(romeo, hardcover)?;
        self.add_format(romeo, kindle)?;
        for rating in [4, 4] {
            self.add_review(romeo, rating)?;
        }

        // Left unreviewed on purpose; exercises the no-rating ranking path.
        let lear = self.add_book(&BookDraft::new("King Lear", shakespeare, pearson))?;
        self.add_format(lear, softcover)?;

        tracing::debug!(books = 4, "seeded catalog");
        Ok(())
    }

    fn query_book_records(&self, sql: &str, param: &str) -> Result<Vec<BookRecord>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let rows = stmt.query_map([param], |row| {
            Ok(BookRecord {
                id: row.get(0)?,
                title: row.get(1)?,
                author_first_name: row.get(2)?,
                author_last_name: row.get(3)?,
                publisher_name: row.get(4)?,
            })
        })?;
        rows.collect::<std::result::Result<_, _>>().map_err(Into::into)
    }
}

impl BookSource for Catalog {
    fn books_by_author_last_name(&self, last_name: &str) -> Result<Vec<BookRecord>> {
        self.query_book_records(BOOKS_BY_AUTHOR_SQL, last_name)
    }

    fn books_by_publisher_name(&self, name: &str) -> Result<Vec<BookRecord>> {
        self.query_book_records(BOOKS_BY_PUBLISHER_SQL, name)
    }

    fn books_by_title(&self, fragment: &str) -> Result<Vec<BookRecord>> {
        self.query_book_records(BOOKS_BY_TITLE_SQL, fragment)
    }

    fn ratings_for(&self, book_id: i64) -> Result<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT rating FROM book_reviews WHERE book_id = ?1 ORDER BY id")?;
        let rows = stmt.query_map([book_id], |row| row.get(0))?;
        rows.collect::<std::result::Result<_, _>>().map_err(Into::into)
    }

    fn format_types_for(&self, book_id: i64) -> Result<Vec<FormatType>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT ft.id, ft.name, ft.physical
             FROM book_format_types ft
             JOIN book_formats bf ON bf.book_format_type_id = ft.id
             WHERE bf.book_id = ?1
             ORDER BY ft.id",
        )?;
        let rows = stmt.query_map([book_id], |row| {
            Ok(FormatType {
                id: row.get(0)?,
                name: row.get(1)?,
                physical: row.get(2)?,
            })
        })?;
        rows.collect::<std::result::Result<_, _>>().map_err(Into::into)
    }
}
