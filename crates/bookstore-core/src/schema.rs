//! Catalog schema migrations, applied against `PRAGMA user_version`.

use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: i64 = 1;

struct Migration {
    version: i64,
    statements: &'static [&'static str],
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    statements: &[
        "CREATE TABLE IF NOT EXISTS authors (\
            id INTEGER PRIMARY KEY,\
            first_name TEXT NOT NULL,\
            last_name TEXT NOT NULL\
        );",
        "CREATE TABLE IF NOT EXISTS publishers (\
            id INTEGER PRIMARY KEY,\
            name TEXT NOT NULL\
        );",
        "CREATE TABLE IF NOT EXISTS book_format_types (\
            id INTEGER PRIMARY KEY,\
            name TEXT NOT NULL,\
            physical INTEGER NOT NULL\
        );",
        "CREATE TABLE IF NOT EXISTS books (\
            id INTEGER PRIMARY KEY,\
            title TEXT NOT NULL,\
            author_id INTEGER NOT NULL REFERENCES authors(id),\
            publisher_id INTEGER NOT NULL REFERENCES publishers(id)\
        );",
        "CREATE INDEX IF NOT EXISTS idx_books_author ON books(author_id);",
        "CREATE INDEX IF NOT EXISTS idx_books_publisher ON books(publisher_id);",
        "CREATE TABLE IF NOT EXISTS book_reviews (\
            id INTEGER PRIMARY KEY,\
            book_id INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,\
            rating INTEGER NOT NULL\
        );",
        "CREATE INDEX IF NOT EXISTS idx_book_reviews_book ON book_reviews(book_id);",
        "CREATE TABLE IF NOT EXISTS book_formats (\
            id INTEGER PRIMARY KEY,\
            book_id INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,\
            book_format_type_id INTEGER NOT NULL REFERENCES book_format_types(id)\
        );",
        "CREATE INDEX IF NOT EXISTS idx_book_formats_book ON book_formats(book_id);",
    ],
}];

/// Apply any migrations newer than the database's recorded version.
pub fn migrate(conn: &Connection) -> Result<()> {
    let current: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        for statement in migration.statements {
            conn.execute_batch(statement)?;
        }
        conn.pragma_update(None, "user_version", migration.version)?;
        tracing::debug!(version = migration.version, "applied catalog migration");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();

        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }
}
