//! Books repository for database operations

use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        author::AuthorRef,
        book::{book_url, Book, BookData, BookShort},
    },
};

/// Shared projection for book lists: the book plus its author's names
const BOOK_SHORT_SELECT: &str = r#"
    SELECT b.id, b.title, b.author_id, a.first_name, a.last_name
    FROM books b
    LEFT JOIN authors a ON a.id = b.author_id
"#;

fn book_short_from_row(row: &PgRow) -> BookShort {
    let id: i32 = row.get("id");
    let author_id: Option<i32> = row.get("author_id");
    let first_name: Option<String> = row.get("first_name");
    let last_name: Option<String> = row.get("last_name");

    BookShort {
        id,
        title: row.get("title"),
        author: author_id.map(|author_id| {
            AuthorRef::new(
                author_id,
                first_name.as_deref().unwrap_or_default(),
                last_name.as_deref().unwrap_or_default(),
            )
        }),
        url: book_url(id),
    }
}

/// Result of a book insert or update. A concurrent writer can claim the ISBN
/// between the form check and the write; that comes back as `IsbnTaken`.
#[derive(Debug)]
pub enum BookWrite {
    Saved(Book),
    IsbnTaken,
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    // =========================================================================
    // READ
    // =========================================================================

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            "SELECT id, title, summary, isbn, author_id FROM books WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    pub async fn exists(&self, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// One page of books ordered by title
    pub async fn list(&self, offset: i64, limit: i64) -> AppResult<Vec<BookShort>> {
        let query = format!("{} ORDER BY b.title, b.id LIMIT $1 OFFSET $2", BOOK_SHORT_SELECT);

        let rows = sqlx::query(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(book_short_from_row).collect())
    }

    /// All books by an author, ordered by title
    pub async fn list_by_author(&self, author_id: i32) -> AppResult<Vec<BookShort>> {
        let query = format!("{} WHERE b.author_id = $1 ORDER BY b.title, b.id", BOOK_SHORT_SELECT);

        let rows = sqlx::query(&query)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(book_short_from_row).collect())
    }

    /// Check whether another book already uses this ISBN
    pub async fn isbn_exists(&self, isbn: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1 AND ($2::int IS NULL OR id != $2))",
        )
        .bind(isbn)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn count_instances(&self, id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE book_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // =========================================================================
    // WRITE
    // =========================================================================

    /// Insert a book with its genre links in one transaction
    pub async fn create(&self, data: &BookData) -> AppResult<BookWrite> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, summary, isbn, author_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, summary, isbn, author_id
            "#,
        )
        .bind(&data.title)
        .bind(&data.summary)
        .bind(&data.isbn)
        .bind(data.author_id)
        .fetch_one(&mut *tx)
        .await;

        let book = match inserted {
            Ok(book) => book,
            Err(e) if is_unique_violation(&e) => return Ok(BookWrite::IsbnTaken),
            Err(e) => return Err(e.into()),
        };

        sqlx::query(
            "INSERT INTO book_genres (book_id, genre_id) SELECT $1, UNNEST($2::int[])",
        )
        .bind(book.id)
        .bind(&data.genre_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(BookWrite::Saved(book))
    }

    /// Update a book and replace its genre links
    pub async fn update(&self, id: i32, data: &BookData) -> AppResult<BookWrite> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $1, summary = $2, isbn = $3, author_id = $4
            WHERE id = $5
            RETURNING id, title, summary, isbn, author_id
            "#,
        )
        .bind(&data.title)
        .bind(&data.summary)
        .bind(&data.isbn)
        .bind(data.author_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await;

        let book = match updated {
            Ok(Some(book)) => book,
            Ok(None) => return Err(AppError::NotFound(format!("Book with id {} not found", id))),
            Err(e) if is_unique_violation(&e) => return Ok(BookWrite::IsbnTaken),
            Err(e) => return Err(e.into()),
        };

        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO book_genres (book_id, genre_id) SELECT $1, UNNEST($2::int[])",
        )
        .bind(id)
        .bind(&data.genre_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(BookWrite::Saved(book))
    }

    /// Delete a book. Copies restrict the delete at the database level too.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                let restricted = matches!(
                    &e,
                    sqlx::Error::Database(db) if db.is_foreign_key_violation()
                );
                if restricted {
                    AppError::Conflict(format!("Book with id {} still has copies", id))
                } else {
                    AppError::Database(e)
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{borrow::Cow, error::Error as StdError, fmt};

    use sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    /// Constraint violation as the Postgres driver reports it
    #[derive(Debug)]
    struct Violation {
        unique: bool,
    }

    impl fmt::Display for Violation {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "constraint violation")
        }
    }

    impl StdError for Violation {}

    impl DatabaseError for Violation {
        fn message(&self) -> &str {
            "constraint violation"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(if self.unique { "23505" } else { "23503" }))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            if self.unique {
                ErrorKind::UniqueViolation
            } else {
                ErrorKind::ForeignKeyViolation
            }
        }
    }

    #[test]
    fn duplicate_isbn_on_write_is_recognised() {
        let duplicate = sqlx::Error::Database(Box::new(Violation { unique: true }));
        assert!(is_unique_violation(&duplicate));
    }

    #[test]
    fn other_database_errors_are_not_duplicates() {
        let restricted = sqlx::Error::Database(Box::new(Violation { unique: false }));
        assert!(!is_unique_violation(&restricted));
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(!is_unique_violation(&sqlx::Error::PoolTimedOut));
    }
}
