//! Book instances (copies) repository

use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book_instance::{BookInstance, InstanceSummary, LoanedCopy},
        enums::LoanStatus,
    },
};

#[derive(Clone)]
pub struct BookInstancesRepository {
    pool: Pool<Postgres>,
}

impl BookInstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_with_status(&self, status: LoanStatus) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Copies of a book ordered by due date
    pub async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>> {
        let instances = sqlx::query_as::<_, BookInstance>(
            r#"
            SELECT id, book_id, imprint, due_back, borrower_id, status
            FROM book_instances
            WHERE book_id = $1
            ORDER BY due_back, id
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(instances)
    }

    /// Copy with its book title
    pub async fn get_summary(&self, id: Uuid) -> AppResult<InstanceSummary> {
        sqlx::query_as::<_, InstanceSummary>(
            r#"
            SELECT bi.id, bi.book_id, b.title AS book_title, bi.imprint,
                   bi.due_back, bi.borrower_id, bi.status
            FROM book_instances bi
            JOIN books b ON b.id = bi.book_id
            WHERE bi.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    pub async fn count_on_loan_to(&self, borrower_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_instances WHERE borrower_id = $1 AND status = $2",
        )
        .bind(borrower_id)
        .bind(LoanStatus::OnLoan)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// One page of copies on loan to a borrower, soonest due first
    pub async fn list_on_loan_to(
        &self,
        borrower_id: i32,
        offset: i64,
        limit: i64,
    ) -> AppResult<Vec<LoanedCopy>> {
        let copies = sqlx::query_as::<_, LoanedCopy>(
            r#"
            SELECT bi.id, bi.book_id, b.title, bi.imprint, bi.due_back
            FROM book_instances bi
            JOIN books b ON b.id = bi.book_id
            WHERE bi.borrower_id = $1 AND bi.status = $2
            ORDER BY bi.due_back, bi.id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(borrower_id)
        .bind(LoanStatus::OnLoan)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(copies)
    }

    /// Mark a copy available and clear its borrower.
    /// Returns the copy's book id, or None when no such copy exists.
    pub async fn mark_returned(&self, id: Uuid) -> AppResult<Option<i32>> {
        let book_id: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE book_instances
            SET status = $1, borrower_id = NULL
            WHERE id = $2
            RETURNING book_id
            "#,
        )
        .bind(LoanStatus::Available)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book_id)
    }

    pub async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<()> {
        let result = sqlx::query("UPDATE book_instances SET due_back = $1 WHERE id = $2")
            .bind(due_back)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book instance {} not found", id)));
        }
        Ok(())
    }

    pub async fn create(
        &self,
        book_id: i32,
        imprint: &str,
        status: LoanStatus,
        due_back: Option<NaiveDate>,
        borrower_id: Option<i32>,
    ) -> AppResult<BookInstance> {
        let instance = sqlx::query_as::<_, BookInstance>(
            r#"
            INSERT INTO book_instances (id, book_id, imprint, due_back, borrower_id, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, book_id, imprint, due_back, borrower_id, status
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(book_id)
        .bind(imprint)
        .bind(due_back)
        .bind(borrower_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(instance)
    }
}
