//! Loan service: borrowed lists, returns, renewals and copy intake

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book_instance::{
            is_overdue, today, BookInstance, InstanceSummary, LoanedCopy, NewBookInstance, RenewBookForm,
            RenewalPolicy,
        },
        enums::LoanStatus,
        forms::Submission,
        pagination::{Pagination, Paginator},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    paginate_by: i64,
    policy: RenewalPolicy,
}

impl LoansService {
    pub fn new(repository: Repository, paginate_by: i64, policy: RenewalPolicy) -> Self {
        Self {
            repository,
            paginate_by,
            policy,
        }
    }

    /// Copies currently on loan to a user, soonest due first
    pub async fn borrowed_by(
        &self,
        user_id: i32,
        page: Option<&str>,
    ) -> AppResult<(Vec<LoanedCopy>, Pagination)> {
        let total = self.repository.book_instances.count_on_loan_to(user_id).await?;
        let page = Paginator::new(total, self.paginate_by).page(page)?;

        let today = today();
        let mut copies = self
            .repository
            .book_instances
            .list_on_loan_to(user_id, page.offset, page.limit)
            .await?;
        for copy in &mut copies {
            copy.is_overdue = is_overdue(copy.due_back, today);
        }

        Ok((copies, page.info))
    }

    pub async fn instance(&self, id: Uuid) -> AppResult<InstanceSummary> {
        self.repository.book_instances.get_summary(id).await
    }

    /// Mark a copy returned. Returns its book id, or None if the copy does not exist.
    pub async fn mark_returned(&self, id: Uuid) -> AppResult<Option<i32>> {
        let book_id = self.repository.book_instances.mark_returned(id).await?;

        match book_id {
            Some(book_id) => tracing::info!(instance = %id, book_id, "Book instance returned"),
            None => tracing::debug!(instance = %id, "Return requested for unknown instance"),
        }
        Ok(book_id)
    }

    /// The copy plus a blank renewal form with the proposed date
    pub async fn renewal_form(&self, id: Uuid) -> AppResult<(InstanceSummary, RenewBookForm)> {
        let instance = self.repository.book_instances.get_summary(id).await?;
        Ok((instance, RenewBookForm::initial(&self.policy, today())))
    }

    pub async fn renew(&self, id: Uuid, form: &RenewBookForm) -> AppResult<Submission<NaiveDate>> {
        let instance = self.repository.book_instances.get_summary(id).await?;

        if instance.status != LoanStatus::OnLoan {
            return Err(AppError::BusinessRule(format!(
                "Book instance {} is not on loan",
                id
            )));
        }

        let due_back = match form.clean(&self.policy, today()) {
            Ok(date) => date,
            Err(errors) => return Ok(Submission::Rejected(errors)),
        };

        self.repository.book_instances.set_due_back(id, due_back).await?;
        tracing::info!(instance = %id, due_back = %due_back, "Loan renewed");
        Ok(Submission::Accepted(due_back))
    }

    /// Register a new physical copy of a book
    pub async fn add_instance(&self, book_id: i32, input: &NewBookInstance) -> AppResult<BookInstance> {
        if !self.repository.books.exists(book_id).await? {
            return Err(AppError::NotFound(format!("Book with id {} not found", book_id)));
        }

        let status = input.check().map_err(AppError::Validation)?;

        if let Some(borrower_id) = input.borrower_id {
            if !self.repository.users.exists(borrower_id).await? {
                return Err(AppError::Validation(format!(
                    "Borrower with id {} does not exist",
                    borrower_id
                )));
            }
        }

        let instance = self
            .repository
            .book_instances
            .create(
                book_id,
                input.imprint.trim(),
                status,
                input.due_back,
                input.borrower_id,
            )
            .await?;

        tracing::info!(instance = %instance.id, book_id, status = %instance.status, "Added book instance");
        Ok(instance)
    }
}
