//! BookInstance (physical, loanable copy) model and related types

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    enums::LoanStatus,
    forms::{add_error, lenient_text, parse_date, FieldErrors, INVALID_DATE, REQUIRED},
};

/// Current calendar date (UTC)
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// A copy is overdue only once its due date has strictly passed
pub fn is_overdue(due_back: Option<NaiveDate>, today: NaiveDate) -> bool {
    due_back.is_some_and(|due| today > due)
}

/// BookInstance row from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstance {
    /// Unique ID for this particular copy across the whole library
    pub id: Uuid,
    pub book_id: i32,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
    pub status: LoanStatus,
}

impl BookInstance {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        is_overdue(self.due_back, today)
    }

    pub fn is_available(&self) -> bool {
        self.status == LoanStatus::Available
    }
}

/// Copy as listed on a book's detail page
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CopyView {
    pub id: Uuid,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub is_available: bool,
    pub is_overdue: bool,
}

impl CopyView {
    pub fn new(instance: BookInstance, today: NaiveDate) -> Self {
        CopyView {
            is_available: instance.is_available(),
            is_overdue: instance.is_overdue(today),
            id: instance.id,
            imprint: instance.imprint,
            due_back: instance.due_back,
            status: instance.status,
        }
    }
}

/// Copy joined with its book title, as shown on return and renewal screens
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct InstanceSummary {
    pub id: Uuid,
    pub book_id: i32,
    pub book_title: String,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
    pub status: LoanStatus,
}

impl InstanceSummary {
    /// "<uuid> (<title>)"
    pub fn display(&self) -> String {
        format!("{} ({})", self.id, self.book_title)
    }
}

/// One entry of the "my borrowed" list
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct LoanedCopy {
    pub id: Uuid,
    pub book_id: i32,
    pub title: String,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    #[sqlx(skip)]
    pub is_overdue: bool,
}

/// Request body for adding a copy to a book
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewBookInstance {
    #[serde(default)]
    pub imprint: String,
    #[serde(default)]
    pub status: Option<LoanStatus>,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
}

impl NewBookInstance {
    /// A due date or borrower only makes sense for a copy that is out on loan
    pub fn check(&self) -> Result<LoanStatus, String> {
        let status = self.status.unwrap_or_default();

        if self.imprint.chars().count() > 200 {
            return Err("Imprint must be at most 200 characters".to_string());
        }
        if status != LoanStatus::OnLoan && (self.due_back.is_some() || self.borrower_id.is_some()) {
            return Err("Only copies on loan may carry a due date or borrower".to_string());
        }
        Ok(status)
    }
}

/// Accepted window for renewal dates, in days from today
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenewalPolicy {
    pub default_days: i64,
    pub max_days: i64,
}

impl Default for RenewalPolicy {
    fn default() -> Self {
        Self {
            default_days: 21,
            max_days: 28,
        }
    }
}

impl RenewalPolicy {
    /// Due date proposed on the blank renewal form
    pub fn proposed(&self, today: NaiveDate) -> NaiveDate {
        today + Duration::days(self.default_days)
    }

    pub fn latest(&self, today: NaiveDate) -> NaiveDate {
        today + Duration::days(self.max_days)
    }

    fn max_description(&self) -> String {
        if self.max_days % 7 == 0 {
            format!("{} weeks", self.max_days / 7)
        } else {
            format!("{} days", self.max_days)
        }
    }
}

/// Librarian renewal form
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct RenewBookForm {
    /// New due date, YYYY-MM-DD
    #[serde(deserialize_with = "lenient_text")]
    pub renewal_date: Option<String>,
}

impl RenewBookForm {
    pub fn initial(policy: &RenewalPolicy, today: NaiveDate) -> Self {
        RenewBookForm {
            renewal_date: Some(policy.proposed(today).to_string()),
        }
    }

    pub fn clean(&self, policy: &RenewalPolicy, today: NaiveDate) -> Result<NaiveDate, FieldErrors> {
        const FIELD: &str = "renewal_date";
        let mut errors = FieldErrors::new();

        let raw = self.renewal_date.as_deref().map(str::trim).unwrap_or("");
        if raw.is_empty() {
            add_error(&mut errors, FIELD, REQUIRED);
            return Err(errors);
        }

        let Some(date) = parse_date(raw) else {
            add_error(&mut errors, FIELD, INVALID_DATE);
            return Err(errors);
        };

        if date < today {
            add_error(&mut errors, FIELD, "Invalid date - renewal in past");
        } else if date > policy.latest(today) {
            add_error(
                &mut errors,
                FIELD,
                format!("Invalid date - renewal more than {} ahead", policy.max_description()),
            );
        }

        if errors.is_empty() {
            Ok(date)
        } else {
            Err(errors)
        }
    }
}
