//! Author model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::forms::{add_error, clean_optional_date, collect_errors, lenient_text, FieldErrors};

/// Author row from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    /// Died
    pub date_of_death: Option<NaiveDate>,
}

impl Author {
    /// "Last, First"
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }

    pub fn absolute_url(&self) -> String {
        author_url(self.id)
    }
}

pub fn author_url(id: i32) -> String {
    format!("/catalog/author/{}/", id)
}

/// Author as rendered on list and detail pages
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorView {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
    pub display_name: String,
    pub url: String,
}

impl From<Author> for AuthorView {
    fn from(author: Author) -> Self {
        AuthorView {
            display_name: author.display_name(),
            url: author.absolute_url(),
            id: author.id,
            first_name: author.first_name,
            last_name: author.last_name,
            date_of_birth: author.date_of_birth,
            date_of_death: author.date_of_death,
        }
    }
}

/// Compact author reference embedded in book views
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AuthorRef {
    pub id: i32,
    pub name: String,
    pub url: String,
}

impl AuthorRef {
    pub fn new(id: i32, first_name: &str, last_name: &str) -> Self {
        AuthorRef {
            id,
            name: format!("{}, {}", last_name, first_name),
            url: author_url(id),
        }
    }
}

/// Author create/update form as submitted
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub struct AuthorForm {
    #[validate(length(min = 1, max = 100, message = "Enter a first name of at most 100 characters."))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Enter a last name of at most 100 characters."))]
    pub last_name: String,
    /// YYYY-MM-DD, optional
    #[serde(deserialize_with = "lenient_text")]
    pub date_of_birth: Option<String>,
    /// YYYY-MM-DD, optional
    #[serde(deserialize_with = "lenient_text")]
    pub date_of_death: Option<String>,
}

/// Cleaned author fields ready to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorData {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl AuthorForm {
    /// Form pre-filled from a stored author
    pub fn from_author(author: &Author) -> Self {
        AuthorForm {
            first_name: author.first_name.clone(),
            last_name: author.last_name.clone(),
            date_of_birth: author.date_of_birth.map(|d| d.to_string()),
            date_of_death: author.date_of_death.map(|d| d.to_string()),
        }
    }

    pub fn clean(&self) -> Result<AuthorData, FieldErrors> {
        let form = AuthorForm {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            date_of_birth: self.date_of_birth.clone(),
            date_of_death: self.date_of_death.clone(),
        };

        let mut errors = match form.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => collect_errors(&e),
        };

        let date_of_birth =
            clean_optional_date("date_of_birth", form.date_of_birth.as_deref(), &mut errors);
        let date_of_death =
            clean_optional_date("date_of_death", form.date_of_death.as_deref(), &mut errors);

        if let (Some(born), Some(died)) = (date_of_birth, date_of_death) {
            if died < born {
                add_error(&mut errors, "date_of_death", "Date of death cannot precede date of birth.");
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(AuthorData {
            first_name: form.first_name,
            last_name: form.last_name,
            date_of_birth,
            date_of_death,
        })
    }
}
