//! Genre model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::forms::{collect_errors, FieldErrors};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

/// Genre creation form
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub struct GenreForm {
    /// Enter a book genre (e.g. Science Fiction)
    #[validate(length(min = 1, max = 200, message = "Enter a genre name of at most 200 characters."))]
    pub name: String,
}

impl GenreForm {
    pub fn clean(&self) -> Result<String, FieldErrors> {
        let form = GenreForm {
            name: self.name.trim().to_string(),
        };
        form.validate().map_err(|e| collect_errors(&e))?;
        Ok(form.name)
    }
}

/// Comma-separated names of the first three genres
pub fn display_genre(genres: &[Genre]) -> String {
    genres
        .iter()
        .take(3)
        .map(|g| g.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genre(id: i32, name: &str) -> Genre {
        Genre { id, name: name.to_string() }
    }

    #[test]
    fn display_genre_keeps_first_three() {
        let genres = vec![
            genre(1, "Fantasy"),
            genre(2, "Horror"),
            genre(3, "Poetry"),
            genre(4, "Satire"),
        ];
        assert_eq!(display_genre(&genres), "Fantasy, Horror, Poetry");
        assert_eq!(display_genre(&genres[..1]), "Fantasy");
        assert_eq!(display_genre(&[]), "");
    }

    #[test]
    fn blank_genre_name_is_rejected() {
        let errors = GenreForm { name: "   ".into() }.clean().unwrap_err();
        assert!(errors.contains_key("name"));
    }
}
