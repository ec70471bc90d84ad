//! Book (title, not a physical copy) model and related types

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{
    author::AuthorRef,
    book_instance::CopyView,
    forms::{add_error, collect_errors, FieldErrors},
    genre::{display_genre, Genre},
};

/// 13 characters: twelve digits and a final digit or X
static ISBN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{12}[0-9Xx]$").expect("valid ISBN pattern"));

/// Book row from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author_id: Option<i32>,
}

pub fn book_url(id: i32) -> String {
    format!("/catalog/book/{}", id)
}

/// Short book representation for lists
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookShort {
    pub id: i32,
    pub title: String,
    pub author: Option<AuthorRef>,
    pub url: String,
}

/// Book with its author and genres resolved
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookView {
    pub id: i32,
    pub title: String,
    pub summary: String,
    /// 13 character ISBN
    pub isbn: String,
    pub author: Option<AuthorRef>,
    pub genres: Vec<Genre>,
    /// First three genre names, comma separated
    pub display_genre: String,
    pub url: String,
}

impl BookView {
    pub fn new(book: Book, author: Option<AuthorRef>, genres: Vec<Genre>) -> Self {
        BookView {
            url: book_url(book.id),
            display_genre: display_genre(&genres),
            id: book.id,
            title: book.title,
            summary: book.summary,
            isbn: book.isbn,
            author,
            genres,
        }
    }
}

/// Book detail page context
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetail {
    pub book: BookView,
    /// Copies ordered by due date, each annotated with availability
    pub book_instances: Vec<CopyView>,
}

/// Book create/update form as submitted
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub struct BookForm {
    #[validate(length(min = 1, max = 200, message = "Enter a title of at most 200 characters."))]
    pub title: String,
    /// Enter a brief description of the book
    #[validate(length(min = 1, max = 1000, message = "Enter a summary of at most 1000 characters."))]
    pub summary: String,
    /// 13 Character ISBN number
    pub isbn: String,
    pub author_id: Option<i32>,
    /// Select genres for this book
    pub genre_ids: Vec<i32>,
}

/// Cleaned book fields ready to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookData {
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author_id: Option<i32>,
    pub genre_ids: Vec<i32>,
}

impl BookForm {
    pub fn from_book(book: &Book, genres: &[Genre]) -> Self {
        BookForm {
            title: book.title.clone(),
            summary: book.summary.clone(),
            isbn: book.isbn.clone(),
            author_id: book.author_id,
            genre_ids: genres.iter().map(|g| g.id).collect(),
        }
    }

    /// Field-local cleaning; uniqueness and references are checked against the store
    pub fn clean(&self) -> Result<BookData, FieldErrors> {
        let form = BookForm {
            title: self.title.trim().to_string(),
            summary: self.summary.trim().to_string(),
            isbn: self.isbn.trim().to_uppercase(),
            author_id: self.author_id,
            genre_ids: self.genre_ids.clone(),
        };

        let mut errors = match form.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => collect_errors(&e),
        };

        if !ISBN_REGEX.is_match(&form.isbn) {
            add_error(&mut errors, "isbn", "Enter a 13 character ISBN.");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let mut genre_ids = form.genre_ids;
        genre_ids.sort_unstable();
        genre_ids.dedup();

        Ok(BookData {
            title: form.title,
            summary: form.summary,
            isbn: form.isbn,
            author_id: form.author_id,
            genre_ids,
        })
    }
}
