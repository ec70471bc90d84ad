//! Catalog service: books, authors and genres

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, AuthorForm, AuthorRef, AuthorView},
        book::{Book, BookData, BookDetail, BookForm, BookShort, BookView},
        book_instance::{today, CopyView},
        enums::LoanStatus,
        forms::{add_error, FieldErrors, Submission},
        genre::{Genre, GenreForm},
        pagination::{Pagination, Paginator},
    },
    repository::{books::BookWrite, Repository},
};

const ISBN_TAKEN: &str = "Book with this ISBN already exists.";

/// A lost ISBN race is reported the same way as the form check reports it
fn book_submission(write: BookWrite) -> Submission<Book> {
    match write {
        BookWrite::Saved(book) => Submission::Accepted(book),
        BookWrite::IsbnTaken => {
            let mut errors = FieldErrors::new();
            add_error(&mut errors, "isbn", ISBN_TAKEN);
            Submission::Rejected(errors)
        }
    }
}

/// Record counts shown on the home page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibraryCounts {
    pub num_books: i64,
    pub num_instances: i64,
    pub num_instances_available: i64,
    pub num_authors: i64,
    pub num_genres: i64,
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    paginate_by: i64,
}

impl CatalogService {
    pub fn new(repository: Repository, paginate_by: i64) -> Self {
        Self {
            repository,
            paginate_by,
        }
    }

    pub async fn counts(&self) -> AppResult<LibraryCounts> {
        Ok(LibraryCounts {
            num_books: self.repository.books.count().await?,
            num_instances: self.repository.book_instances.count().await?,
            num_instances_available: self
                .repository
                .book_instances
                .count_with_status(LoanStatus::Available)
                .await?,
            num_authors: self.repository.authors.count().await?,
            num_genres: self.repository.genres.count().await?,
        })
    }

    // =========================================================================
    // BOOKS
    // =========================================================================

    pub async fn list_books(&self, page: Option<&str>) -> AppResult<(Vec<BookShort>, Pagination)> {
        let total = self.repository.books.count().await?;
        let page = Paginator::new(total, self.paginate_by).page(page)?;

        let books = self.repository.books.list(page.offset, page.limit).await?;
        Ok((books, page.info))
    }

    /// Book with author, genres and display fields
    pub async fn book_view(&self, id: i32) -> AppResult<BookView> {
        let book = self.repository.books.get_by_id(id).await?;
        self.view_of(book).await
    }

    async fn view_of(&self, book: Book) -> AppResult<BookView> {
        let author = match book.author_id {
            Some(author_id) => {
                let author = self.repository.authors.get_by_id(author_id).await?;
                Some(AuthorRef::new(author.id, &author.first_name, &author.last_name))
            }
            None => None,
        };
        let genres = self.repository.genres.list_for_book(book.id).await?;

        Ok(BookView::new(book, author, genres))
    }

    pub async fn book_detail(&self, id: i32) -> AppResult<BookDetail> {
        let book = self.book_view(id).await?;
        let today = today();

        let book_instances = self
            .repository
            .book_instances
            .list_for_book(id)
            .await?
            .into_iter()
            .map(|instance| CopyView::new(instance, today))
            .collect();

        Ok(BookDetail {
            book,
            book_instances,
        })
    }

    /// Current values of a book, as an edit form
    pub async fn book_form(&self, id: i32) -> AppResult<BookForm> {
        let book = self.repository.books.get_by_id(id).await?;
        let genres = self.repository.genres.list_for_book(id).await?;
        Ok(BookForm::from_book(&book, &genres))
    }

    pub async fn create_book(&self, form: &BookForm) -> AppResult<Submission<Book>> {
        let data = match self.clean_book(form, None).await? {
            Ok(data) => data,
            Err(errors) => return Ok(Submission::Rejected(errors)),
        };

        let submission = book_submission(self.repository.books.create(&data).await?);
        match &submission {
            Submission::Accepted(book) => {
                tracing::info!(book_id = book.id, isbn = %book.isbn, "Created book")
            }
            Submission::Rejected(_) => tracing::warn!(isbn = %data.isbn, "ISBN taken during create"),
        }
        Ok(submission)
    }

    pub async fn update_book(&self, id: i32, form: &BookForm) -> AppResult<Submission<Book>> {
        if !self.repository.books.exists(id).await? {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        let data = match self.clean_book(form, Some(id)).await? {
            Ok(data) => data,
            Err(errors) => return Ok(Submission::Rejected(errors)),
        };

        let submission = book_submission(self.repository.books.update(id, &data).await?);
        match &submission {
            Submission::Accepted(book) => tracing::info!(book_id = book.id, "Updated book"),
            Submission::Rejected(_) => {
                tracing::warn!(book_id = id, isbn = %data.isbn, "ISBN taken during update")
            }
        }
        Ok(submission)
    }

    /// Field checks first, then checks that need the database
    async fn clean_book(
        &self,
        form: &BookForm,
        exclude_id: Option<i32>,
    ) -> AppResult<Result<BookData, FieldErrors>> {
        let data = match form.clean() {
            Ok(data) => data,
            Err(errors) => return Ok(Err(errors)),
        };

        let mut errors = FieldErrors::new();

        if self.repository.books.isbn_exists(&data.isbn, exclude_id).await? {
            add_error(&mut errors, "isbn", ISBN_TAKEN);
        }

        if let Some(author_id) = data.author_id {
            if !self.repository.authors.exists(author_id).await? {
                add_error(
                    &mut errors,
                    "author_id",
                    "Select a valid choice. That choice is not one of the available choices.",
                );
            }
        }

        for missing in self.repository.genres.missing_ids(&data.genre_ids).await? {
            add_error(
                &mut errors,
                "genre_ids",
                format!("Select a valid choice. {} is not one of the available choices.", missing),
            );
        }

        if errors.is_empty() {
            Ok(Ok(data))
        } else {
            Ok(Err(errors))
        }
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        if !self.repository.books.exists(id).await? {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        let copies = self.repository.books.count_instances(id).await?;
        if copies > 0 {
            return Err(AppError::Conflict(format!(
                "Book with id {} still has {} copies",
                id, copies
            )));
        }

        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "Deleted book");
        Ok(())
    }

    // =========================================================================
    // AUTHORS
    // =========================================================================

    pub async fn list_authors(&self, page: Option<&str>) -> AppResult<(Vec<AuthorView>, Pagination)> {
        let total = self.repository.authors.count().await?;
        let page = Paginator::new(total, self.paginate_by).page(page)?;

        let authors = self
            .repository
            .authors
            .list(page.offset, page.limit)
            .await?
            .into_iter()
            .map(AuthorView::from)
            .collect();
        Ok((authors, page.info))
    }

    pub async fn get_author(&self, id: i32) -> AppResult<Author> {
        self.repository.authors.get_by_id(id).await
    }

    /// Author with their books ordered by title
    pub async fn author_detail(&self, id: i32) -> AppResult<(Author, Vec<BookShort>)> {
        let author = self.repository.authors.get_by_id(id).await?;
        let books = self.repository.books.list_by_author(id).await?;
        Ok((author, books))
    }

    pub async fn create_author(&self, form: &AuthorForm) -> AppResult<Submission<Author>> {
        let data = match form.clean() {
            Ok(data) => data,
            Err(errors) => return Ok(Submission::Rejected(errors)),
        };

        let author = self.repository.authors.create(&data).await?;
        tracing::info!(author_id = author.id, "Created author");
        Ok(Submission::Accepted(author))
    }

    pub async fn update_author(&self, id: i32, form: &AuthorForm) -> AppResult<Submission<Author>> {
        if !self.repository.authors.exists(id).await? {
            return Err(AppError::NotFound(format!("Author with id {} not found", id)));
        }

        let data = match form.clean() {
            Ok(data) => data,
            Err(errors) => return Ok(Submission::Rejected(errors)),
        };

        let author = self.repository.authors.update(id, &data).await?;
        tracing::info!(author_id = author.id, "Updated author");
        Ok(Submission::Accepted(author))
    }

    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await?;
        tracing::info!(author_id = id, "Deleted author");
        Ok(())
    }

    // =========================================================================
    // GENRES
    // =========================================================================

    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.repository.genres.list().await
    }

    pub async fn create_genre(&self, form: &GenreForm) -> AppResult<Submission<Genre>> {
        let name = match form.clean() {
            Ok(name) => name,
            Err(errors) => return Ok(Submission::Rejected(errors)),
        };

        let genre = self.repository.genres.create(&name).await?;
        tracing::info!(genre_id = genre.id, name = %genre.name, "Created genre");
        Ok(Submission::Accepted(genre))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> Book {
        Book {
            id: 4,
            title: "The Dispossessed".into(),
            summary: String::new(),
            isbn: "9780060512750".into(),
            author_id: None,
        }
    }

    #[test]
    fn saved_write_is_accepted() {
        match book_submission(BookWrite::Saved(book())) {
            Submission::Accepted(saved) => assert_eq!(saved.id, 4),
            Submission::Rejected(errors) => panic!("unexpected errors: {:?}", errors),
        }
    }

    #[test]
    fn isbn_race_is_an_isbn_field_error() {
        match book_submission(BookWrite::IsbnTaken) {
            Submission::Rejected(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors["isbn"], vec![ISBN_TAKEN.to_string()]);
            }
            Submission::Accepted(book) => panic!("unexpected book {}", book.id),
        }
    }
}
