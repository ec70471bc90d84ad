//! Book management and copy intake endpoints

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        book::{book_url, BookForm, BookView},
        book_instance::{BookInstance, NewBookInstance},
        forms::{FieldErrors, Submission},
        genre::Genre,
        user::Permission,
    },
    AppState,
};

use super::{AuthenticatedUser, RecordId};

#[derive(Serialize, ToSchema)]
pub struct BookFormPage {
    pub form: BookForm,
    #[schema(value_type = Object)]
    pub errors: FieldErrors,
    /// Genres the form may link to
    pub genre_choices: Vec<Genre>,
}

#[derive(Serialize, ToSchema)]
pub struct BookDeletePage {
    pub book: BookView,
}

async fn form_page(state: &AppState, form: BookForm, errors: FieldErrors) -> AppResult<BookFormPage> {
    let genre_choices = state.services.catalog.list_genres().await?;
    Ok(BookFormPage {
        form,
        errors,
        genre_choices,
    })
}

/// Blank book form
#[utoipa::path(
    get,
    path = "/catalog/book/create/",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Book form", body = BookFormPage),
        (status = 302, description = "Login required"),
        (status = 403, description = "Missing catalog.add_book")
    )
)]
pub async fn create_form(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<BookFormPage>> {
    claims.require(Permission::AddBook)?;

    let page = form_page(&state, BookForm::default(), FieldErrors::new()).await?;
    Ok(Json(page))
}

/// Create a book, then go to its detail page
#[utoipa::path(
    post,
    path = "/catalog/book/create/",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = BookForm,
    responses(
        (status = 303, description = "Created; redirect to the book"),
        (status = 200, description = "Form redisplayed with errors", body = BookFormPage),
        (status = 302, description = "Login required"),
        (status = 403, description = "Missing catalog.add_book")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(form): Json<BookForm>,
) -> AppResult<Response> {
    claims.require(Permission::AddBook)?;

    match state.services.catalog.create_book(&form).await? {
        Submission::Accepted(book) => Ok(Redirect::to(&book_url(book.id)).into_response()),
        Submission::Rejected(errors) => {
            Ok(Json(form_page(&state, form, errors).await?).into_response())
        }
    }
}

/// Book form filled with the current values
#[utoipa::path(
    get,
    path = "/catalog/book/{id}/update/",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book form", body = BookFormPage),
        (status = 302, description = "Login required"),
        (status = 403, description = "Missing catalog.change_book"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_form(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    RecordId(id): RecordId,
) -> AppResult<Json<BookFormPage>> {
    claims.require(Permission::ChangeBook)?;

    let form = state.services.catalog.book_form(id).await?;
    Ok(Json(form_page(&state, form, FieldErrors::new()).await?))
}

#[utoipa::path(
    post,
    path = "/catalog/book/{id}/update/",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = BookForm,
    responses(
        (status = 303, description = "Updated; redirect to the book"),
        (status = 200, description = "Form redisplayed with errors", body = BookFormPage),
        (status = 302, description = "Login required"),
        (status = 403, description = "Missing catalog.change_book"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    RecordId(id): RecordId,
    Json(form): Json<BookForm>,
) -> AppResult<Response> {
    claims.require(Permission::ChangeBook)?;

    match state.services.catalog.update_book(id, &form).await? {
        Submission::Accepted(book) => Ok(Redirect::to(&book_url(book.id)).into_response()),
        Submission::Rejected(errors) => {
            Ok(Json(form_page(&state, form, errors).await?).into_response())
        }
    }
}

/// Delete confirmation page
#[utoipa::path(
    get,
    path = "/catalog/book/{id}/delete/",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book to delete", body = BookDeletePage),
        (status = 302, description = "Login required"),
        (status = 403, description = "Missing catalog.delete_book"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_confirm(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    RecordId(id): RecordId,
) -> AppResult<Json<BookDeletePage>> {
    claims.require(Permission::DeleteBook)?;

    let book = state.services.catalog.book_view(id).await?;
    Ok(Json(BookDeletePage { book }))
}

/// Delete a book that has no copies left
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/delete/",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 303, description = "Deleted; redirect to book list"),
        (status = 302, description = "Login required"),
        (status = 403, description = "Missing catalog.delete_book"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book still has copies")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    RecordId(id): RecordId,
) -> AppResult<Redirect> {
    claims.require(Permission::DeleteBook)?;

    state.services.catalog.delete_book(id).await?;
    Ok(Redirect::to("/catalog/books/"))
}

/// Register a new copy of a book
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/instances/",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = NewBookInstance,
    responses(
        (status = 201, description = "Copy created", body = BookInstance),
        (status = 400, description = "Loan fields on a copy that is not on loan"),
        (status = 302, description = "Login required"),
        (status = 403, description = "Missing catalog.add_bookinstance"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn add_instance(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    RecordId(id): RecordId,
    Json(input): Json<NewBookInstance>,
) -> AppResult<(StatusCode, Json<BookInstance>)> {
    claims.require(Permission::AddBookInstance)?;

    let instance = state.services.loans.add_instance(id, &input).await?;
    Ok((StatusCode::CREATED, Json(instance)))
}
