//! Author management endpoints

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        author::{Author, AuthorForm, AuthorView},
        forms::{FieldErrors, Submission},
        user::Permission,
    },
    AppState,
};

use super::{AuthenticatedUser, RecordId};

#[derive(Serialize, ToSchema)]
pub struct AuthorFormPage {
    pub form: AuthorForm,
    #[schema(value_type = Object)]
    pub errors: FieldErrors,
}

#[derive(Serialize, ToSchema)]
pub struct AuthorDeletePage {
    pub author: AuthorView,
}

fn form_result(submission: Submission<Author>, form: AuthorForm) -> Response {
    match submission {
        Submission::Accepted(author) => Redirect::to(&author.absolute_url()).into_response(),
        Submission::Rejected(errors) => Json(AuthorFormPage { form, errors }).into_response(),
    }
}

/// Blank author form
#[utoipa::path(
    get,
    path = "/catalog/author/create/",
    tag = "authors",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Author form", body = AuthorFormPage),
        (status = 302, description = "Login required"),
        (status = 403, description = "Missing catalog.add_author")
    )
)]
pub async fn create_form(
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<AuthorFormPage>> {
    claims.require(Permission::AddAuthor)?;

    Ok(Json(AuthorFormPage {
        form: AuthorForm::default(),
        errors: FieldErrors::new(),
    }))
}

/// Create an author, then go to their detail page
#[utoipa::path(
    post,
    path = "/catalog/author/create/",
    tag = "authors",
    security(("bearer_auth" = [])),
    request_body = AuthorForm,
    responses(
        (status = 303, description = "Created; redirect to the author"),
        (status = 200, description = "Form redisplayed with errors", body = AuthorFormPage),
        (status = 302, description = "Login required"),
        (status = 403, description = "Missing catalog.add_author")
    )
)]
pub async fn create_author(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(form): Json<AuthorForm>,
) -> AppResult<Response> {
    claims.require(Permission::AddAuthor)?;

    let submission = state.services.catalog.create_author(&form).await?;
    Ok(form_result(submission, form))
}

/// Author form filled with the current values
#[utoipa::path(
    get,
    path = "/catalog/author/{id}/update/",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Author form", body = AuthorFormPage),
        (status = 302, description = "Login required"),
        (status = 403, description = "Missing catalog.change_author"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn update_form(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    RecordId(id): RecordId,
) -> AppResult<Json<AuthorFormPage>> {
    claims.require(Permission::ChangeAuthor)?;

    let author = state.services.catalog.get_author(id).await?;
    Ok(Json(AuthorFormPage {
        form: AuthorForm::from_author(&author),
        errors: FieldErrors::new(),
    }))
}

#[utoipa::path(
    post,
    path = "/catalog/author/{id}/update/",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    request_body = AuthorForm,
    responses(
        (status = 303, description = "Updated; redirect to the author"),
        (status = 200, description = "Form redisplayed with errors", body = AuthorFormPage),
        (status = 302, description = "Login required"),
        (status = 403, description = "Missing catalog.change_author"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn update_author(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    RecordId(id): RecordId,
    Json(form): Json<AuthorForm>,
) -> AppResult<Response> {
    claims.require(Permission::ChangeAuthor)?;

    let submission = state.services.catalog.update_author(id, &form).await?;
    Ok(form_result(submission, form))
}

/// Delete confirmation page
#[utoipa::path(
    get,
    path = "/catalog/author/{id}/delete/",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Author to delete", body = AuthorDeletePage),
        (status = 302, description = "Login required"),
        (status = 403, description = "Missing catalog.delete_author"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn delete_confirm(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    RecordId(id): RecordId,
) -> AppResult<Json<AuthorDeletePage>> {
    claims.require(Permission::DeleteAuthor)?;

    let author = state.services.catalog.get_author(id).await?;
    Ok(Json(AuthorDeletePage {
        author: author.into(),
    }))
}

/// Delete an author; their books are kept without an author
#[utoipa::path(
    post,
    path = "/catalog/author/{id}/delete/",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 303, description = "Deleted; redirect to author list"),
        (status = 302, description = "Login required"),
        (status = 403, description = "Missing catalog.delete_author"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn delete_author(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    RecordId(id): RecordId,
) -> AppResult<Redirect> {
    claims.require(Permission::DeleteAuthor)?;

    state.services.catalog.delete_author(id).await?;
    Ok(Redirect::to("/catalog/authors/"))
}
