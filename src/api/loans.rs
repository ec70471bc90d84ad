//! Loan endpoints: my borrowed books, return and renewal

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book::book_url,
        book_instance::{InstanceSummary, LoanedCopy, RenewBookForm},
        forms::{FieldErrors, Submission},
        pagination::{PageQuery, Pagination},
        user::Permission,
    },
    AppState,
};

use super::AuthenticatedUser;

#[derive(Serialize, ToSchema)]
pub struct MyBooksPage {
    pub bookinstance_list: Vec<LoanedCopy>,
    pub is_paginated: bool,
    pub page_obj: Pagination,
}

#[derive(Serialize, ToSchema)]
pub struct ReturnPage {
    pub book_instance: InstanceSummary,
    /// "<uuid> (<title>)"
    pub display: String,
}

#[derive(Serialize, ToSchema)]
pub struct RenewalPage {
    pub book_instance: InstanceSummary,
    pub form: RenewBookForm,
    #[schema(value_type = Object)]
    pub errors: FieldErrors,
}

/// Copies on loan to the current user, soonest due first
#[utoipa::path(
    get,
    path = "/catalog/mybooks/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Borrowed copies", body = MyBooksPage),
        (status = 302, description = "Login required"),
        (status = 404, description = "Invalid page")
    )
)]
pub async fn my_borrowed(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<MyBooksPage>> {
    let (bookinstance_list, page_obj) = state
        .services
        .loans
        .borrowed_by(claims.user_id, query.page.as_deref())
        .await?;

    Ok(Json(MyBooksPage {
        bookinstance_list,
        is_paginated: page_obj.is_paginated(),
        page_obj,
    }))
}

/// Return confirmation page
#[utoipa::path(
    get,
    path = "/catalog/books/{id}/return/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Copy to return", body = ReturnPage),
        (status = 302, description = "Login required"),
        (status = 403, description = "Missing catalog.can_mark_returned"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn return_confirm(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ReturnPage>> {
    claims.require(Permission::CanMarkReturned)?;

    let book_instance = state.services.loans.instance(id).await?;
    Ok(Json(ReturnPage {
        display: book_instance.display(),
        book_instance,
    }))
}

/// Mark a copy available and clear its borrower
#[utoipa::path(
    post,
    path = "/catalog/books/{id}/return/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 303, description = "Returned; redirect to the book, or to the book list for an unknown copy"),
        (status = 302, description = "Login required"),
        (status = 403, description = "Missing catalog.can_mark_returned")
    )
)]
pub async fn mark_returned(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Redirect> {
    claims.require(Permission::CanMarkReturned)?;

    let target = match state.services.loans.mark_returned(id).await? {
        Some(book_id) => book_url(book_id),
        None => "/catalog/books/".to_string(),
    };
    Ok(Redirect::to(&target))
}

/// Renewal form with the proposed due date
#[utoipa::path(
    get,
    path = "/catalog/book/{id}/renew/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Renewal form", body = RenewalPage),
        (status = 302, description = "Login required"),
        (status = 403, description = "Missing catalog.can_mark_returned"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn renew_form(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RenewalPage>> {
    claims.require(Permission::CanMarkReturned)?;

    let (book_instance, form) = state.services.loans.renewal_form(id).await?;
    Ok(Json(RenewalPage {
        book_instance,
        form,
        errors: FieldErrors::new(),
    }))
}

/// Set a new due date for a copy on loan
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/renew/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    request_body = RenewBookForm,
    responses(
        (status = 303, description = "Renewed; redirect to my borrowed books"),
        (status = 200, description = "Form redisplayed with errors", body = RenewalPage),
        (status = 302, description = "Login required"),
        (status = 403, description = "Missing catalog.can_mark_returned"),
        (status = 404, description = "Book instance not found"),
        (status = 422, description = "Copy is not on loan")
    )
)]
pub async fn renew(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(form): Json<RenewBookForm>,
) -> AppResult<Response> {
    claims.require(Permission::CanMarkReturned)?;

    match state.services.loans.renew(id, &form).await? {
        Submission::Accepted(_) => Ok(Redirect::to("/catalog/mybooks/").into_response()),
        Submission::Rejected(errors) => {
            let book_instance = state.services.loans.instance(id).await?;
            Ok(Json(RenewalPage {
                book_instance,
                form,
                errors,
            })
            .into_response())
        }
    }
}
