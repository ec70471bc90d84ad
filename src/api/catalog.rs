//! Browsing endpoints: home page, book/author lists and details, genres

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        author::AuthorView,
        book::{BookDetail, BookShort},
        forms::{FieldErrors, Submission},
        genre::{Genre, GenreForm},
        pagination::{PageQuery, Pagination},
        user::Permission,
    },
    AppState,
};

use super::{AuthenticatedUser, RecordId};

#[derive(Serialize, ToSchema)]
pub struct IndexPage {
    pub num_books: i64,
    pub num_instances: i64,
    /// Copies with status Available
    pub num_instances_available: i64,
    pub num_authors: i64,
    pub num_genres: i64,
    /// Earlier visits to this page in the current session
    pub num_visits: u64,
}

#[derive(Serialize, ToSchema)]
pub struct BookListPage {
    pub book_list: Vec<BookShort>,
    pub is_paginated: bool,
    pub page_obj: Pagination,
}

#[derive(Serialize, ToSchema)]
pub struct AuthorListPage {
    pub author_list: Vec<AuthorView>,
    pub is_paginated: bool,
    pub page_obj: Pagination,
}

#[derive(Serialize, ToSchema)]
pub struct AuthorDetailPage {
    pub author: AuthorView,
    /// The author's books, by title
    pub book_set: Vec<BookShort>,
}

#[derive(Serialize, ToSchema)]
pub struct GenreListPage {
    pub genre_list: Vec<Genre>,
}

#[derive(Serialize, ToSchema)]
pub struct GenreFormPage {
    pub form: GenreForm,
    #[schema(value_type = Object)]
    pub errors: FieldErrors,
}

/// Home page with library counts and the session visit counter
#[utoipa::path(
    get,
    path = "/catalog/",
    tag = "catalog",
    responses(
        (status = 200, description = "Home page counts", body = IndexPage)
    )
)]
pub async fn index(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<IndexPage>)> {
    let cookie_name = state.config.session.cookie_name.clone();

    let (session_key, jar) = match jar.get(&cookie_name) {
        Some(cookie) => (cookie.value().to_string(), jar),
        None => {
            let key = Uuid::new_v4().simple().to_string();
            let cookie = Cookie::build((cookie_name, key.clone()))
                .path("/")
                .http_only(true);
            (key, jar.add(cookie))
        }
    };

    let counts = state.services.catalog.counts().await?;
    let num_visits = state.services.sessions.record_visit(&session_key).await?;

    Ok((
        jar,
        Json(IndexPage {
            num_books: counts.num_books,
            num_instances: counts.num_instances,
            num_instances_available: counts.num_instances_available,
            num_authors: counts.num_authors,
            num_genres: counts.num_genres,
            num_visits,
        }),
    ))
}

/// Paginated list of books ordered by title
#[utoipa::path(
    get,
    path = "/catalog/books/",
    tag = "catalog",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of books", body = BookListPage),
        (status = 404, description = "Invalid page")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<BookListPage>> {
    let (book_list, page_obj) = state
        .services
        .catalog
        .list_books(query.page.as_deref())
        .await?;

    Ok(Json(BookListPage {
        book_list,
        is_paginated: page_obj.is_paginated(),
        page_obj,
    }))
}

/// Book with its genres and copies
#[utoipa::path(
    get,
    path = "/catalog/book/{id}",
    tag = "catalog",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookDetail),
        (status = 404, description = "Book not found")
    )
)]
pub async fn book_detail(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> AppResult<Json<BookDetail>> {
    let detail = state.services.catalog.book_detail(id).await?;
    Ok(Json(detail))
}

/// Paginated list of authors ordered by last name, first name
#[utoipa::path(
    get,
    path = "/catalog/authors/",
    tag = "catalog",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of authors", body = AuthorListPage),
        (status = 404, description = "Invalid page")
    )
)]
pub async fn list_authors(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<AuthorListPage>> {
    let (author_list, page_obj) = state
        .services
        .catalog
        .list_authors(query.page.as_deref())
        .await?;

    Ok(Json(AuthorListPage {
        author_list,
        is_paginated: page_obj.is_paginated(),
        page_obj,
    }))
}

/// Author with their books
#[utoipa::path(
    get,
    path = "/catalog/author/{id}/",
    tag = "catalog",
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Author details", body = AuthorDetailPage),
        (status = 404, description = "Author not found")
    )
)]
pub async fn author_detail(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> AppResult<Json<AuthorDetailPage>> {
    let (author, book_set) = state.services.catalog.author_detail(id).await?;

    Ok(Json(AuthorDetailPage {
        author: author.into(),
        book_set,
    }))
}

#[utoipa::path(
    get,
    path = "/catalog/genres/",
    tag = "catalog",
    responses(
        (status = 200, description = "All genres by name", body = GenreListPage)
    )
)]
pub async fn list_genres(State(state): State<AppState>) -> AppResult<Json<GenreListPage>> {
    let genre_list = state.services.catalog.list_genres().await?;
    Ok(Json(GenreListPage { genre_list }))
}

/// Blank genre form
#[utoipa::path(
    get,
    path = "/catalog/genre/create/",
    tag = "catalog",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Genre form", body = GenreFormPage),
        (status = 302, description = "Login required"),
        (status = 403, description = "Missing catalog.add_genre")
    )
)]
pub async fn genre_form(
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<GenreFormPage>> {
    claims.require(Permission::AddGenre)?;

    Ok(Json(GenreFormPage {
        form: GenreForm::default(),
        errors: FieldErrors::new(),
    }))
}

/// Create a genre, then go to the genre list
#[utoipa::path(
    post,
    path = "/catalog/genre/create/",
    tag = "catalog",
    security(("bearer_auth" = [])),
    request_body = GenreForm,
    responses(
        (status = 303, description = "Created; redirect to genre list"),
        (status = 200, description = "Form redisplayed with errors", body = GenreFormPage),
        (status = 302, description = "Login required"),
        (status = 403, description = "Missing catalog.add_genre")
    )
)]
pub async fn create_genre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(form): Json<GenreForm>,
) -> AppResult<Response> {
    claims.require(Permission::AddGenre)?;

    match state.services.catalog.create_genre(&form).await? {
        Submission::Accepted(_) => Ok(Redirect::to("/catalog/genres/").into_response()),
        Submission::Rejected(errors) => Ok(Json(GenreFormPage { form, errors }).into_response()),
    }
}
