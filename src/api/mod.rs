//! HTTP handlers for the catalog site

pub mod accounts;
pub mod authors;
pub mod books;
pub mod catalog;
pub mod health;
pub mod loans;
pub mod openapi;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::{header::AUTHORIZATION, request::Parts},
    response::Redirect,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Extractor for authenticated user from JWT token.
/// Anonymous requests are sent to the login page with `next` set to the requested path.
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let login_redirect = || {
            AppError::LoginRequired(format!(
                "{}?next={}",
                state.config.auth.login_url,
                parts.uri.path()
            ))
        };

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| login_redirect())?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret).map_err(|e| {
            tracing::debug!("Rejected token: {}", e);
            login_redirect()
        })?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Integer primary key taken from the path.
/// Anything that is not a key of the table is a 404, not a bad request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordId(pub i32);

impl RecordId {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        raw.parse::<u32>()
            .ok()
            .and_then(|id| i32::try_from(id).ok())
            .map(RecordId)
            .ok_or_else(|| AppError::NotFound(format!("No record with id {}", raw)))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RecordId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::NotFound(e.body_text()))?;
        RecordId::parse(&raw)
    }
}

/// Build the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let site = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/", get(|| async { Redirect::to("/catalog/") }))
        // Browsing
        .route("/catalog/", get(catalog::index))
        .route("/catalog/books/", get(catalog::list_books))
        .route("/catalog/book/:id", get(catalog::book_detail))
        .route("/catalog/authors/", get(catalog::list_authors))
        .route("/catalog/author/:id/", get(catalog::author_detail))
        .route("/catalog/genres/", get(catalog::list_genres))
        // Loans
        .route("/catalog/mybooks/", get(loans::my_borrowed))
        .route(
            "/catalog/books/:id/return/",
            get(loans::return_confirm).post(loans::mark_returned),
        )
        .route(
            "/catalog/book/:id/renew/",
            get(loans::renew_form).post(loans::renew),
        )
        // Authors
        .route(
            "/catalog/author/create/",
            get(authors::create_form).post(authors::create_author),
        )
        .route(
            "/catalog/author/:id/update/",
            get(authors::update_form).post(authors::update_author),
        )
        .route(
            "/catalog/author/:id/delete/",
            get(authors::delete_confirm).post(authors::delete_author),
        )
        // Books
        .route(
            "/catalog/book/create/",
            get(books::create_form).post(books::create_book),
        )
        .route(
            "/catalog/book/:id/update/",
            get(books::update_form).post(books::update_book),
        )
        .route(
            "/catalog/book/:id/delete/",
            get(books::delete_confirm).post(books::delete_book),
        )
        .route("/catalog/book/:id/instances/", post(books::add_instance))
        // Genres
        .route(
            "/catalog/genre/create/",
            get(catalog::genre_form).post(catalog::create_genre),
        )
        // Accounts
        .route("/accounts/login/", post(accounts::login))
        .route("/accounts/me/", get(accounts::me))
        .with_state(state);

    Router::new()
        .merge(site)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
