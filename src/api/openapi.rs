//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{accounts, authors, books, catalog, health, loans};

/// Registers the `bearer_auth` scheme referenced by gated paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Local Library API",
        version = "0.1.0",
        description = "Catalog browsing, loans and catalog management for a small lending library"
    ),
    modifiers(&BearerAuth),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Catalog
        catalog::index,
        catalog::list_books,
        catalog::book_detail,
        catalog::list_authors,
        catalog::author_detail,
        catalog::list_genres,
        catalog::genre_form,
        catalog::create_genre,
        // Loans
        loans::my_borrowed,
        loans::return_confirm,
        loans::mark_returned,
        loans::renew_form,
        loans::renew,
        // Authors
        authors::create_form,
        authors::create_author,
        authors::update_form,
        authors::update_author,
        authors::delete_confirm,
        authors::delete_author,
        // Books
        books::create_form,
        books::create_book,
        books::update_form,
        books::update_book,
        books::delete_confirm,
        books::delete_book,
        books::add_instance,
        // Accounts
        accounts::login,
        accounts::me,
    ),
    components(
        schemas(
            // Catalog
            catalog::IndexPage,
            catalog::BookListPage,
            catalog::AuthorListPage,
            catalog::AuthorDetailPage,
            catalog::GenreListPage,
            catalog::GenreFormPage,
            crate::models::pagination::Pagination,
            crate::models::author::Author,
            crate::models::author::AuthorView,
            crate::models::author::AuthorRef,
            crate::models::author::AuthorForm,
            crate::models::book::BookShort,
            crate::models::book::BookView,
            crate::models::book::BookDetail,
            crate::models::book::BookForm,
            crate::models::genre::Genre,
            crate::models::genre::GenreForm,
            // Copies and loans
            loans::MyBooksPage,
            loans::ReturnPage,
            loans::RenewalPage,
            crate::models::book_instance::BookInstance,
            crate::models::book_instance::CopyView,
            crate::models::book_instance::InstanceSummary,
            crate::models::book_instance::LoanedCopy,
            crate::models::book_instance::NewBookInstance,
            crate::models::book_instance::RenewBookForm,
            crate::models::enums::LoanStatus,
            // Management pages
            authors::AuthorFormPage,
            authors::AuthorDeletePage,
            books::BookFormPage,
            books::BookDeletePage,
            // Accounts
            accounts::LoginRequest,
            accounts::LoginResponse,
            accounts::UserInfo,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "catalog", description = "Catalog browsing"),
        (name = "loans", description = "Borrowed books, returns and renewals"),
        (name = "authors", description = "Author management"),
        (name = "books", description = "Book management and copy intake"),
        (name = "accounts", description = "Login and current user")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_gated_routes_with_bearer_scheme() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/catalog/book/{id}/renew/"));
        assert!(doc.paths.paths.contains_key("/catalog/mybooks/"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
