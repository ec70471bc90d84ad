//! Data models for the library catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod enums;
pub mod forms;
pub mod genre;
pub mod pagination;
pub mod user;

// Re-export commonly used types
pub use author::{Author, AuthorForm, AuthorRef, AuthorView};
pub use book::{Book, BookDetail, BookForm, BookShort, BookView};
pub use book_instance::{BookInstance, CopyView, InstanceSummary, LoanedCopy, RenewBookForm};
pub use enums::LoanStatus;
pub use forms::{FieldErrors, Submission};
pub use genre::{Genre, GenreForm};
pub use pagination::{PageQuery, Pagination, Paginator};
pub use user::{Permission, User, UserClaims};
