//! Page-number pagination shared by every list view

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};

/// `?page=` query parameter: a 1-based number or `last`
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Page metadata returned alongside every list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Pagination {
    /// Current page number (1-based)
    pub number: i64,
    pub per_page: i64,
    pub num_pages: i64,
    /// Total number of objects across all pages
    pub count: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl Pagination {
    pub fn is_paginated(&self) -> bool {
        self.num_pages > 1
    }
}

/// A resolved page: the SQL window plus its metadata
#[derive(Debug, Clone)]
pub struct Page {
    pub offset: i64,
    pub limit: i64,
    pub info: Pagination,
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    count: i64,
    per_page: i64,
}

impl Paginator {
    pub fn new(count: i64, per_page: i64) -> Self {
        Self {
            count: count.max(0),
            per_page: per_page.max(1),
        }
    }

    /// Number of pages; an empty list still has one (empty) page
    pub fn num_pages(&self) -> i64 {
        if self.count == 0 {
            1
        } else {
            (self.count + self.per_page - 1) / self.per_page
        }
    }

    /// Resolve the requested page, rejecting anything out of range as not found
    pub fn page(&self, requested: Option<&str>) -> AppResult<Page> {
        let num_pages = self.num_pages();

        let number = match requested.map(str::trim) {
            None | Some("") => 1,
            Some("last") => num_pages,
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| AppError::NotFound("Page is not a number".to_string()))?,
        };

        if number < 1 || number > num_pages {
            return Err(AppError::NotFound(format!(
                "Invalid page ({}): that page contains no results",
                number
            )));
        }

        Ok(Page {
            offset: (number - 1) * self.per_page,
            limit: self.per_page,
            info: Pagination {
                number,
                per_page: self.per_page,
                num_pages,
                count: self.count,
                has_next: number < num_pages,
                has_previous: number > 1,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_len(page: &Page, count: i64) -> i64 {
        (count - page.offset).min(page.limit)
    }

    #[test]
    fn thirteen_authors_split_ten_and_three() {
        let paginator = Paginator::new(13, 10);

        let first = paginator.page(None).unwrap();
        assert_eq!(page_len(&first, 13), 10);
        assert!(first.info.is_paginated());
        assert!(first.info.has_next);

        let second = paginator.page(Some("2")).unwrap();
        assert_eq!(second.offset, 10);
        assert_eq!(page_len(&second, 13), 3);
        assert!(second.info.is_paginated());
        assert!(!second.info.has_next);
        assert!(second.info.has_previous);
    }

    #[test]
    fn last_resolves_to_final_page() {
        let page = Paginator::new(15, 10).page(Some("last")).unwrap();
        assert_eq!(page.info.number, 2);
        assert_eq!(page_len(&page, 15), 5);
    }

    #[test]
    fn out_of_range_and_garbage_pages_are_not_found() {
        let paginator = Paginator::new(15, 10);
        assert!(matches!(paginator.page(Some("3")), Err(AppError::NotFound(_))));
        assert!(matches!(paginator.page(Some("0")), Err(AppError::NotFound(_))));
        assert!(matches!(paginator.page(Some("abc")), Err(AppError::NotFound(_))));
    }

    #[test]
    fn empty_list_has_one_unpaginated_page() {
        let page = Paginator::new(0, 10).page(None).unwrap();
        assert_eq!(page.info.num_pages, 1);
        assert!(!page.info.is_paginated());
    }

    #[test]
    fn single_full_page_is_not_paginated() {
        let page = Paginator::new(10, 10).page(Some("1")).unwrap();
        assert!(!page.info.is_paginated());
    }
}
