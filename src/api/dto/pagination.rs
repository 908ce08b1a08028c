//! Pagination query parameters and page metadata.

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_with::{DisplayFromStr, serde_as};

use crate::domain::query::{Page, PageRequest};
use crate::error::AppError;

const DEFAULT_PER_PAGE: u32 = 25;
const MAX_PER_PAGE: u32 = 100;

/// `page` / `per_page` query parameters.
///
/// Uses `serde_with` to parse page numbers from query strings as integers.
/// Other parameters (`filter[...]`, `sort`, `search`) are ignored here.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page: Option<u32>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub per_page: Option<u32>,
}

impl PaginationParams {
    /// Validates the parameters.
    ///
    /// # Defaults
    ///
    /// - `page`: 1
    /// - `per_page`: 25, at most 100
    pub fn to_page_request(&self) -> Result<PageRequest, AppError> {
        let page = self.page.unwrap_or(1);
        let per_page = self.per_page.unwrap_or(DEFAULT_PER_PAGE);

        if page == 0 {
            return Err(AppError::bad_request(
                "Page must be greater than 0",
                json!({ "errors": { "page": ["Page must be greater than 0"] } }),
            ));
        }

        if !(1..=MAX_PER_PAGE).contains(&per_page) {
            return Err(AppError::bad_request(
                format!("per_page must be between 1 and {MAX_PER_PAGE}"),
                json!({ "errors": { "per_page": [format!("per_page must be between 1 and {MAX_PER_PAGE}")] } }),
            ));
        }

        Ok(PageRequest::new(page, per_page))
    }
}

/// Page metadata returned alongside list items.
#[derive(Debug, Serialize)]
pub struct PageMeta {
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub last_page: u32,
}

impl<T> From<&Page<T>> for PageMeta {
    fn from(page: &Page<T>) -> Self {
        PageMeta {
            page: page.page,
            per_page: page.per_page,
            total: page.total,
            last_page: page.total_pages().max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<u32>, per_page: Option<u32>) -> PaginationParams {
        PaginationParams { page, per_page }
    }

    #[test]
    fn test_defaults() {
        let page = params(None, None).to_page_request().unwrap();
        assert_eq!(page.offset(), 0);
        assert_eq!(page.limit(), 25);
    }

    #[test]
    fn test_custom_page_and_size() {
        let page = params(Some(3), Some(50)).to_page_request().unwrap();
        assert_eq!(page.offset(), 100);
        assert_eq!(page.limit(), 50);
    }

    #[test]
    fn test_page_zero_is_error() {
        assert!(params(Some(0), None).to_page_request().is_err());
    }

    #[test]
    fn test_per_page_bounds() {
        assert!(params(None, Some(0)).to_page_request().is_err());
        assert!(params(None, Some(1)).to_page_request().is_ok());
        assert!(params(None, Some(100)).to_page_request().is_ok());
        assert!(params(None, Some(101)).to_page_request().is_err());
    }

    #[test]
    fn test_deserialize_ignores_other_parameters() {
        let uri: axum::http::Uri = "/tokens?page=2&per_page=10&filter%5Bkind%5D=access&sort=-name"
            .parse()
            .unwrap();
        let axum::extract::Query(p) =
            axum::extract::Query::<PaginationParams>::try_from_uri(&uri).unwrap();
        assert_eq!(p.page, Some(2));
        assert_eq!(p.per_page, Some(10));
    }

    #[test]
    fn test_page_meta() {
        let page: Page<u8> = Page {
            items: vec![],
            total: 51,
            page: 2,
            per_page: 25,
        };
        let meta = PageMeta::from(&page);
        assert_eq!(meta.last_page, 3);
        assert_eq!(meta.total, 51);
    }
}
