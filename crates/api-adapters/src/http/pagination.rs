//! Page-number pagination with a `{count, next, previous, results}` envelope.

use axum::http::Uri;
use domains::{AppError, Page, PageRequest};
use serde::{Deserialize, Serialize};

use super::error::ApiError;

/// Entity name of the not-found error raised for unusable page numbers.
pub(crate) const PAGE_ENTITY: &str = "page";
const PAGE_PARAM: &str = "page";

/// `?page=N`. Kept as text so a non-number is a 404 like an out-of-range page.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
}

impl PageParams {
    pub fn request(&self, size: u32) -> Result<PageRequest, ApiError> {
        let page = match self.page.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|page| *page >= 1)
                .ok_or_else(|| AppError::not_found(PAGE_ENTITY, raw))?,
        };
        Ok(PageRequest::new(page, size))
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    /// Wraps a page, building links relative to the request URI. Any page
    /// past the first that starts beyond the listing is an error.
    pub fn new(page: Page<T>, request: PageRequest, uri: &Uri) -> Result<Self, ApiError> {
        if request.page > 1 && request.offset() >= page.total {
            return Err(AppError::not_found(PAGE_ENTITY, request.page).into());
        }
        let next = (request.offset() + request.limit() < page.total)
            .then(|| page_link(uri, Some(request.page + 1)));
        let previous = (request.page > 1)
            .then(|| page_link(uri, (request.page > 2).then_some(request.page - 1)));
        Ok(Self {
            count: page.total,
            next,
            previous,
            results: page.items,
        })
    }
}

/// The request URI with its `page` parameter replaced, or dropped for `None`.
fn page_link(uri: &Uri, page: Option<u32>) -> String {
    let mut pairs: Vec<String> = uri
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty() && pair.split('=').next() != Some(PAGE_PARAM))
        .map(str::to_owned)
        .collect();
    if let Some(page) = page {
        pairs.push(format!("{PAGE_PARAM}={page}"));
    }
    if pairs.is_empty() {
        uri.path().to_owned()
    } else {
        format!("{}?{}", uri.path(), pairs.join("&"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: &str) -> PageParams {
        PageParams {
            page: Some(page.into()),
        }
    }

    fn page_of(total: u64) -> Page<u64> {
        Page {
            items: Vec::new(),
            total,
        }
    }

    #[test]
    fn missing_page_is_first() {
        let request = PageParams::default().request(10).unwrap();
        assert_eq!(request, PageRequest::new(1, 10));
    }

    #[test]
    fn unusable_page_numbers_are_not_found() {
        for raw in ["0", "-1", "last", "2.5"] {
            let err = params(raw).request(10).unwrap_err();
            assert!(matches!(err, ApiError::App(AppError::NotFound(ref e, _)) if e == PAGE_ENTITY));
        }
    }

    #[test]
    fn links_keep_other_parameters() {
        let uri: Uri = "/api/v1/titles/?genre=drama&page=2&year=1999".parse().unwrap();
        let page = Paginated::new(page_of(35), PageRequest::new(2, 10), &uri).unwrap();
        assert_eq!(page.next.as_deref(), Some("/api/v1/titles/?genre=drama&year=1999&page=3"));
        assert_eq!(page.previous.as_deref(), Some("/api/v1/titles/?genre=drama&year=1999"));
    }

    #[test]
    fn last_page_has_no_next() {
        let uri: Uri = "/api/v1/genres/?page=3".parse().unwrap();
        let page = Paginated::new(page_of(25), PageRequest::new(3, 10), &uri).unwrap();
        assert_eq!(page.next, None);
        assert_eq!(page.previous.as_deref(), Some("/api/v1/genres/?page=2"));
    }

    #[test]
    fn empty_listing_still_has_a_first_page() {
        let uri: Uri = "/api/v1/genres/".parse().unwrap();
        let page = Paginated::new(page_of(0), PageRequest::new(1, 10), &uri).unwrap();
        assert_eq!(page.count, 0);
        assert!(page.next.is_none() && page.previous.is_none());
    }

    #[test]
    fn page_past_the_end_is_rejected() {
        let uri: Uri = "/api/v1/genres/?page=4".parse().unwrap();
        assert!(Paginated::new(page_of(30), PageRequest::new(4, 10), &uri).is_err());
    }
}
