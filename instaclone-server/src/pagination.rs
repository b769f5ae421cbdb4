//! Page-number pagination with clamping and absolute `next`/`previous` links.

use axum::http::Uri;
use instaclone_types::Paginated;
use serde::Deserialize;

/// Standard listings: 20 per page, `page_size` may raise it up to 100
pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;
pub const HOME_FEED_PAGE_SIZE: u64 = 10;
pub const PROFILE_FEED_PAGE_SIZE: u64 = 12;

/// Raw query parameters. Kept as strings so malformed values clamp
/// instead of rejecting the request.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl PageQuery {
    pub fn first() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSize {
    /// Fixed size, `page_size` is ignored
    Fixed(u64),
    /// [`DEFAULT_PAGE_SIZE`] with a client override capped at [`MAX_PAGE_SIZE`]
    Standard,
}

impl PageSize {
    pub fn resolve(self, requested: Option<&str>) -> u64 {
        match self {
            PageSize::Fixed(size) => size.max(1),
            PageSize::Standard => match requested.and_then(|s| s.trim().parse::<i64>().ok()) {
                Some(n) if n >= 1 => (n as u64).min(MAX_PAGE_SIZE),
                _ => DEFAULT_PAGE_SIZE,
            },
        }
    }
}

/// Number of pages for `total` rows; an empty listing still has one page
pub fn num_pages(total: u64, page_size: u64) -> u64 {
    let size = page_size.max(1);
    ((total + size - 1) / size).max(1)
}

/// Missing or non-integer → 1, below 1 → 1, past the end → last page
pub fn clamp_page(requested: Option<&str>, num_pages: u64) -> u64 {
    let last = num_pages.max(1);
    match requested.and_then(|s| s.trim().parse::<i64>().ok()) {
        Some(n) if n < 1 => 1,
        Some(n) => (n as u64).min(last),
        None => 1,
    }
}

/// The resolved slice of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub page_size: u64,
    pub num_pages: u64,
    pub total: u64,
}

impl PageWindow {
    pub fn resolve(query: &PageQuery, size: PageSize, total: u64) -> Self {
        let page_size = size.resolve(query.page_size.as_deref());
        let num_pages = num_pages(total, page_size);
        let page = clamp_page(query.page.as_deref(), num_pages);
        Self {
            page,
            page_size,
            num_pages,
            total,
        }
    }

    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }

    pub fn offset(&self) -> i64 {
        ((self.page - 1) * self.page_size) as i64
    }

    pub fn has_next(&self) -> bool {
        self.page < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// A page of results before links are attached
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub window: PageWindow,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            window: PageWindow::resolve(&PageQuery::first(), PageSize::Standard, 0),
        }
    }

    /// Paginate an already bounded result set in memory
    pub fn paginate(items: Vec<T>, query: &PageQuery, size: PageSize) -> Self {
        let window = PageWindow::resolve(query, size, items.len() as u64);
        let items = items
            .into_iter()
            .skip(window.offset() as usize)
            .take(window.limit() as usize)
            .collect();
        Self { items, window }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            window: self.window,
        }
    }

    pub fn into_envelope(self, links: &PageLinks) -> Paginated<T> {
        let next = self
            .window
            .has_next()
            .then(|| links.link(self.window.page + 1));
        let previous = self
            .window
            .has_previous()
            .then(|| links.link(self.window.page - 1));
        Paginated {
            count: self.window.total,
            next,
            previous,
            results: self.items,
        }
    }
}

/// Builds absolute links to other pages of the current request
#[derive(Debug, Clone)]
pub struct PageLinks {
    base: String,
    pairs: Vec<(String, String)>,
}

impl PageLinks {
    pub fn new(public_url: &str, uri: &Uri) -> Self {
        let pairs = uri
            .query()
            .map(|q| {
                q.split('&')
                    .filter(|pair| !pair.is_empty())
                    .map(|pair| {
                        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                        (decode(k), decode(v))
                    })
                    .filter(|(k, _)| k != "page")
                    .collect()
            })
            .unwrap_or_default();

        Self {
            base: format!("{}{}", public_url.trim_end_matches('/'), uri.path()),
            pairs,
        }
    }

    /// Link to `page`; page 1 drops the `page` parameter
    pub fn link(&self, page: u64) -> String {
        let mut parts: Vec<String> = self
            .pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        if page > 1 {
            parts.push(format!("page={}", page));
        }

        if parts.is_empty() {
            self.base.clone()
        } else {
            format!("{}?{}", self.base, parts.join("&"))
        }
    }
}

fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_clamp_page_rules() {
        assert_eq!(clamp_page(None, 5), 1);
        assert_eq!(clamp_page(Some("abc"), 5), 1);
        assert_eq!(clamp_page(Some("0"), 5), 1);
        assert_eq!(clamp_page(Some("-3"), 5), 1);
        assert_eq!(clamp_page(Some("3"), 5), 3);
        assert_eq!(clamp_page(Some("99"), 5), 5);
    }

    #[test]
    fn test_page_size_override() {
        assert_eq!(PageSize::Standard.resolve(None), 20);
        assert_eq!(PageSize::Standard.resolve(Some("50")), 50);
        assert_eq!(PageSize::Standard.resolve(Some("500")), 100);
        assert_eq!(PageSize::Standard.resolve(Some("0")), 20);
        assert_eq!(PageSize::Standard.resolve(Some("ten")), 20);
        assert_eq!(PageSize::Fixed(12).resolve(Some("50")), 12);
    }

    #[test]
    fn test_empty_listing_has_one_page() {
        let window = PageWindow::resolve(&PageQuery::first(), PageSize::Fixed(10), 0);
        assert_eq!(window.num_pages, 1);
        assert_eq!(window.page, 1);
        assert!(!window.has_next());
        assert!(!window.has_previous());
    }

    #[test]
    fn test_links_keep_other_params() {
        let uri: Uri = "/api/posts/explore/?page=2&page_size=5&q=sun+set"
            .parse()
            .unwrap();
        let links = PageLinks::new("http://localhost:8000/", &uri);

        assert_eq!(
            links.link(3),
            "http://localhost:8000/api/posts/explore/?page_size=5&q=sun%20set&page=3"
        );
        assert_eq!(
            links.link(1),
            "http://localhost:8000/api/posts/explore/?page_size=5&q=sun%20set"
        );
    }

    #[test]
    fn test_envelope_links() {
        let uri: Uri = "/api/posts/feed/?page=2".parse().unwrap();
        let links = PageLinks::new("http://localhost:8000", &uri);
        let query = PageQuery {
            page: Some("2".to_string()),
            page_size: None,
        };
        let window = PageWindow::resolve(&query, PageSize::Fixed(10), 25);
        let envelope = Page {
            items: vec![1, 2, 3],
            window,
        }
        .into_envelope(&links);

        assert_eq!(envelope.count, 25);
        assert_eq!(
            envelope.next.as_deref(),
            Some("http://localhost:8000/api/posts/feed/?page=3")
        );
        assert_eq!(
            envelope.previous.as_deref(),
            Some("http://localhost:8000/api/posts/feed/")
        );
    }

    #[test]
    fn test_paginate_in_memory() {
        let query = PageQuery {
            page: Some("3".to_string()),
            page_size: Some("2".to_string()),
        };
        let page = Page::paginate((1..=5).collect(), &query, PageSize::Standard);
        assert_eq!(page.items, vec![5]);
        assert_eq!(page.window.total, 5);
        assert!(!page.window.has_next());
    }

    proptest! {
        #[test]
        fn prop_clamped_page_is_in_range(raw in ".*", total in 0u64..10_000, size in 1u64..150) {
            let pages = num_pages(total, size);
            let page = clamp_page(Some(raw.as_str()), pages);
            prop_assert!(page >= 1 && page <= pages);
        }

        #[test]
        fn prop_numeric_page_is_in_range(n in any::<i64>(), total in 0u64..10_000) {
            let query = PageQuery { page: Some(n.to_string()), page_size: None };
            let window = PageWindow::resolve(&query, PageSize::Standard, total);
            prop_assert!(window.page >= 1 && window.page <= window.num_pages);
            prop_assert!(window.offset() >= 0);
        }
    }
}
