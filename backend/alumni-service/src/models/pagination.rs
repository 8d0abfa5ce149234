use serde::Serialize;

pub const MAX_PAGE_SIZE: i64 = 100;

/// Highest page index accepted; keeps `page * size` and `page + 1` in range.
pub const MAX_PAGE_INDEX: i64 = i64::MAX / MAX_PAGE_SIZE;

/// Zero-based page request, already normalised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
}

impl PageRequest {
    /// Missing or negative page becomes 0 and pages past `MAX_PAGE_INDEX`
    /// are capped; size falls back to `default_size` and is clamped to
    /// `1..=MAX_PAGE_SIZE`.
    pub fn normalize(page: Option<i64>, size: Option<i64>, default_size: i64) -> Self {
        let page = page.filter(|p| *p >= 0).unwrap_or(0).min(MAX_PAGE_INDEX);
        let size = size.unwrap_or(default_size).clamp(1, MAX_PAGE_SIZE);
        Self { page, size }
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_mul(self.size)
    }

    /// Whether a page exists after this one.
    pub fn has_next(&self, total_pages: i64) -> bool {
        self.page.saturating_add(1) < total_pages
    }

    pub fn total_pages(&self, total_elements: i64) -> i64 {
        if total_elements <= 0 {
            0
        } else {
            (total_elements + self.size - 1) / self.size
        }
    }
}

/// Page envelope used by list endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: i64,
    pub total_pages: i64,
    pub size: i64,
    pub number: i64,
    pub number_of_elements: i64,
    pub first: bool,
    pub last: bool,
    pub empty: bool,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: i64) -> Self {
        let total_pages = request.total_pages(total_elements);
        let number_of_elements = content.len() as i64;
        Self {
            empty: content.is_empty(),
            content,
            total_elements,
            total_pages,
            size: request.size,
            number: request.page,
            number_of_elements,
            first: request.page == 0,
            last: !request.has_next(total_pages),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            size: self.size,
            number: self.number,
            number_of_elements: self.number_of_elements,
            first: self.first,
            last: self.last,
            empty: self.empty,
        }
    }
}
