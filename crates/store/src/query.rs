use serde::{Deserialize, Serialize};

/// A zero-based page request.
///
/// The size is clamped to `1..=MAX_SIZE` on construction so backends can use
/// it as a `LIMIT` without further checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    size: u32,
}

impl PageRequest {
    pub const DEFAULT_SIZE: u32 = 10;
    pub const MAX_SIZE: u32 = 100;

    /// Creates a request for `page` with `size` items per page.
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.clamp(1, Self::MAX_SIZE),
        }
    }

    /// Creates a request for the first page with the default size.
    pub fn first() -> Self {
        Self::default()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Number of items to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_SIZE)
    }
}

/// One page of results plus the size of the whole result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_items: u64,
}

impl<T> Page<T> {
    /// Cuts `request`'s page out of an already sorted full result set.
    pub fn slice(all: Vec<T>, request: PageRequest) -> Self {
        let total_items = all.len() as u64;
        let items = all
            .into_iter()
            .skip(usize::try_from(request.offset()).unwrap_or(usize::MAX))
            .take(request.size() as usize)
            .collect();
        Self {
            items,
            page: request.page(),
            size: request.size(),
            total_items,
        }
    }

    pub fn total_pages(&self) -> u64 {
        self.total_items.div_ceil(u64::from(self.size.max(1)))
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page) + 1 < self.total_pages()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_items: self.total_items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_is_clamped() {
        assert_eq!(PageRequest::new(0, 0).size(), 1);
        assert_eq!(PageRequest::new(0, 500).size(), PageRequest::MAX_SIZE);
        assert_eq!(PageRequest::default().size(), 10);
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageRequest::new(3, 20).offset(), 60);
        assert_eq!(PageRequest::first().offset(), 0);
    }

    #[test]
    fn test_slice_middle_and_last_page() {
        let all: Vec<u32> = (0..25).collect();

        let page = Page::slice(all.clone(), PageRequest::new(1, 10));
        assert_eq!(page.items, (10..20).collect::<Vec<_>>());
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());

        let last = Page::slice(all, PageRequest::new(2, 10));
        assert_eq!(last.items.len(), 5);
        assert!(!last.has_next());
    }

    #[test]
    fn test_slice_past_the_end_is_empty() {
        let page = Page::slice(vec![1, 2, 3], PageRequest::new(5, 10));
        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 3);
    }
}
