use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u64 = 5;

/// Page number as requested by the client, before it is checked against the
/// size of the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest(i64);

impl PageRequest {
    pub fn first() -> Self {
        Self(1)
    }

    pub fn number(n: i64) -> Self {
        Self(n)
    }

    /// Absent or non-integer input means page 1.
    pub fn parse(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.trim().parse::<i64>().ok())
            .map(Self)
            .unwrap_or_else(Self::first)
    }

    /// Resolves to a valid 1-based page number; anything out of range lands
    /// on the last page.
    pub fn resolve(self, total_items: u64, per_page: u64) -> PageInfo {
        let num_pages = num_pages(total_items, per_page);
        let number = match u64::try_from(self.0) {
            Ok(n) if (1..=num_pages).contains(&n) => n,
            _ => num_pages,
        };
        PageInfo::new(number, num_pages, total_items)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// An empty listing still has one (empty) page.
pub fn num_pages(total_items: u64, per_page: u64) -> u64 {
    let per_page = per_page.max(1);
    total_items.div_ceil(per_page).max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub number: u64,
    pub num_pages: u64,
    pub total_items: u64,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page_number: Option<u64>,
    pub next_page_number: Option<u64>,
}

impl PageInfo {
    fn new(number: u64, num_pages: u64, total_items: u64) -> Self {
        let has_previous = number > 1;
        let has_next = number < num_pages;
        Self {
            number,
            num_pages,
            total_items,
            has_previous,
            has_next,
            previous_page_number: has_previous.then(|| number - 1),
            next_page_number: has_next.then(|| number + 1),
        }
    }

    /// Zero-based index as used by the database paginator.
    pub fn index(&self) -> u64 {
        self.number - 1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub info: PageInfo,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_falls_back_to_first_page() {
        assert_eq!(PageRequest::parse(None), PageRequest::first());
        assert_eq!(PageRequest::parse(Some("abc")), PageRequest::first());
        assert_eq!(PageRequest::parse(Some("2.5")), PageRequest::first());
        assert_eq!(PageRequest::parse(Some(" 3 ")), PageRequest::number(3));
    }

    #[test]
    fn test_out_of_range_clamps_to_last_page() {
        let info = PageRequest::number(40).resolve(12, 5);
        assert_eq!(info.number, 3);
        assert_eq!(info.num_pages, 3);
        assert!(!info.has_next);
        assert_eq!(info.previous_page_number, Some(2));

        assert_eq!(PageRequest::number(0).resolve(12, 5).number, 3);
        assert_eq!(PageRequest::number(-4).resolve(12, 5).number, 3);
    }

    #[test]
    fn test_middle_page() {
        let info = PageRequest::number(2).resolve(12, 5);
        assert_eq!(info.number, 2);
        assert!(info.has_previous && info.has_next);
        assert_eq!(info.next_page_number, Some(3));
        assert_eq!(info.index(), 1);
    }

    #[test]
    fn test_empty_listing_has_one_page() {
        let info = PageRequest::parse(Some("7")).resolve(0, 5);
        assert_eq!(info.number, 1);
        assert_eq!(info.num_pages, 1);
        assert!(!info.has_previous && !info.has_next);
    }

    #[test]
    fn test_exact_multiple() {
        assert_eq!(num_pages(10, 5), 2);
        assert_eq!(num_pages(11, 5), 3);
    }
}
