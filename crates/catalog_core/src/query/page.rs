use serde::Serialize;

/// One page of results plus the size of the full row set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number that was requested.
    pub page: u32,
    pub size: u32,
    /// Rows matching the query across all pages.
    pub total: u64,
}

impl<T> Page<T> {
    pub fn page_count(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.size))
    }

    pub fn has_next_page(&self) -> bool {
        u64::from(self.page) < self.page_count()
    }

    pub fn has_previous_page(&self) -> bool {
        self.page > 1
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Transforms every item, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Page;

    fn page(page: u32, total: u64) -> Page<u8> {
        Page {
            items: Vec::new(),
            page,
            size: 10,
            total,
        }
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page(1, 0).page_count(), 0);
        assert_eq!(page(1, 10).page_count(), 1);
        assert_eq!(page(1, 25).page_count(), 3);
    }

    #[test]
    fn navigation_flags_follow_position() {
        let middle = page(2, 25);
        assert!(middle.has_next_page());
        assert!(middle.has_previous_page());

        let last = page(3, 25);
        assert!(!last.has_next_page());

        let first = page(1, 25);
        assert!(!first.has_previous_page());
    }

    #[test]
    fn map_keeps_metadata() {
        let mapped = Page {
            items: vec![1_u8, 2],
            page: 2,
            size: 2,
            total: 7,
        }
        .map(|value| value.to_string());
        assert_eq!(mapped.items, vec!["1".to_string(), "2".to_string()]);
        assert_eq!((mapped.page, mapped.size, mapped.total), (2, 2, 7));
    }
}
