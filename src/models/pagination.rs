//! 分页相关的数据结构

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub current_page: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub total_items: u64,
}

impl PaginationMeta {
    pub fn new(current_page: u64, page_size: u64, total_items: u64) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            total_items.div_ceil(page_size)
        };

        Self {
            current_page,
            page_size,
            total_pages,
            total_items,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: u64, page_size: u64, total_items: u64) -> Self {
        Self {
            data,
            pagination: PaginationMeta::new(page, page_size, total_items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_meta() {
        let meta = PaginationMeta::new(2, 10, 25);
        assert_eq!(meta.current_page, 2);
        assert_eq!(meta.page_size, 10);
        assert_eq!(meta.total_items, 25);
        assert_eq!(meta.total_pages, 3);
    }

    #[test]
    fn test_total_pages_is_ceiling() {
        for page_size in 1..=MAX_PAGE_SIZE {
            for total in [0u64, 1, 9, 10, 11, 99, 100, 101, 1000] {
                let meta = PaginationMeta::new(1, page_size, total);
                let expected = (total as f64 / page_size as f64).ceil() as u64;
                assert_eq!(meta.total_pages, expected, "total={total} size={page_size}");
            }
        }
    }

    #[test]
    fn test_empty_result_has_zero_pages() {
        let resp: PaginatedResponse<i32> = PaginatedResponse::new(vec![], 1, 10, 0);
        assert_eq!(resp.pagination.total_pages, 0);
        assert!(resp.data.is_empty());
    }
}
