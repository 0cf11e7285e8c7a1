//! Paginated result wrapper.

use serde::Serialize;

/// Paginated response wrapper
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, page: u64, limit: u64, total: u64) -> Self {
        let total_pages = if limit > 0 { total.div_ceil(limit) } else { 0 };

        Self {
            data,
            pagination: PaginationMeta {
                page,
                limit,
                total,
                total_pages,
            },
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_round_up() {
        let page = Paginated::new(vec![1, 2], 1, 2, 5);
        assert_eq!(page.pagination.total_pages, 3);
        let empty: Paginated<u8> = Paginated::new(vec![], 1, 50, 0);
        assert_eq!(empty.pagination.total_pages, 0);
    }
}
