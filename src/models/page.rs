use serde::Serialize;
use utoipa::ToSchema;

use super::catalog_item::CatalogItem;
use super::resource::Resource;

/// One page of a filtered, sorted listing
#[derive(Debug, Clone, Serialize, ToSchema)]
#[aliases(CatalogItemPage = Page<CatalogItem>, ResourcePage = Page<Resource>)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, page: u32, per_page: u32) -> Self {
        let total_pages = if per_page == 0 || total <= 0 {
            0
        } else {
            ((total as u64 + per_page as u64 - 1) / per_page as u64) as u32
        };
        Self { items, total, page, per_page, total_pages }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(Page::<u8>::new(vec![], 0, 1, 10).total_pages, 0);
        assert_eq!(Page::<u8>::new(vec![], 10, 1, 10).total_pages, 1);
        assert_eq!(Page::<u8>::new(vec![], 11, 1, 10).total_pages, 2);
    }
}
