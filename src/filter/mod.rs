pub mod error;
pub mod filter;
pub mod filter_order;
pub mod filter_where;
pub mod query;
pub mod tables;
pub mod types;

pub use error::FilterError;
pub use filter::Filter;
pub use query::{text_filter, CatalogItemQuery, Pagination, ResourceQuery, SortSpec};
pub use types::*;
