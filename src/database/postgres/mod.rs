//! sqlx-backed repositories

pub mod catalog;
pub mod resource;

pub use catalog::PgCatalogRepository;
pub use resource::PgResourceRepository;
