// Repositories module - data access layer

pub mod catalog_repository;
pub mod order_repository;

pub use catalog_repository::{CatalogRepository, PgCatalogRepository};
pub use order_repository::{OrderRepository, PgOrderRepository};

/// Embedded relational migrations for the storefront tables
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
