// Services module - business logic layer

pub mod cart_service;
pub mod catalog_service;
pub mod order_service;
pub mod pricing;

pub use cart_service::{CartEntryView, CartService, CartStore, CartView};
pub use catalog_service::CatalogService;
pub use order_service::OrderService;
pub use pricing::PricingConverter;
