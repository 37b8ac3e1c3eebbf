use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::models::{CartLedger, ServiceError, ServiceResult};
use crate::repositories::CatalogRepository;
use crate::services::PricingConverter;

/// In-process store of cart ledgers, one per user session.
///
/// Sessions never share a ledger and each user action is a discrete
/// operation; the lock only guards the map between independent sessions.
#[derive(Default)]
pub struct CartStore {
    carts: RwLock<HashMap<String, CartLedger>>,
}

impl CartStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a closure against a session's ledger without creating it
    pub async fn read<R>(&self, session_id: &str, f: impl FnOnce(&CartLedger) -> R) -> R {
        let carts = self.carts.read().await;
        match carts.get(session_id) {
            Some(ledger) => f(ledger),
            None => f(&CartLedger::new()),
        }
    }

    /// Run a closure against a session's ledger, creating it on first use
    pub async fn mutate<R>(&self, session_id: &str, f: impl FnOnce(&mut CartLedger) -> R) -> R {
        let mut carts = self.carts.write().await;
        f(carts.entry(session_id.to_string()).or_default())
    }

    /// Clone the current ledger state for a session
    pub async fn snapshot(&self, session_id: &str) -> CartLedger {
        self.read(session_id, CartLedger::clone).await
    }

    /// Empty the ledger of a session
    pub async fn clear(&self, session_id: &str) {
        let mut carts = self.carts.write().await;
        if let Some(ledger) = carts.get_mut(session_id) {
            ledger.clear();
        }
    }

    /// Number of sessions currently holding a ledger
    pub async fn session_count(&self) -> usize {
        self.carts.read().await.len()
    }
}

/// Rendered view of a single cart entry, with display-currency pricing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartEntryView {
    pub menu_item_id: i64,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub display_unit_price: String,
    pub line_total: Decimal,
    pub display_line_total: String,
}

/// Rendered view of a session's cart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartView {
    pub session_id: String,
    pub entries: Vec<CartEntryView>,
    pub total_count: u32,
    pub total_amount: Decimal,
    pub display_total_amount: Decimal,
    pub display_total: String,
}

/// Service for managing session carts.
///
/// Menu items are resolved through the catalog at add time and snapshotted
/// into the ledger, so later catalog price changes do not move existing
/// cart lines.
pub struct CartService {
    store: Arc<CartStore>,
    catalog_repository: Arc<dyn CatalogRepository>,
    pricing: PricingConverter,
}

impl CartService {
    /// Create a new CartService
    pub fn new(
        store: Arc<CartStore>,
        catalog_repository: Arc<dyn CatalogRepository>,
        pricing: PricingConverter,
    ) -> Self {
        Self {
            store,
            catalog_repository,
            pricing,
        }
    }

    /// Get the rendered cart for a session
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn get_cart(&self, session_id: &str) -> ServiceResult<CartView> {
        self.validate_session_id(session_id)?;

        let ledger = self.store.snapshot(session_id).await;
        Ok(self.ledger_to_view(session_id, &ledger))
    }

    /// Add one unit of a menu item to a session's cart
    #[instrument(skip(self), fields(session_id = %session_id, menu_item_id = menu_item_id))]
    pub async fn add_item(&self, session_id: &str, menu_item_id: i64) -> ServiceResult<CartView> {
        info!("Adding item to cart");

        self.validate_session_id(session_id)?;

        let item = match self.catalog_repository.find_menu_item(menu_item_id).await {
            Ok(Some(item)) => item,
            Ok(None) => return Err(ServiceError::MenuItemNotFound { id: menu_item_id }),
            Err(source) => return Err(ServiceError::CatalogUnavailable { source }),
        };

        let ledger = self
            .store
            .mutate(session_id, |ledger| {
                ledger.add(item);
                ledger.clone()
            })
            .await;

        info!(total_count = ledger.total_count(), "Item added to cart");
        Ok(self.ledger_to_view(session_id, &ledger))
    }

    /// Apply a signed quantity delta to a cart entry. An absent entry is a
    /// no-op; a delta landing at or below zero removes the entry.
    #[instrument(skip(self), fields(session_id = %session_id, menu_item_id = menu_item_id, delta = delta))]
    pub async fn update_item(
        &self,
        session_id: &str,
        menu_item_id: i64,
        delta: i64,
    ) -> ServiceResult<CartView> {
        info!("Updating cart item quantity");

        self.validate_session_id(session_id)?;

        let ledger = self
            .store
            .mutate(session_id, |ledger| {
                ledger.update_quantity(menu_item_id, delta);
                ledger.clone()
            })
            .await;

        Ok(self.ledger_to_view(session_id, &ledger))
    }

    /// Remove an entry from a session's cart
    #[instrument(skip(self), fields(session_id = %session_id, menu_item_id = menu_item_id))]
    pub async fn remove_item(
        &self,
        session_id: &str,
        menu_item_id: i64,
    ) -> ServiceResult<CartView> {
        info!("Removing item from cart");

        self.validate_session_id(session_id)?;

        let ledger = self
            .store
            .mutate(session_id, |ledger| {
                ledger.remove(menu_item_id);
                ledger.clone()
            })
            .await;

        Ok(self.ledger_to_view(session_id, &ledger))
    }

    /// Empty a session's cart
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn clear_cart(&self, session_id: &str) -> ServiceResult<()> {
        info!("Clearing cart");

        self.validate_session_id(session_id)?;
        self.store.clear(session_id).await;

        Ok(())
    }

    /// Render a ledger with display-currency pricing
    fn ledger_to_view(&self, session_id: &str, ledger: &CartLedger) -> CartView {
        let entries = ledger
            .entries()
            .map(|entry| {
                let display_unit = self.pricing.convert(entry.item.price);
                let display_line = self.pricing.convert(entry.line_total());

                CartEntryView {
                    menu_item_id: entry.item.id,
                    name: entry.item.name.clone(),
                    quantity: entry.quantity,
                    unit_price: entry.item.price,
                    display_unit_price: self.pricing.format(display_unit),
                    line_total: entry.line_total(),
                    display_line_total: self.pricing.format(display_line),
                }
            })
            .collect();

        let total_amount = ledger.total_amount();
        let display_total_amount = self.pricing.convert(total_amount);

        CartView {
            session_id: session_id.to_string(),
            entries,
            total_count: ledger.total_count(),
            total_amount,
            display_total_amount,
            display_total: self.pricing.format(display_total_amount),
        }
    }

    /// Validate a session id
    fn validate_session_id(&self, session_id: &str) -> ServiceResult<()> {
        if session_id.trim().is_empty() {
            return Err(ServiceError::Validation {
                message: "Session ID cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        MenuItem, NewMenuItem, NewRestaurant, RepositoryError, RepositoryResult, Restaurant,
    };
    use async_trait::async_trait;
    use mockall::mock;
    use rust_decimal_macros::dec;

    mock! {
        TestCatalogRepository {}

        #[async_trait]
        impl CatalogRepository for TestCatalogRepository {
            async fn find_restaurants(&self) -> RepositoryResult<Vec<Restaurant>>;
            async fn find_restaurant(&self, id: i64) -> RepositoryResult<Option<Restaurant>>;
            async fn find_menu_items(&self, restaurant_id: i64) -> RepositoryResult<Vec<MenuItem>>;
            async fn find_menu_item(&self, id: i64) -> RepositoryResult<Option<MenuItem>>;
            async fn create_restaurant(&self, new: NewRestaurant) -> RepositoryResult<Restaurant>;
            async fn create_menu_item(&self, new: NewMenuItem) -> RepositoryResult<MenuItem>;
        }
    }

    fn menu_item(id: i64, price: Decimal) -> MenuItem {
        MenuItem {
            id,
            restaurant_id: 1,
            name: format!("Dish {}", id),
            description: "A test dish".to_string(),
            price,
            image_url: "https://example.com/dish.jpg".to_string(),
        }
    }

    fn service_with(mock_repo: MockTestCatalogRepository) -> CartService {
        CartService::new(
            Arc::new(CartStore::new()),
            Arc::new(mock_repo),
            PricingConverter::new(dec!(90), "₹"),
        )
    }

    #[tokio::test]
    async fn test_get_cart_for_fresh_session_is_empty() {
        let service = service_with(MockTestCatalogRepository::new());

        let view = service.get_cart("session-1").await.unwrap();

        assert!(view.entries.is_empty());
        assert_eq!(view.total_count, 0);
        assert_eq!(view.display_total, "₹0");
    }

    #[tokio::test]
    async fn test_add_item_snapshots_catalog_price() {
        let mut mock_repo = MockTestCatalogRepository::new();
        mock_repo
            .expect_find_menu_item()
            .times(1)
            .returning(|id| Ok(Some(menu_item(id, dec!(10.00)))));

        let service = service_with(mock_repo);
        let view = service.add_item("session-1", 11).await.unwrap();

        assert_eq!(view.total_count, 1);
        assert_eq!(view.entries[0].unit_price, dec!(10.00));
        assert_eq!(view.entries[0].display_unit_price, "₹900");
        assert_eq!(view.display_total, "₹900");
    }

    #[tokio::test]
    async fn test_add_unknown_item_fails() {
        let mut mock_repo = MockTestCatalogRepository::new();
        mock_repo
            .expect_find_menu_item()
            .times(1)
            .returning(|_| Ok(None));

        let service = service_with(mock_repo);

        match service.add_item("session-1", 99).await.unwrap_err() {
            ServiceError::MenuItemNotFound { id } => assert_eq!(id, 99),
            other => panic!("Expected MenuItemNotFound, got {}", other),
        }
    }

    #[tokio::test]
    async fn test_add_with_catalog_down_surfaces_unavailable() {
        let mut mock_repo = MockTestCatalogRepository::new();
        mock_repo
            .expect_find_menu_item()
            .times(1)
            .returning(|_| Err(RepositoryError::ConnectionFailed));

        let service = service_with(mock_repo);

        match service.add_item("session-1", 11).await.unwrap_err() {
            ServiceError::CatalogUnavailable { .. } => {}
            other => panic!("Expected CatalogUnavailable, got {}", other),
        }
    }

    #[tokio::test]
    async fn test_update_item_delta_and_removal() {
        let mut mock_repo = MockTestCatalogRepository::new();
        mock_repo
            .expect_find_menu_item()
            .times(1)
            .returning(|id| Ok(Some(menu_item(id, dec!(5.00)))));

        let service = service_with(mock_repo);
        service.add_item("session-1", 11).await.unwrap();

        let view = service.update_item("session-1", 11, 2).await.unwrap();
        assert_eq!(view.total_count, 3);

        let view = service.update_item("session-1", 11, -3).await.unwrap();
        assert!(view.entries.is_empty());
    }

    #[tokio::test]
    async fn test_update_absent_item_is_noop() {
        let service = service_with(MockTestCatalogRepository::new());

        let view = service.update_item("session-1", 42, -1).await.unwrap();

        assert!(view.entries.is_empty());
        assert_eq!(view.total_count, 0);
    }

    #[tokio::test]
    async fn test_sessions_do_not_share_ledgers() {
        let mut mock_repo = MockTestCatalogRepository::new();
        mock_repo
            .expect_find_menu_item()
            .times(1)
            .returning(|id| Ok(Some(menu_item(id, dec!(5.00)))));

        let service = service_with(mock_repo);
        service.add_item("session-1", 11).await.unwrap();

        let other = service.get_cart("session-2").await.unwrap();
        assert!(other.entries.is_empty());
    }

    #[tokio::test]
    async fn test_clear_cart() {
        let mut mock_repo = MockTestCatalogRepository::new();
        mock_repo
            .expect_find_menu_item()
            .times(1)
            .returning(|id| Ok(Some(menu_item(id, dec!(5.00)))));

        let service = service_with(mock_repo);
        service.add_item("session-1", 11).await.unwrap();

        service.clear_cart("session-1").await.unwrap();

        let view = service.get_cart("session-1").await.unwrap();
        assert!(view.entries.is_empty());
    }

    #[tokio::test]
    async fn test_empty_session_id_is_rejected() {
        let service = service_with(MockTestCatalogRepository::new());

        assert!(service.get_cart("").await.is_err());
        assert!(service.add_item("  ", 1).await.is_err());
    }
}
