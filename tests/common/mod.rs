use async_trait::async_trait;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use foodcosta_rs::handlers::{
    api, health_check, metrics_handler, request_validation_middleware,
    security_headers_middleware,
};
use foodcosta_rs::models::{
    MenuItem, NewMenuItem, NewOrder, NewOrderLine, NewRestaurant, Order, OrderLine,
    RepositoryError, RepositoryResult, Restaurant,
};
use foodcosta_rs::observability::Metrics;
use foodcosta_rs::repositories::{CatalogRepository, OrderRepository};
use foodcosta_rs::services::{CartService, CartStore, CatalogService, OrderService, PricingConverter};

/// In-memory catalog backend. `set_failing(true)` makes every call fail the
/// way an unreachable database would.
pub struct InMemoryCatalogRepository {
    restaurants: Mutex<Vec<Restaurant>>,
    menu_items: Mutex<Vec<MenuItem>>,
    next_id: AtomicI64,
    failing: AtomicBool,
}

impl InMemoryCatalogRepository {
    pub fn new() -> Self {
        Self {
            restaurants: Mutex::new(Vec::new()),
            menu_items: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            failing: AtomicBool::new(false),
        }
    }

    /// Two restaurants with a small menu each
    pub fn with_fixtures() -> Self {
        let repo = Self::new();

        {
            let mut restaurants = repo.restaurants.lock().unwrap();
            restaurants.push(Restaurant {
                id: 1,
                name: "Spice Route".to_string(),
                description: "North Indian classics".to_string(),
                rating: dec!(4.5),
                delivery_time: "30-40 min".to_string(),
                image_url: "https://example.com/spice-route.jpg".to_string(),
            });
            restaurants.push(Restaurant {
                id: 2,
                name: "Pasta Lane".to_string(),
                description: "Fresh pasta and pizza".to_string(),
                rating: dec!(4.2),
                delivery_time: "25-35 min".to_string(),
                image_url: "https://example.com/pasta-lane.jpg".to_string(),
            });

            let mut items = repo.menu_items.lock().unwrap();
            items.push(MenuItem {
                id: 11,
                restaurant_id: 1,
                name: "Butter Chicken".to_string(),
                description: "Creamy tomato gravy".to_string(),
                price: dec!(10.00),
                image_url: "https://example.com/butter-chicken.jpg".to_string(),
            });
            items.push(MenuItem {
                id: 12,
                restaurant_id: 1,
                name: "Garlic Naan".to_string(),
                description: "Leavened flatbread".to_string(),
                price: dec!(1.50),
                image_url: "https://example.com/garlic-naan.jpg".to_string(),
            });
            items.push(MenuItem {
                id: 21,
                restaurant_id: 2,
                name: "Margherita Pizza".to_string(),
                description: "Tomato, mozzarella, basil".to_string(),
                price: dec!(7.25),
                image_url: "https://example.com/margherita.jpg".to_string(),
            });
        }

        repo.next_id.store(100, Ordering::SeqCst);
        repo
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Simulate a catalog price edit after items were added to carts
    pub fn set_menu_item_price(&self, id: i64, price: Decimal) {
        let mut items = self.menu_items.lock().unwrap();
        if let Some(item) = items.iter_mut().find(|i| i.id == id) {
            item.price = price;
        }
    }

    fn check_available(&self) -> RepositoryResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(RepositoryError::ConnectionFailed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn find_restaurants(&self) -> RepositoryResult<Vec<Restaurant>> {
        self.check_available()?;
        Ok(self.restaurants.lock().unwrap().clone())
    }

    async fn find_restaurant(&self, id: i64) -> RepositoryResult<Option<Restaurant>> {
        self.check_available()?;
        Ok(self
            .restaurants
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn find_menu_items(&self, restaurant_id: i64) -> RepositoryResult<Vec<MenuItem>> {
        self.check_available()?;
        Ok(self
            .menu_items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.restaurant_id == restaurant_id)
            .cloned()
            .collect())
    }

    async fn find_menu_item(&self, id: i64) -> RepositoryResult<Option<MenuItem>> {
        self.check_available()?;
        Ok(self
            .menu_items
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == id)
            .cloned())
    }

    async fn create_restaurant(&self, new: NewRestaurant) -> RepositoryResult<Restaurant> {
        self.check_available()?;
        let restaurant = Restaurant {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: new.name,
            description: new.description,
            rating: new.rating,
            delivery_time: new.delivery_time,
            image_url: new.image_url,
        };
        self.restaurants.lock().unwrap().push(restaurant.clone());
        Ok(restaurant)
    }

    async fn create_menu_item(&self, new: NewMenuItem) -> RepositoryResult<MenuItem> {
        self.check_available()?;
        let item = MenuItem {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            restaurant_id: new.restaurant_id,
            name: new.name,
            description: new.description,
            price: new.price,
            image_url: new.image_url,
        };
        self.menu_items.lock().unwrap().push(item.clone());
        Ok(item)
    }
}

/// In-memory order backend with the same all-or-nothing write semantics as
/// the transactional Postgres implementation.
pub struct InMemoryOrderRepository {
    orders: Mutex<Vec<Order>>,
    lines: Mutex<Vec<OrderLine>>,
    next_order_id: AtomicI64,
    next_line_id: AtomicI64,
    failing: AtomicBool,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self {
            orders: Mutex::new(Vec::new()),
            lines: Mutex::new(Vec::new()),
            next_order_id: AtomicI64::new(500),
            next_line_id: AtomicI64::new(1),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn order_count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create_order(
        &self,
        order: &NewOrder,
        lines: &[NewOrderLine],
    ) -> RepositoryResult<i64> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepositoryError::ConnectionFailed);
        }

        let order_id = self.next_order_id.fetch_add(1, Ordering::SeqCst);
        self.orders.lock().unwrap().push(Order {
            id: order_id,
            customer_name: order.customer_name.clone(),
            customer_email: order.customer_email.clone(),
            customer_phone: order.customer_phone.clone(),
            delivery_address: order.delivery_address.clone(),
            total_amount: order.total_amount,
            status: order.status,
            created_at: Utc::now(),
        });

        let mut stored_lines = self.lines.lock().unwrap();
        for line in lines {
            stored_lines.push(OrderLine {
                id: self.next_line_id.fetch_add(1, Ordering::SeqCst),
                order_id,
                menu_item_id: line.menu_item_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
            });
        }

        Ok(order_id)
    }

    async fn find_order(&self, id: i64) -> RepositoryResult<Option<Order>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepositoryError::ConnectionFailed);
        }
        Ok(self
            .orders
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.id == id)
            .cloned())
    }

    async fn find_order_lines(&self, order_id: i64) -> RepositoryResult<Vec<OrderLine>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepositoryError::ConnectionFailed);
        }
        Ok(self
            .lines
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.order_id == order_id)
            .cloned()
            .collect())
    }
}

/// Test environment: the real router wired over in-memory backends
pub struct TestEnvironment {
    pub app: Router,
    pub catalog_repository: Arc<InMemoryCatalogRepository>,
    pub order_repository: Arc<InMemoryOrderRepository>,
}

pub fn build_test_environment() -> TestEnvironment {
    let metrics = Arc::new(Metrics::new().expect("metrics registry"));
    let catalog_repository = Arc::new(InMemoryCatalogRepository::with_fixtures());
    let order_repository = Arc::new(InMemoryOrderRepository::new());

    let pricing = PricingConverter::new(dec!(90), "₹");
    let cart_store = Arc::new(CartStore::new());

    let catalog_service = Arc::new(CatalogService::new(catalog_repository.clone()));
    let cart_service = Arc::new(CartService::new(
        cart_store.clone(),
        catalog_repository.clone(),
        pricing.clone(),
    ));
    let order_service = Arc::new(OrderService::new(cart_store, order_repository.clone(), pricing));

    let api_state = api::ApiState {
        catalog_service,
        cart_service,
        order_service,
        metrics: metrics.clone(),
    };

    let app = Router::new()
        .route("/health/status", get(health_check))
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
        .route("/api/restaurants", get(api::list_restaurants))
        .route("/api/restaurants/:restaurant_id", get(api::get_restaurant))
        .route(
            "/api/restaurants/:restaurant_id/menu",
            get(api::list_menu_items),
        )
        .route("/api/cart/:session_id", get(api::get_cart))
        .route("/api/cart/:session_id/items", post(api::add_cart_item))
        .route(
            "/api/cart/:session_id/items/:menu_item_id",
            put(api::update_cart_item).delete(api::remove_cart_item),
        )
        .route("/api/cart/:session_id/clear", post(api::clear_cart))
        .route("/api/cart/:session_id/checkout", post(api::checkout_cart))
        .route("/api/orders/:order_id", get(api::get_order))
        .with_state(api_state)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_validation_middleware));

    TestEnvironment {
        app,
        catalog_repository,
        order_repository,
    }
}
