use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{info, instrument, Instrument};

use crate::models::{MenuItem, NewMenuItem, NewRestaurant, RepositoryResult, Restaurant};

/// Trait defining the interface for catalog data access operations.
///
/// The storefront only needs select-all, select-by-equality and
/// insert-returning-id against the `restaurants` and `menu_items` tables;
/// substring search is applied in-process by the catalog service.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Fetch all restaurants
    async fn find_restaurants(&self) -> RepositoryResult<Vec<Restaurant>>;

    /// Fetch a restaurant by id
    async fn find_restaurant(&self, id: i64) -> RepositoryResult<Option<Restaurant>>;

    /// Fetch all menu items belonging to a restaurant
    async fn find_menu_items(&self, restaurant_id: i64) -> RepositoryResult<Vec<MenuItem>>;

    /// Fetch a menu item by id
    async fn find_menu_item(&self, id: i64) -> RepositoryResult<Option<MenuItem>>;

    /// Insert a restaurant, returning the stored row with its generated id
    async fn create_restaurant(&self, new: NewRestaurant) -> RepositoryResult<Restaurant>;

    /// Insert a menu item, returning the stored row with its generated id
    async fn create_menu_item(&self, new: NewMenuItem) -> RepositoryResult<MenuItem>;
}

/// Postgres implementation of the CatalogRepository trait
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    /// Create a new Postgres catalog repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a database client span for a catalog query
    fn query_span(&self, operation: &str, table: &str) -> tracing::Span {
        tracing::info_span!(
            "Postgres",
            "otel.kind" = "client",
            "otel.name" = format!("{} {}", operation, table),
            "db.system" = "postgresql",
            "db.operation" = operation,
            "db.sql.table" = table,
        )
    }
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    #[instrument(skip(self))]
    async fn find_restaurants(&self) -> RepositoryResult<Vec<Restaurant>> {
        let span = self.query_span("SELECT", "restaurants");

        let restaurants = async {
            sqlx::query_as::<_, Restaurant>(
                "SELECT id, name, description, rating, delivery_time, image_url \
                 FROM restaurants ORDER BY id",
            )
            .fetch_all(&self.pool)
            .await
        }
        .instrument(span)
        .await?;

        info!("Fetched {} restaurants", restaurants.len());
        Ok(restaurants)
    }

    #[instrument(skip(self), fields(restaurant_id = id))]
    async fn find_restaurant(&self, id: i64) -> RepositoryResult<Option<Restaurant>> {
        let span = self.query_span("SELECT", "restaurants");

        let restaurant = async {
            sqlx::query_as::<_, Restaurant>(
                "SELECT id, name, description, rating, delivery_time, image_url \
                 FROM restaurants WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
        }
        .instrument(span)
        .await?;

        Ok(restaurant)
    }

    #[instrument(skip(self), fields(restaurant_id = restaurant_id))]
    async fn find_menu_items(&self, restaurant_id: i64) -> RepositoryResult<Vec<MenuItem>> {
        let span = self.query_span("SELECT", "menu_items");

        let items = async {
            sqlx::query_as::<_, MenuItem>(
                "SELECT id, restaurant_id, name, description, price, image_url \
                 FROM menu_items WHERE restaurant_id = $1 ORDER BY id",
            )
            .bind(restaurant_id)
            .fetch_all(&self.pool)
            .await
        }
        .instrument(span)
        .await?;

        info!("Fetched {} menu items", items.len());
        Ok(items)
    }

    #[instrument(skip(self), fields(menu_item_id = id))]
    async fn find_menu_item(&self, id: i64) -> RepositoryResult<Option<MenuItem>> {
        let span = self.query_span("SELECT", "menu_items");

        let item = async {
            sqlx::query_as::<_, MenuItem>(
                "SELECT id, restaurant_id, name, description, price, image_url \
                 FROM menu_items WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
        }
        .instrument(span)
        .await?;

        Ok(item)
    }

    #[instrument(skip(self, new), fields(name = %new.name))]
    async fn create_restaurant(&self, new: NewRestaurant) -> RepositoryResult<Restaurant> {
        let span = self.query_span("INSERT", "restaurants");

        let restaurant = async {
            sqlx::query_as::<_, Restaurant>(
                "INSERT INTO restaurants (name, description, rating, delivery_time, image_url) \
                 VALUES ($1, $2, $3, $4, $5) \
                 RETURNING id, name, description, rating, delivery_time, image_url",
            )
            .bind(&new.name)
            .bind(&new.description)
            .bind(new.rating)
            .bind(&new.delivery_time)
            .bind(&new.image_url)
            .fetch_one(&self.pool)
            .await
        }
        .instrument(span)
        .await?;

        info!(restaurant_id = restaurant.id, "Restaurant created");
        Ok(restaurant)
    }

    #[instrument(skip(self, new), fields(restaurant_id = new.restaurant_id, name = %new.name))]
    async fn create_menu_item(&self, new: NewMenuItem) -> RepositoryResult<MenuItem> {
        let span = self.query_span("INSERT", "menu_items");

        let item = async {
            sqlx::query_as::<_, MenuItem>(
                "INSERT INTO menu_items (restaurant_id, name, description, price, image_url) \
                 VALUES ($1, $2, $3, $4, $5) \
                 RETURNING id, restaurant_id, name, description, price, image_url",
            )
            .bind(new.restaurant_id)
            .bind(&new.name)
            .bind(&new.description)
            .bind(new.price)
            .bind(&new.image_url)
            .fetch_one(&self.pool)
            .await
        }
        .instrument(span)
        .await?;

        info!(menu_item_id = item.id, "Menu item created");
        Ok(item)
    }
}
