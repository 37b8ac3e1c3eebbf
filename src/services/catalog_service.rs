use std::sync::Arc;
use tracing::{instrument, warn};

use crate::models::{
    MenuItem, MenuListResponse, Restaurant, RestaurantListResponse, ServiceError, ServiceResult,
};
use crate::repositories::CatalogRepository;

/// Read-side service over the restaurant and menu-item catalog.
///
/// Listings degrade instead of failing: if the backend is unreachable the
/// caller receives an empty collection plus a non-fatal notice, so catalog
/// unavailability never takes the session down.
pub struct CatalogService {
    repository: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    /// Create a new CatalogService
    pub fn new(repository: Arc<dyn CatalogRepository>) -> Self {
        Self { repository }
    }

    /// List restaurants, optionally narrowed by a case-insensitive
    /// substring match on the name.
    #[instrument(skip(self), fields(search = search))]
    pub async fn list_restaurants(&self, search: Option<&str>) -> RestaurantListResponse {
        crate::info_with_trace!("Listing restaurants");

        match self.repository.find_restaurants().await {
            Ok(restaurants) => {
                let restaurants = apply_search(restaurants, search, Restaurant::matches_search);
                crate::info_with_trace!("Found {} restaurants", restaurants.len());

                RestaurantListResponse {
                    total_count: restaurants.len(),
                    restaurants,
                    notice: None,
                }
            }
            Err(source) => {
                let error = ServiceError::CatalogUnavailable { source };
                warn!(error = %error, "Restaurant listing degraded to empty result");

                RestaurantListResponse {
                    restaurants: Vec::new(),
                    total_count: 0,
                    notice: Some(error.to_string()),
                }
            }
        }
    }

    /// Fetch a single restaurant by id
    #[instrument(skip(self), fields(restaurant_id = id))]
    pub async fn get_restaurant(&self, id: i64) -> ServiceResult<Restaurant> {
        match self.repository.find_restaurant(id).await {
            Ok(Some(restaurant)) => Ok(restaurant),
            Ok(None) => Err(ServiceError::RestaurantNotFound { id }),
            Err(source) => Err(ServiceError::CatalogUnavailable { source }),
        }
    }

    /// List the menu of a restaurant, optionally narrowed by a
    /// case-insensitive substring match on the item name.
    #[instrument(skip(self), fields(restaurant_id = restaurant_id, search = search))]
    pub async fn list_menu_items(
        &self,
        restaurant_id: i64,
        search: Option<&str>,
    ) -> MenuListResponse {
        crate::info_with_trace!("Listing menu items");

        match self.repository.find_menu_items(restaurant_id).await {
            Ok(items) => {
                let items = apply_search(items, search, MenuItem::matches_search);
                crate::info_with_trace!("Found {} menu items", items.len());

                MenuListResponse {
                    total_count: items.len(),
                    items,
                    notice: None,
                }
            }
            Err(source) => {
                let error = ServiceError::CatalogUnavailable { source };
                warn!(error = %error, "Menu listing degraded to empty result");

                MenuListResponse {
                    items: Vec::new(),
                    total_count: 0,
                    notice: Some(error.to_string()),
                }
            }
        }
    }
}

/// Narrow records in-process; the storage interface itself only supports
/// equality filters.
fn apply_search<T>(records: Vec<T>, search: Option<&str>, matches: fn(&T, &str) -> bool) -> Vec<T> {
    match search.map(str::trim) {
        Some(term) if !term.is_empty() => records
            .into_iter()
            .filter(|record| matches(record, term))
            .collect(),
        _ => records,
    }
}
