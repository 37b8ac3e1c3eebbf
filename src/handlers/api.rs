use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::models::{
    CustomerInfo, MenuListResponse, OrderConfirmation, OrderDetails, Restaurant,
    RestaurantListResponse, ServiceError,
};
use crate::observability::Metrics;
use crate::services::{CartService, CartView, CatalogService, OrderService};

/// Shared application state containing all services
#[derive(Clone)]
pub struct ApiState {
    pub catalog_service: Arc<CatalogService>,
    pub cart_service: Arc<CartService>,
    pub order_service: Arc<OrderService>,
    pub metrics: Arc<Metrics>,
}

/// Query parameters for catalog listings
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub search: Option<String>,
}

/// Request body for adding a menu item to the cart; quantity always
/// increments by one per add.
#[derive(Debug, Deserialize)]
pub struct AddCartItemRequest {
    pub menu_item_id: i64,
}

/// Request body for changing a cart entry's quantity by a signed delta
#[derive(Debug, Deserialize)]
pub struct UpdateCartItemRequest {
    pub delta: i64,
}

// =============================================================================
// CATALOG ENDPOINTS
// =============================================================================

/// List restaurants, optionally narrowed by a name search
#[instrument(name = "list_restaurants", skip(state), fields(search = query.search.as_deref()))]
pub async fn list_restaurants(
    State(state): State<ApiState>,
    Query(query): Query<CatalogQuery>,
) -> Json<RestaurantListResponse> {
    info!("Listing restaurants");

    let response = state
        .catalog_service
        .list_restaurants(query.search.as_deref())
        .await;

    state
        .metrics
        .record_catalog_operation("list_restaurants", response.notice.is_none());

    Json(response)
}

/// Get a specific restaurant by ID
#[instrument(name = "get_restaurant", skip(state), fields(restaurant_id = restaurant_id))]
pub async fn get_restaurant(
    State(state): State<ApiState>,
    Path(restaurant_id): Path<i64>,
) -> Result<Json<Restaurant>, (StatusCode, Json<Value>)> {
    info!("Getting restaurant");

    match state.catalog_service.get_restaurant(restaurant_id).await {
        Ok(restaurant) => {
            state.metrics.record_catalog_operation("get_restaurant", true);
            Ok(Json(restaurant))
        }
        Err(err) => {
            state
                .metrics
                .record_catalog_operation("get_restaurant", false);
            error!("Failed to get restaurant {}: {}", restaurant_id, err);
            Err(service_error_to_response(err))
        }
    }
}

/// List a restaurant's menu, optionally narrowed by an item-name search
#[instrument(name = "list_menu_items", skip(state), fields(
    restaurant_id = restaurant_id,
    search = query.search.as_deref(),
))]
pub async fn list_menu_items(
    State(state): State<ApiState>,
    Path(restaurant_id): Path<i64>,
    Query(query): Query<CatalogQuery>,
) -> Json<MenuListResponse> {
    info!("Listing menu items");

    let response = state
        .catalog_service
        .list_menu_items(restaurant_id, query.search.as_deref())
        .await;

    state
        .metrics
        .record_catalog_operation("list_menu_items", response.notice.is_none());

    Json(response)
}

// =============================================================================
// CART ENDPOINTS
// =============================================================================

/// Get a session's cart
#[instrument(name = "get_cart", skip(state), fields(session_id = %session_id))]
pub async fn get_cart(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> Result<Json<CartView>, (StatusCode, Json<Value>)> {
    crate::info_with_trace!("Getting cart for session: {}", session_id);

    match state.cart_service.get_cart(&session_id).await {
        Ok(cart) => Ok(Json(cart)),
        Err(err) => {
            crate::error_with_trace!("Failed to get cart: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Add one unit of a menu item to the cart
#[instrument(name = "add_cart_item", skip(state, request), fields(
    session_id = %session_id,
    menu_item_id = request.menu_item_id,
))]
pub async fn add_cart_item(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
    Json(request): Json<AddCartItemRequest>,
) -> Result<(StatusCode, Json<CartView>), (StatusCode, Json<Value>)> {
    crate::info_with_trace!(
        "Adding item to cart for session: {}, menu_item_id: {}",
        session_id,
        request.menu_item_id
    );

    match state
        .cart_service
        .add_item(&session_id, request.menu_item_id)
        .await
    {
        Ok(cart) => {
            state.metrics.record_cart_operation("add_item", true);
            crate::info_with_trace!("Successfully added item to cart");
            Ok((StatusCode::CREATED, Json(cart)))
        }
        Err(err) => {
            state.metrics.record_cart_operation("add_item", false);
            crate::error_with_trace!("Failed to add item to cart: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Change the quantity of a cart entry by a signed delta
#[instrument(name = "update_cart_item", skip(state, request), fields(
    session_id = %session_id,
    menu_item_id = menu_item_id,
    delta = request.delta,
))]
pub async fn update_cart_item(
    State(state): State<ApiState>,
    Path((session_id, menu_item_id)): Path<(String, i64)>,
    Json(request): Json<UpdateCartItemRequest>,
) -> Result<Json<CartView>, (StatusCode, Json<Value>)> {
    crate::info_with_trace!(
        "Updating cart item for session: {}, menu_item_id: {}, delta: {}",
        session_id,
        menu_item_id,
        request.delta
    );

    match state
        .cart_service
        .update_item(&session_id, menu_item_id, request.delta)
        .await
    {
        Ok(cart) => {
            state.metrics.record_cart_operation("update_item", true);
            Ok(Json(cart))
        }
        Err(err) => {
            state.metrics.record_cart_operation("update_item", false);
            crate::error_with_trace!("Failed to update cart item: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Remove an entry from the cart
#[instrument(name = "remove_cart_item", skip(state), fields(
    session_id = %session_id,
    menu_item_id = menu_item_id,
))]
pub async fn remove_cart_item(
    State(state): State<ApiState>,
    Path((session_id, menu_item_id)): Path<(String, i64)>,
) -> Result<Json<CartView>, (StatusCode, Json<Value>)> {
    crate::info_with_trace!(
        "Removing item from cart for session: {}, menu_item_id: {}",
        session_id,
        menu_item_id
    );

    match state
        .cart_service
        .remove_item(&session_id, menu_item_id)
        .await
    {
        Ok(cart) => {
            state.metrics.record_cart_operation("remove_item", true);
            Ok(Json(cart))
        }
        Err(err) => {
            state.metrics.record_cart_operation("remove_item", false);
            crate::error_with_trace!("Failed to remove item from cart: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Clear all entries from the cart
#[instrument(name = "clear_cart", skip(state), fields(session_id = %session_id))]
pub async fn clear_cart(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    crate::info_with_trace!("Clearing cart for session: {}", session_id);

    match state.cart_service.clear_cart(&session_id).await {
        Ok(()) => {
            state.metrics.record_cart_operation("clear", true);
            Ok(StatusCode::NO_CONTENT)
        }
        Err(err) => {
            state.metrics.record_cart_operation("clear", false);
            crate::error_with_trace!("Failed to clear cart: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

// =============================================================================
// ORDER ENDPOINTS
// =============================================================================

/// Submit the session's cart as an order
#[instrument(name = "checkout_cart", skip(state, customer), fields(session_id = %session_id))]
pub async fn checkout_cart(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
    Json(customer): Json<CustomerInfo>,
) -> Result<(StatusCode, Json<OrderConfirmation>), (StatusCode, Json<Value>)> {
    info!("Processing checkout for session: {}", session_id);

    match state.order_service.submit(&session_id, customer).await {
        Ok(confirmation) => {
            state.metrics.record_order_submission(true);
            crate::info_with_trace!(
                "Checkout completed successfully for order: {}",
                confirmation.order_id
            );
            Ok((StatusCode::CREATED, Json(confirmation)))
        }
        Err(err) => {
            state.metrics.record_order_submission(false);
            crate::error_with_trace!("Failed to process checkout: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Get a persisted order with its lines
#[instrument(name = "get_order", skip(state), fields(order_id = order_id))]
pub async fn get_order(
    State(state): State<ApiState>,
    Path(order_id): Path<i64>,
) -> Result<Json<OrderDetails>, (StatusCode, Json<Value>)> {
    info!("Getting order: {}", order_id);

    match state.order_service.get_order(order_id).await {
        Ok(details) => Ok(Json(details)),
        Err(err) => {
            error!("Failed to get order {}: {}", order_id, err);
            Err(service_error_to_response(err))
        }
    }
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Convert ServiceError to an HTTP response
fn service_error_to_response(err: ServiceError) -> (StatusCode, Json<Value>) {
    let (status, message) = match &err {
        ServiceError::RestaurantNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::MenuItemNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::OrderNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::Validation { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        ServiceError::CatalogUnavailable { .. } => {
            (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
        }
        // Surfaced with the underlying cause; the cart is preserved so the
        // caller can retry.
        ServiceError::OrderPersistence { .. } => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
        ServiceError::Repository { source } => match source {
            crate::models::RepositoryError::NotFound => {
                (StatusCode::NOT_FOUND, "Resource not found".to_string())
            }
            crate::models::RepositoryError::ConnectionFailed => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Database connection failed".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        },
    };

    (
        status,
        Json(json!({
            "error": message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RepositoryError;

    #[test]
    fn test_add_cart_item_request_deserialization() {
        let json = r#"{"menu_item_id": 42}"#;
        let request: AddCartItemRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.menu_item_id, 42);
    }

    #[test]
    fn test_update_cart_item_request_deserialization() {
        let json = r#"{"delta": -1}"#;
        let request: UpdateCartItemRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.delta, -1);
    }

    #[test]
    fn test_validation_error_maps_to_bad_request() {
        let err = ServiceError::Validation {
            message: "Required field missing: customer_name".to_string(),
        };

        let (status, _) = service_error_to_response(err);
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_errors_map_to_404() {
        let err = ServiceError::MenuItemNotFound { id: 7 };
        let (status, _) = service_error_to_response(err);
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_order_persistence_maps_to_service_unavailable() {
        let err = ServiceError::OrderPersistence {
            source: RepositoryError::ConnectionFailed,
        };

        let (status, body) = service_error_to_response(err);
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.0["error"]
            .as_str()
            .unwrap()
            .contains("Database connection failed"));
    }
}
