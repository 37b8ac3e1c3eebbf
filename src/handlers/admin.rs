use axum::{extract::State, http::StatusCode, response::Json};
use rust_decimal_macros::dec;
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::models::{NewMenuItem, NewRestaurant, RepositoryError};
use crate::repositories::{CatalogRepository, MIGRATOR};

/// State for admin handlers
#[derive(Clone)]
pub struct AdminState {
    pub pool: PgPool,
    pub catalog_repository: Arc<dyn CatalogRepository>,
}

/// Response for the seed operation
#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub message: String,
    pub restaurants_created: usize,
    pub menu_items_created: usize,
}

/// Run the relational migrations, creating the four storefront tables
#[instrument(name = "setup_schema", skip(state))]
pub async fn setup_schema(
    State(state): State<AdminState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    info!("Running database migrations");

    match MIGRATOR.run(&state.pool).await {
        Ok(()) => {
            info!("Migrations completed successfully");
            Ok(Json(json!({
                "message": "Schema is up to date",
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })))
        }
        Err(e) => {
            error!("Migration failed: {}", e);
            Err(repository_error_to_response(RepositoryError::from(e)))
        }
    }
}

/// Seed the catalog with sample restaurants and menu items. A catalog that
/// already has restaurants is left untouched.
#[instrument(name = "seed_database", skip(state))]
pub async fn seed_database(
    State(state): State<AdminState>,
) -> Result<Json<SeedResponse>, (StatusCode, Json<Value>)> {
    info!("Seeding database with sample catalog data");

    let existing = state
        .catalog_repository
        .find_restaurants()
        .await
        .map_err(repository_error_to_response)?;

    if !existing.is_empty() {
        info!("Catalog already contains {} restaurants", existing.len());
        return Ok(Json(SeedResponse {
            message: "Catalog already seeded".to_string(),
            restaurants_created: 0,
            menu_items_created: 0,
        }));
    }

    let mut restaurants_created = 0;
    let mut menu_items_created = 0;

    for (restaurant, menu) in sample_catalog() {
        let created = state
            .catalog_repository
            .create_restaurant(restaurant)
            .await
            .map_err(repository_error_to_response)?;
        restaurants_created += 1;

        for mut item in menu {
            item.restaurant_id = created.id;
            state
                .catalog_repository
                .create_menu_item(item)
                .await
                .map_err(repository_error_to_response)?;
            menu_items_created += 1;
        }
    }

    info!(
        restaurants_created,
        menu_items_created, "Database seeded successfully"
    );

    Ok(Json(SeedResponse {
        message: "Database seeded successfully".to_string(),
        restaurants_created,
        menu_items_created,
    }))
}

/// Sample catalog fixtures; menu items get their restaurant id filled in
/// after the parent row is inserted.
fn sample_catalog() -> Vec<(NewRestaurant, Vec<NewMenuItem>)> {
    vec![
        (
            NewRestaurant {
                name: "Spice Route".to_string(),
                description: "North Indian classics, slow-cooked gravies".to_string(),
                rating: dec!(4.5),
                delivery_time: "30-40 min".to_string(),
                image_url: "https://images.example.com/restaurants/spice-route.jpg".to_string(),
            },
            vec![
                NewMenuItem {
                    restaurant_id: 0,
                    name: "Butter Chicken".to_string(),
                    description: "Tandoori chicken in a creamy tomato gravy".to_string(),
                    price: dec!(8.50),
                    image_url: "https://images.example.com/menu/butter-chicken.jpg".to_string(),
                },
                NewMenuItem {
                    restaurant_id: 0,
                    name: "Paneer Tikka".to_string(),
                    description: "Char-grilled cottage cheese with peppers".to_string(),
                    price: dec!(6.75),
                    image_url: "https://images.example.com/menu/paneer-tikka.jpg".to_string(),
                },
                NewMenuItem {
                    restaurant_id: 0,
                    name: "Garlic Naan".to_string(),
                    description: "Leavened flatbread with garlic butter".to_string(),
                    price: dec!(1.50),
                    image_url: "https://images.example.com/menu/garlic-naan.jpg".to_string(),
                },
            ],
        ),
        (
            NewRestaurant {
                name: "Pasta Lane".to_string(),
                description: "Fresh pasta and wood-fired pizza".to_string(),
                rating: dec!(4.2),
                delivery_time: "25-35 min".to_string(),
                image_url: "https://images.example.com/restaurants/pasta-lane.jpg".to_string(),
            },
            vec![
                NewMenuItem {
                    restaurant_id: 0,
                    name: "Margherita Pizza".to_string(),
                    description: "San Marzano tomatoes, mozzarella, basil".to_string(),
                    price: dec!(7.25),
                    image_url: "https://images.example.com/menu/margherita.jpg".to_string(),
                },
                NewMenuItem {
                    restaurant_id: 0,
                    name: "Penne Arrabbiata".to_string(),
                    description: "Spicy tomato sauce with fresh chilli".to_string(),
                    price: dec!(6.95),
                    image_url: "https://images.example.com/menu/arrabbiata.jpg".to_string(),
                },
            ],
        ),
        (
            NewRestaurant {
                name: "Wok & Roll".to_string(),
                description: "Indo-Chinese street food favourites".to_string(),
                rating: dec!(4.0),
                delivery_time: "20-30 min".to_string(),
                image_url: "https://images.example.com/restaurants/wok-and-roll.jpg".to_string(),
            },
            vec![
                NewMenuItem {
                    restaurant_id: 0,
                    name: "Veg Hakka Noodles".to_string(),
                    description: "Wok-tossed noodles with crunchy vegetables".to_string(),
                    price: dec!(5.25),
                    image_url: "https://images.example.com/menu/hakka-noodles.jpg".to_string(),
                },
                NewMenuItem {
                    restaurant_id: 0,
                    name: "Chilli Chicken".to_string(),
                    description: "Crispy chicken tossed in chilli-soy glaze".to_string(),
                    price: dec!(7.00),
                    image_url: "https://images.example.com/menu/chilli-chicken.jpg".to_string(),
                },
            ],
        ),
    ]
}

/// Convert RepositoryError to an HTTP response
fn repository_error_to_response(err: RepositoryError) -> (StatusCode, Json<Value>) {
    let status = match err {
        RepositoryError::ConnectionFailed => StatusCode::SERVICE_UNAVAILABLE,
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(json!({
            "error": err.to_string(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}
