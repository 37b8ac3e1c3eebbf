use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A restaurant listed in the catalog. Read-only from the storefront's
/// perspective; rows are typed at the repository boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub rating: Decimal,
    pub delivery_time: String,
    pub image_url: String,
}

/// Payload for inserting a restaurant (seeding only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRestaurant {
    pub name: String,
    pub description: String,
    pub rating: Decimal,
    pub delivery_time: String,
    pub image_url: String,
}

/// Response model for restaurant listings. `notice` carries the non-fatal
/// degradation message when the catalog backend is unreachable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantListResponse {
    pub restaurants: Vec<Restaurant>,
    pub total_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl Restaurant {
    /// Case-insensitive substring match on the restaurant name.
    pub fn matches_search(&self, term: &str) -> bool {
        self.name.to_lowercase().contains(&term.to_lowercase())
    }
}
