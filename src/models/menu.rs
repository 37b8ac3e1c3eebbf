use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A menu item belonging to a restaurant. Prices are stored in the source
/// currency; display conversion happens in the pricing converter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MenuItem {
    pub id: i64,
    pub restaurant_id: i64,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image_url: String,
}

/// Payload for inserting a menu item (seeding only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMenuItem {
    pub restaurant_id: i64,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image_url: String,
}

/// Response model for menu listings, same degradation contract as the
/// restaurant listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuListResponse {
    pub items: Vec<MenuItem>,
    pub total_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl MenuItem {
    /// Case-insensitive substring match on the item name.
    pub fn matches_search(&self, term: &str) -> bool {
        self.name.to_lowercase().contains(&term.to_lowercase())
    }
}
