use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::MenuItem;

/// In-memory cart ledger for a single user session.
///
/// Entries are keyed by menu-item id and hold a snapshot of the menu item as
/// it looked when it was first added. Invariant: every entry's quantity is a
/// positive integer; a quantity change that lands at or below zero removes
/// the entry instead of storing it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartLedger {
    entries: Vec<CartEntry>,
}

/// A single ledger entry: menu-item snapshot plus quantity (always >= 1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartEntry {
    pub item: MenuItem,
    pub quantity: u32,
}

impl CartLedger {
    /// Create a new empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a menu item: increment the quantity by one if it is already in
    /// the ledger, otherwise insert a fresh entry with quantity 1.
    pub fn add(&mut self, item: MenuItem) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.item.id == item.id) {
            entry.quantity = entry.quantity.saturating_add(1);
        } else {
            self.entries.push(CartEntry { item, quantity: 1 });
        }
    }

    /// Apply a signed quantity delta to an entry. Absent entries are a
    /// no-op (returns false). A resulting quantity <= 0 removes the entry.
    pub fn update_quantity(&mut self, menu_item_id: i64, delta: i64) -> bool {
        let Some(position) = self
            .entries
            .iter()
            .position(|e| e.item.id == menu_item_id)
        else {
            return false;
        };

        let new_quantity = i64::from(self.entries[position].quantity) + delta;
        if new_quantity <= 0 {
            self.entries.remove(position);
        } else {
            self.entries[position].quantity = new_quantity.min(i64::from(u32::MAX)) as u32;
        }
        true
    }

    /// Remove an entry outright, regardless of quantity
    pub fn remove(&mut self, menu_item_id: i64) -> bool {
        let original_len = self.entries.len();
        self.entries.retain(|e| e.item.id != menu_item_id);
        self.entries.len() != original_len
    }

    /// Empty the ledger (called after a successful order submission)
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Sum of all quantities across entries
    pub fn total_count(&self) -> u32 {
        self.entries.iter().map(|e| e.quantity).sum()
    }

    /// Sum of snapshot price x quantity, in the source currency
    pub fn total_amount(&self) -> Decimal {
        self.entries
            .iter()
            .map(|e| e.item.price * Decimal::from(e.quantity))
            .sum()
    }

    /// Check whether the ledger has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct entries (not the quantity sum)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Look up an entry by menu-item id
    pub fn entry(&self, menu_item_id: i64) -> Option<&CartEntry> {
        self.entries.iter().find(|e| e.item.id == menu_item_id)
    }

    /// Check whether a menu item is present
    pub fn contains(&self, menu_item_id: i64) -> bool {
        self.entries.iter().any(|e| e.item.id == menu_item_id)
    }

    /// Quantity of a menu item, zero when absent
    pub fn quantity_of(&self, menu_item_id: i64) -> u32 {
        self.entry(menu_item_id).map(|e| e.quantity).unwrap_or(0)
    }

    /// Iterate over the entries
    pub fn entries(&self) -> impl Iterator<Item = &CartEntry> {
        self.entries.iter()
    }
}

impl CartEntry {
    /// Snapshot price x quantity for this entry, in the source currency
    pub fn line_total(&self) -> Decimal {
        self.item.price * Decimal::from(self.quantity)
    }
}
