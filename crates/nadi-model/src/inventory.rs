//! Site inventory

use crate::ids::{InventoryItemId, SiteId};
use crate::record::Record;
use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};

/// Inventory row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Row id
    pub id: InventoryItemId,
    /// Owning site
    pub site_id: SiteId,
    /// Item name
    pub name: String,
    /// Grouping (hardware, furniture, ...)
    #[serde(default)]
    pub category: Option<String>,
    /// Units on hand
    pub quantity: u32,
    /// Unit label
    #[serde(default)]
    pub unit: Option<String>,
    /// Last stock change
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

impl InventoryItem {
    /// Check whether stock is at or below `threshold`
    #[inline]
    #[must_use]
    pub fn is_low_stock(&self, threshold: u32) -> bool {
        self.quantity <= threshold
    }
}

impl Record for InventoryItem {
    type Id = InventoryItemId;

    const TABLE: &'static str = "nd_inventories";
    const ENTITY: &'static str = "inventory item";

    fn id(&self) -> InventoryItemId {
        self.id
    }
}
