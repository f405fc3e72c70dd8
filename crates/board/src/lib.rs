//! Shared price board model: items, snapshots and the HTTP wire bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod wire;

/// Upper bound for a buy/sell price. The store keeps prices as signed 64-bit integers.
pub const MAX_PRICE: u64 = i64::MAX as u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedItem {
    pub id: i64,
    pub name: String,
    pub buy: u64,
    pub sell: u64,
}

impl PricedItem {
    pub fn new(id: i64, name: impl Into<String>, buy: u64, sell: u64) -> Self {
        Self {
            id,
            name: name.into(),
            buy,
            sell,
        }
    }
}

/// Immutable view of the whole price list at one instant.
///
/// Serializes as `{ "data": [...], "updatedAt": "<rfc3339>" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    #[serde(rename = "data")]
    pub items: Vec<PricedItem>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl PriceSnapshot {
    pub fn new(items: Vec<PricedItem>, updated_at: DateTime<Utc>) -> Self {
        Self { items, updated_at }
    }

    pub fn get(&self, id: i64) -> Option<&PricedItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Items written on the first read of an empty store.
pub fn default_items() -> Vec<PricedItem> {
    vec![
        PricedItem::new(1, "SJC 9999", 82_500_000, 83_500_000),
        PricedItem::new(2, "SJC 980", 80_200_000, 82_200_000),
        PricedItem::new(3, "PNJ 9999", 82_400_000, 83_400_000),
        PricedItem::new(4, "DOJI 9999", 82_300_000, 83_600_000),
        PricedItem::new(5, "Bảo Tín 9999", 82_100_000, 83_500_000),
    ]
}

/// Returns the first id that occurs more than once.
pub fn first_duplicate_id(items: &[PricedItem]) -> Option<i64> {
    let mut seen = std::collections::HashSet::with_capacity(items.len());
    items.iter().map(|item| item.id).find(|id| !seen.insert(*id))
}

/// Groups thousands with `.`: `82500000` becomes `82.500.000`.
pub fn format_price(price: u64) -> String {
    let digits = price.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}
