//! Request and response bodies exchanged over `/api/prices`.

use serde::{Deserialize, Serialize};

use crate::{PriceSnapshot, PricedItem};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub data: Vec<PricedItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateResponse {
    pub success: bool,
    pub data: PriceSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopInfo {
    pub name: String,
    pub address: String,
    pub hotline: String,
}

pub const PRICES_PATH: &str = "/api/prices";
pub const SHOP_PATH: &str = "/api/shop";
