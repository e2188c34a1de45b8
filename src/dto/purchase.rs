use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Receipt;

/// One cart entry as submitted. Both fields are optional on the wire so that
/// missing values surface as validation errors instead of decode failures.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CartEntry {
    #[serde(rename = "IdProduto", default)]
    pub product_id: Option<i32>,
    #[serde(rename = "Quantidade", default)]
    pub quantity: Option<i32>,
}

impl CartEntry {
    pub fn new(product_id: i32, quantity: i32) -> Self {
        Self {
            product_id: Some(product_id),
            quantity: Some(quantity),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub cart: Vec<CartEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ReceiptList {
    #[schema(value_type = Vec<Receipt>)]
    pub items: Vec<Receipt>,
}
