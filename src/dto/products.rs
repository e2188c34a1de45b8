use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Category, Product};

/// Body of both product creation and full replacement.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductRequest {
    #[serde(rename = "NomeProduto")]
    pub name: String,
    #[serde(rename = "Preco")]
    pub price: Decimal,
    #[serde(rename = "Quantidade")]
    pub quantity: i32,
    #[serde(rename = "IdCategoria", default)]
    pub category_id: Option<i32>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct CategoryList {
    #[schema(value_type = Vec<Category>)]
    pub items: Vec<Category>,
}
