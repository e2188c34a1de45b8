use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Cliente,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Cliente => "cliente",
        }
    }

    /// Unknown values fall back to the unprivileged role.
    pub fn parse(value: &str) -> Self {
        match value {
            "admin" => UserRole::Admin,
            _ => UserRole::Cliente,
        }
    }
}

/// Public view of a user; never carries the password hash or recovery token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    #[serde(rename = "IdUsuario")]
    pub id: i32,
    pub email: String,
    pub nome: String,
    #[serde(rename = "tipo")]
    pub role: UserRole,
    #[serde(rename = "dataCriacao")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "ultimoAcesso")]
    pub last_access: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    #[serde(rename = "IdCategoria")]
    pub id: i32,
    #[serde(rename = "NomeCategoria")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    #[serde(rename = "IdProduto")]
    pub id: i32,
    #[serde(rename = "NomeProduto")]
    pub name: String,
    #[serde(rename = "Preco")]
    pub price: Decimal,
    #[serde(rename = "Quantidade")]
    pub quantity: i32,
    #[serde(rename = "IdCategoria")]
    pub category_id: Option<i32>,
}

/// One line of a receipt. Name and price are snapshots taken at purchase time.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ReceiptItem {
    #[serde(rename = "IdProduto")]
    pub product_id: Option<i32>,
    #[serde(rename = "NomeProduto")]
    pub name: String,
    #[serde(rename = "Preco")]
    pub price: Decimal,
    #[serde(rename = "Quantidade")]
    pub quantity: i32,
    #[serde(rename = "Subtotal")]
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Receipt {
    #[serde(rename = "IdCompra")]
    pub purchase_id: i32,
    #[serde(rename = "IdUsuario")]
    pub user_id: Option<i32>,
    #[serde(rename = "data")]
    pub purchased_at: DateTime<Utc>,
    #[serde(rename = "itens")]
    pub items: Vec<ReceiptItem>,
    pub total: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_defaults_to_cliente() {
        assert_eq!(UserRole::parse("admin"), UserRole::Admin);
        assert_eq!(UserRole::parse("cliente"), UserRole::Cliente);
        assert_eq!(UserRole::parse("root"), UserRole::Cliente);
        assert_eq!(UserRole::Admin.as_str(), "admin");
    }

    #[test]
    fn receipt_serializes_with_storefront_field_names() {
        let receipt = Receipt {
            purchase_id: 4,
            user_id: Some(2),
            purchased_at: DateTime::<Utc>::UNIX_EPOCH,
            items: vec![ReceiptItem {
                product_id: Some(1),
                name: "Arroz".into(),
                price: Decimal::new(850, 2),
                quantity: 3,
                subtotal: Decimal::new(2550, 2),
            }],
            total: Decimal::new(2550, 2),
        };

        let value = serde_json::to_value(&receipt).unwrap();
        assert_eq!(value["IdCompra"], 4);
        assert_eq!(value["total"], 25.5);
        assert_eq!(value["itens"][0]["NomeProduto"], "Arroz");
        assert_eq!(value["itens"][0]["Subtotal"], 25.5);
        assert!(value.get("data").is_some());
    }
}
