use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "itens_compra")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "IdItem")]
    pub id: i32,
    #[sea_orm(column_name = "IdCompra")]
    pub purchase_id: i32,
    #[sea_orm(column_name = "IdProduto")]
    pub product_id: Option<i32>,
    #[sea_orm(column_name = "NomeProduto")]
    pub name: String,
    #[sea_orm(column_name = "Preco", column_type = "Decimal(Some((12, 2)))")]
    pub price: Decimal,
    #[sea_orm(column_name = "Quantidade")]
    pub quantity: i32,
    #[sea_orm(column_name = "Subtotal", column_type = "Decimal(Some((12, 2)))")]
    pub subtotal: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::purchases::Entity",
        from = "Column::PurchaseId",
        to = "super::purchases::Column::Id"
    )]
    Purchases,
    #[sea_orm(
        belongs_to = "super::products::Entity",
        from = "Column::ProductId",
        to = "super::products::Column::Id"
    )]
    Products,
}

impl Related<super::purchases::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchases.def()
    }
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
