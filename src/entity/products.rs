use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "produtos")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "IdProduto")]
    pub id: i32,
    #[sea_orm(column_name = "NomeProduto")]
    pub name: String,
    #[sea_orm(column_name = "Preco", column_type = "Decimal(Some((12, 2)))")]
    pub price: Decimal,
    #[sea_orm(column_name = "Quantidade")]
    pub quantity: i32,
    #[sea_orm(column_name = "IdCategoria")]
    pub category_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id"
    )]
    Categories,
    #[sea_orm(has_many = "super::purchase_items::Entity")]
    PurchaseItems,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl Related<super::purchase_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
