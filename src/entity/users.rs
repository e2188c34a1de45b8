use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "usuarios")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "IdUsuario")]
    pub id: i32,
    #[sea_orm(column_name = "Email", unique)]
    pub email: String,
    #[sea_orm(column_name = "Senha")]
    pub password_hash: String,
    #[sea_orm(column_name = "Nome")]
    pub name: String,
    #[sea_orm(column_name = "DataCriacao")]
    pub created_at: DateTimeWithTimeZone,
    #[sea_orm(column_name = "TipoUsuario")]
    pub role: String,
    #[sea_orm(column_name = "UltimoAcesso")]
    pub last_access: Option<DateTimeWithTimeZone>,
    #[sea_orm(column_name = "TokenRecuperacao")]
    pub recovery_token: Option<String>,
    #[sea_orm(column_name = "TokenExpiracao")]
    pub recovery_expires_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::purchases::Entity")]
    Purchases,
}

impl Related<super::purchases::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchases.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
