use sea_orm::entity::prelude::*;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "feedback")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub conversation_message_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    pub rating: String,
    pub comment: Option<String>,
    pub updated_at_us: i64,
}

impl ActiveModelBehavior for ActiveModel {}
