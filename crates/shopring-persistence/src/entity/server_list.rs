//! `SeaORM` Entity for the server `shopping_lists` table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "shopping_lists")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub virtualnode_id: i64,
    pub list_uuid: String,
    pub list_name: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub list_content: String,
    pub replicated: i32,
    pub to_delete: bool,
    pub hinted_handoff: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
