use async_trait::async_trait;
use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::Serialize;

use crate::repository::SoftDelete;

pub const STATUS_PENDING: &str = "pending";
pub const STATUSES: [&str; 3] = [STATUS_PENDING, "processing", "completed"];

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "quote_inquiries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_type = "String(Some(100))")]
    pub name: String,
    #[sea_orm(column_type = "String(Some(100))", nullable)]
    pub contact: Option<String>,
    #[sea_orm(column_type = "String(Some(100))", nullable)]
    pub company: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,
    /// pending, processing or completed
    #[sea_orm(column_type = "String(Some(20))", default_value = "pending")]
    pub status: String,
    #[sea_orm(default_value = 0)]
    pub is_deleted: i8,
    pub created_at: Option<DateTimeUtc>,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now();
        if insert {
            self.created_at = Set(Some(now));
        }
        self.updated_at = Set(Some(now));
        Ok(self)
    }
}

impl SoftDelete for Entity {
    type Active = ActiveModel;

    fn id_column() -> Column {
        Column::Id
    }

    fn deleted_column() -> Column {
        Column::IsDeleted
    }

    fn updated_column() -> Column {
        Column::UpdatedAt
    }

    fn mark_deleted(active: &mut ActiveModel) {
        active.is_deleted = Set(1);
    }
}
