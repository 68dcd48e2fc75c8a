use async_trait::async_trait;
use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, Select, Set};
use serde::Serialize;

use crate::repository::SoftDelete;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "notices")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,
    pub writer: Option<String>,
    /// 1 keeps the notice at the top of the listing.
    #[sea_orm(default_value = 0)]
    pub is_pinned: i8,
    #[sea_orm(default_value = 0)]
    pub view_count: i32,
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

    fn view_column() -> Option<Column> {
        Some(Column::ViewCount)
    }

    fn order(query: Select<Entity>) -> Select<Entity> {
        query
            .order_by_desc(Column::IsPinned)
            .order_by_desc(Column::Id)
    }

    fn mark_deleted(active: &mut ActiveModel) {
        active.is_deleted = Set(1);
    }
}
