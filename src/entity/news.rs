use async_trait::async_trait;
use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::{FromJsonQueryResult, Set};
use serde::{Deserialize, Serialize};

use crate::repository::SoftDelete;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "news")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,
    pub writer: Option<String>,
    /// Public path of the lead image.
    #[sea_orm(column_type = "String(Some(500))", nullable)]
    pub image_url: Option<String>,
    #[sea_orm(column_type = "Json", nullable)]
    pub images: Option<ImageList>,
    #[sea_orm(default_value = 0)]
    pub view_count: i32,
    #[sea_orm(default_value = 0)]
    pub is_deleted: i8,
    pub created_at: Option<DateTimeUtc>,
    pub updated_at: Option<DateTimeUtc>,
}

/// Ordered public paths of the secondary images, stored as a JSON array.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct ImageList(pub Vec<String>);

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

    fn mark_deleted(active: &mut ActiveModel) {
        active.is_deleted = Set(1);
    }
}
