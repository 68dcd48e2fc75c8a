use std::marker::PhantomData;

use chrono::Utc;
use log::debug;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Select,
};

/// Per-table settings for entities that are tombstoned instead of deleted.
pub trait SoftDelete: EntityTrait {
    type Active: ActiveModelTrait<Entity = Self> + ActiveModelBehavior + Send;

    fn id_column() -> Self::Column;

    /// Flag column, 0 while the row is live.
    fn deleted_column() -> Self::Column;

    fn updated_column() -> Self::Column;

    /// Counter bumped on every single-record read, if the table tracks views.
    fn view_column() -> Option<Self::Column> {
        None
    }

    /// Listing order, newest first unless the table says otherwise.
    fn order(query: Select<Self>) -> Select<Self> {
        query.order_by_desc(Self::id_column())
    }

    fn mark_deleted(active: &mut Self::Active);
}

pub struct Repository<'a, E> {
    db: &'a DatabaseConnection,
    entity: PhantomData<E>,
}

impl<'a, E> Repository<'a, E>
where
    E: SoftDelete,
    E::Model: IntoActiveModel<E::Active> + Sync,
{
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self {
            db,
            entity: PhantomData,
        }
    }

    fn live() -> Select<E> {
        E::find().filter(E::deleted_column().eq(0))
    }

    pub async fn list(&self) -> Result<Vec<E::Model>, DbErr> {
        E::order(Self::live()).all(self.db).await
    }

    pub async fn find(&self, id: i32) -> Result<Option<E::Model>, DbErr> {
        Self::live()
            .filter(E::id_column().eq(id))
            .one(self.db)
            .await
    }

    /// Reads a live record, counting the read first when the table tracks views.
    ///
    /// The counter is bumped with a single `view_count = view_count + 1` statement
    /// and the record is read back afterwards, so the returned count includes this read.
    pub async fn find_and_count_view(&self, id: i32) -> Result<Option<E::Model>, DbErr> {
        let Some(view_column) = E::view_column() else {
            return self.find(id).await;
        };

        let result = E::update_many()
            .col_expr(view_column, Expr::col(view_column).add(1))
            .col_expr(E::updated_column(), Expr::value(Utc::now()))
            .filter(E::id_column().eq(id))
            .filter(E::deleted_column().eq(0))
            .exec(self.db)
            .await?;
        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.find(id).await
    }

    pub async fn create(&self, active: E::Active) -> Result<E::Model, DbErr> {
        let model = active.insert(self.db).await?;
        debug!("{} row inserted", E::default().table_name());
        Ok(model)
    }

    /// Applies `apply` to a live record and saves it. `None` when there is no live record.
    ///
    /// Columns `apply` leaves untouched are not written.
    pub async fn update<F>(&self, id: i32, apply: F) -> Result<Option<E::Model>, DbErr>
    where
        F: FnOnce(&mut E::Active),
    {
        let Some(model) = self.find(id).await? else {
            return Ok(None);
        };
        let mut active = model.into_active_model();
        apply(&mut active);
        let model = active.update(self.db).await?;
        debug!("{} row {} updated", E::default().table_name(), id);
        Ok(Some(model))
    }

    /// Tombstones a live record. `false` when there was none.
    pub async fn soft_delete(&self, id: i32) -> Result<bool, DbErr> {
        let deleted = self.update(id, E::mark_deleted).await?;
        Ok(deleted.is_some())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use sea_orm::sea_query::Expr;
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};

    use super::Repository;
    use crate::entity::{board, news, notice, quote_inquiry};
    use crate::test_support::memory_db;

    fn new_board(title: &str) -> board::ActiveModel {
        board::ActiveModel {
            title: Set(title.to_string()),
            content: Set(Some("body".to_string())),
            writer: Set(Some("anonymous".to_string())),
            view_count: Set(0),
            is_deleted: Set(0),
            ..Default::default()
        }
    }

    fn new_notice(title: &str, pinned: bool) -> notice::ActiveModel {
        notice::ActiveModel {
            title: Set(title.to_string()),
            content: Set(Some("body".to_string())),
            writer: Set(Some("admin".to_string())),
            is_pinned: Set(i8::from(pinned)),
            view_count: Set(0),
            is_deleted: Set(0),
            ..Default::default()
        }
    }

    #[actix_web::test]
    async fn list_skips_deleted_rows_newest_first() {
        let db = memory_db().await;
        let repo = Repository::<board::Entity>::new(&db);

        let first = repo.create(new_board("first")).await.unwrap();
        let second = repo.create(new_board("second")).await.unwrap();
        let third = repo.create(new_board("third")).await.unwrap();
        assert!(repo.soft_delete(second.id).await.unwrap());

        let ids: Vec<i32> = repo.list().await.unwrap().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![third.id, first.id]);
    }

    #[actix_web::test]
    async fn list_is_empty_without_rows() {
        let db = memory_db().await;
        let repo = Repository::<quote_inquiry::Entity>::new(&db);
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn notices_list_pinned_before_newer() {
        let db = memory_db().await;
        let repo = Repository::<notice::Entity>::new(&db);

        let pinned = repo.create(new_notice("pinned", true)).await.unwrap();
        let plain = repo.create(new_notice("plain", false)).await.unwrap();
        let newer_plain = repo.create(new_notice("newer", false)).await.unwrap();

        let ids: Vec<i32> = repo.list().await.unwrap().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![pinned.id, newer_plain.id, plain.id]);
    }

    #[actix_web::test]
    async fn counting_a_view_increments_by_one_and_touches_updated_at() {
        let db = memory_db().await;
        let repo = Repository::<board::Entity>::new(&db);
        let created = repo.create(new_board("viewed")).await.unwrap();

        let stale = Utc::now() - Duration::days(1);
        board::Entity::update_many()
            .col_expr(board::Column::UpdatedAt, Expr::value(stale))
            .filter(board::Column::Id.eq(created.id))
            .exec(&db)
            .await
            .unwrap();

        let viewed = repo.find_and_count_view(created.id).await.unwrap().unwrap();
        assert_eq!(viewed.view_count, 1);
        assert!(viewed.updated_at.unwrap() > stale);
        assert_eq!(viewed.created_at, created.created_at);

        let again = repo.find_and_count_view(created.id).await.unwrap().unwrap();
        assert_eq!(again.view_count, 2);

        // plain lookups never count
        let looked_up = repo.find(created.id).await.unwrap().unwrap();
        assert_eq!(looked_up.view_count, 2);
        repo.list().await.unwrap();
        assert_eq!(repo.find(created.id).await.unwrap().unwrap().view_count, 2);
    }

    #[actix_web::test]
    async fn counting_a_view_of_a_deleted_row_finds_nothing() {
        let db = memory_db().await;
        let repo = Repository::<board::Entity>::new(&db);
        let created = repo.create(new_board("gone")).await.unwrap();
        repo.soft_delete(created.id).await.unwrap();

        assert!(repo.find_and_count_view(created.id).await.unwrap().is_none());
        assert!(repo.find_and_count_view(created.id + 100).await.unwrap().is_none());

        let raw = board::Entity::find_by_id(created.id).one(&db).await.unwrap().unwrap();
        assert_eq!(raw.view_count, 0);
    }

    #[actix_web::test]
    async fn quote_inquiries_are_read_without_counting() {
        let db = memory_db().await;
        let repo = Repository::<quote_inquiry::Entity>::new(&db);
        let created = repo
            .create(quote_inquiry::ActiveModel {
                name: Set("Kim".to_string()),
                status: Set(quote_inquiry::STATUS_PENDING.to_string()),
                is_deleted: Set(0),
                ..Default::default()
            })
            .await
            .unwrap();

        let read = repo.find_and_count_view(created.id).await.unwrap().unwrap();
        assert_eq!(read, created);
    }

    #[actix_web::test]
    async fn update_writes_only_applied_columns() {
        let db = memory_db().await;
        let repo = Repository::<board::Entity>::new(&db);
        let created = repo.create(new_board("before")).await.unwrap();

        let updated = repo
            .update(created.id, |active| {
                active.title = Set("after".to_string());
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.title, "after");
        assert_eq!(updated.content, created.content);
        assert_eq!(updated.writer, created.writer);
        assert_eq!(updated.view_count, created.view_count);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[actix_web::test]
    async fn update_of_missing_or_deleted_row_is_none() {
        let db = memory_db().await;
        let repo = Repository::<board::Entity>::new(&db);
        let created = repo.create(new_board("x")).await.unwrap();
        repo.soft_delete(created.id).await.unwrap();

        let result = repo
            .update(created.id, |active| active.title = Set("y".to_string()))
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(repo.update(9999, |_| {}).await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn soft_delete_keeps_the_row_and_only_succeeds_once() {
        let db = memory_db().await;
        let repo = Repository::<board::Entity>::new(&db);
        let created = repo.create(new_board("delete me")).await.unwrap();

        assert!(repo.soft_delete(created.id).await.unwrap());
        assert!(!repo.soft_delete(created.id).await.unwrap());
        assert!(repo.find(created.id).await.unwrap().is_none());

        let raw = board::Entity::find_by_id(created.id).one(&db).await.unwrap().unwrap();
        assert_eq!(raw.is_deleted, 1);
        assert_eq!(raw.title, "delete me");
    }

    #[actix_web::test]
    async fn news_rows_each_get_their_own_image_list() {
        let db = memory_db().await;
        let repo = Repository::<news::Entity>::new(&db);
        let new_news = |title: &str| news::ActiveModel {
            title: Set(title.to_string()),
            content: Set(Some("body".to_string())),
            images: Set(Some(news::ImageList::default())),
            view_count: Set(0),
            is_deleted: Set(0),
            ..Default::default()
        };

        let a = repo.create(new_news("a")).await.unwrap();
        let b = repo.create(new_news("b")).await.unwrap();
        repo.update(a.id, |active| {
            active.images = Set(Some(news::ImageList(vec!["/uploads/news/1.png".to_string()])));
        })
        .await
        .unwrap();

        let a = repo.find(a.id).await.unwrap().unwrap();
        let b = repo.find(b.id).await.unwrap().unwrap();
        assert_eq!(a.images.unwrap().0, vec!["/uploads/news/1.png".to_string()]);
        assert!(b.images.unwrap().0.is_empty());
    }
}
