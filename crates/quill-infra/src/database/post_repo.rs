//! PostgreSQL post repository.
//!
//! Tags are stored in `tags` and linked through `post_tags`, so posts are
//! assembled from two queries and written inside a transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbConn, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
    TransactionTrait,
};
use uuid::Uuid;

use quill_core::domain::{Page, Pagination, Post, PostQuery, PostScope, Tag, rank_similar};
use quill_core::error::RepoError;
use quill_core::ports::{BaseRepository, PostRepository};

use super::entity::post::{self, Entity as PostEntity, Status};
use super::entity::post_tag::{self, Entity as PostTagEntity};
use super::entity::tag::{self, Entity as TagEntity};
use super::postgres_base::map_db_err;

const LIKE_ESCAPE: char = '\\';

/// `LIKE` pattern matching `term` literally anywhere in a lowercased column.
pub(super) fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[derive(Debug, FromQueryResult)]
struct PostTagRow {
    post_id: Uuid,
    name: String,
}

/// PostgreSQL post repository.
pub struct PostgresPostRepository {
    db: DbConn,
}

impl PostgresPostRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    /// Tag names per post id, alphabetical.
    async fn load_tags<C>(db: &C, post_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<String>>, RepoError>
    where
        C: ConnectionTrait,
    {
        let mut tags: HashMap<Uuid, Vec<String>> = HashMap::new();
        if post_ids.is_empty() {
            return Ok(tags);
        }

        let rows = PostTagEntity::find()
            .select_only()
            .column(post_tag::Column::PostId)
            .column(tag::Column::Name)
            .inner_join(TagEntity)
            .filter(post_tag::Column::PostId.is_in(post_ids.iter().copied()))
            .order_by_asc(tag::Column::Name)
            .into_model::<PostTagRow>()
            .all(db)
            .await
            .map_err(map_db_err)?;

        for row in rows {
            tags.entry(row.post_id).or_default().push(row.name);
        }
        Ok(tags)
    }

    /// Attach tags to a page of post rows.
    async fn hydrate(&self, models: Vec<post::Model>) -> Result<Vec<Post>, RepoError> {
        let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let mut tags = Self::load_tags(&self.db, &ids).await?;

        Ok(models
            .into_iter()
            .map(|m| {
                let post_tags = tags.remove(&m.id).unwrap_or_default();
                m.into_post(post_tags)
            })
            .collect())
    }

    /// Ids of posts linked to any of the named tags. May contain duplicates.
    async fn post_ids_tagged(&self, names: &[String]) -> Result<Vec<Uuid>, RepoError> {
        PostTagEntity::find()
            .select_only()
            .column(post_tag::Column::PostId)
            .inner_join(TagEntity)
            .filter(tag::Column::Name.is_in(names.iter().cloned()))
            .into_tuple::<Uuid>()
            .all(&self.db)
            .await
            .map_err(map_db_err)
    }

    /// Replace the tag links of a post, creating missing tags.
    async fn sync_tags<C>(db: &C, post_id: Uuid, names: &[String]) -> Result<(), RepoError>
    where
        C: ConnectionTrait,
    {
        PostTagEntity::delete_many()
            .filter(post_tag::Column::PostId.eq(post_id))
            .exec(db)
            .await
            .map_err(map_db_err)?;

        if names.is_empty() {
            return Ok(());
        }

        let mut links = Vec::with_capacity(names.len());
        for name in names {
            let existing = TagEntity::find()
                .filter(tag::Column::Name.eq(name.as_str()))
                .one(db)
                .await
                .map_err(map_db_err)?;

            let tag = match existing {
                Some(tag) => tag,
                None => {
                    let active: tag::ActiveModel = Tag::new(name.as_str()).into();
                    active.insert(db).await.map_err(map_db_err)?
                }
            };

            links.push(post_tag::ActiveModel {
                post_id: Set(post_id),
                tag_id: Set(tag.id),
            });
        }

        PostTagEntity::insert_many(links)
            .exec_without_returning(db)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    fn scoped(select: Select<PostEntity>, scope: PostScope) -> Select<PostEntity> {
        match scope {
            PostScope::All => select,
            PostScope::Published => select.filter(post::Column::Status.eq(Status::Published)),
        }
    }

    fn ordered(select: Select<PostEntity>) -> Select<PostEntity> {
        select
            .order_by_desc(post::Column::Publish)
            .order_by_asc(post::Column::Id)
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for PostgresPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let Some(model) = PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?
        else {
            return Ok(None);
        };

        let mut tags = Self::load_tags(&self.db, &[id]).await?;
        Ok(Some(model.into_post(tags.remove(&id).unwrap_or_default())))
    }

    async fn save(&self, entity: Post) -> Result<Post, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let clash = PostEntity::find()
            .filter(post::Column::Slug.eq(entity.slug.as_str()))
            .filter(post::Column::PublishDate.eq(entity.publish_date()))
            .filter(post::Column::Id.ne(entity.id))
            .one(&txn)
            .await
            .map_err(map_db_err)?;
        if clash.is_some() {
            return Err(RepoError::Constraint(format!(
                "A post with slug '{}' is already published on {}",
                entity.slug,
                entity.publish_date()
            )));
        }

        let exists = PostEntity::find_by_id(entity.id)
            .one(&txn)
            .await
            .map_err(map_db_err)?
            .is_some();

        let tags = entity.tags.clone();
        let active_model: post::ActiveModel = entity.into();
        let model = if exists {
            active_model.update(&txn).await
        } else {
            active_model.insert(&txn).await
        }
        .map_err(map_db_err)?;

        Self::sync_tags(&txn, model.id, &tags).await?;
        txn.commit().await.map_err(map_db_err)?;

        tracing::debug!(post_id = %model.id, slug = %model.slug, "Post saved");
        Ok(model.into_post(tags))
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let result = PostEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        tracing::debug!(post_id = %id, "Post deleted");
        Ok(())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn list(&self, query: PostQuery) -> Result<Page<Post>, RepoError> {
        let mut select = Self::scoped(PostEntity::find(), query.scope);

        if let Some(status) = query.status {
            select = select.filter(post::Column::Status.eq(Status::from(status)));
        }
        if let Some(author_id) = query.author_id {
            select = select.filter(post::Column::AuthorId.eq(author_id));
        }
        if let Some(tag) = &query.tag {
            let ids = self.post_ids_tagged(std::slice::from_ref(tag)).await?;
            select = select.filter(post::Column::Id.is_in(ids));
        }
        if let Some(term) = &query.search {
            let pattern = contains_pattern(term);
            select = select.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(post::Column::Title)))
                            .like(LikeExpr::new(pattern.clone()).escape(LIKE_ESCAPE)),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(post::Column::Body)))
                            .like(LikeExpr::new(pattern).escape(LIKE_ESCAPE)),
                    ),
            );
        }

        let total = select.clone().count(&self.db).await.map_err(map_db_err)?;

        let mut select = Self::ordered(select);
        let pagination = query.pagination;
        if let Some(p) = pagination {
            select = select.offset(p.offset()).limit(p.per_page);
        }
        let models = select.all(&self.db).await.map_err(map_db_err)?;
        let items = self.hydrate(models).await?;

        let pagination = pagination.unwrap_or(Pagination {
            page: 1,
            per_page: total.max(1),
        });
        Ok(Page::new(items, total, pagination))
    }

    async fn find_by_date_and_slug(
        &self,
        date: NaiveDate,
        slug: &str,
        scope: PostScope,
    ) -> Result<Option<Post>, RepoError> {
        let model = Self::scoped(PostEntity::find(), scope)
            .filter(post::Column::Slug.eq(slug))
            .filter(post::Column::PublishDate.eq(date))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        match model {
            Some(model) => Ok(self.hydrate(vec![model]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn similar(&self, post: &Post, limit: usize) -> Result<Vec<Post>, RepoError> {
        if post.tags.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let mut ids = self.post_ids_tagged(&post.tags).await?;
        ids.sort();
        ids.dedup();
        ids.retain(|id| *id != post.id);
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = Self::scoped(PostEntity::find(), PostScope::Published)
            .filter(post::Column::Id.is_in(ids))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;
        let candidates = self.hydrate(models).await?;

        Ok(rank_similar(post, candidates, limit))
    }
}
