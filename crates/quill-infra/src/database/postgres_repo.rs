//! PostgreSQL user and comment repositories.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use quill_core::domain::{Comment, User};
use quill_core::error::RepoError;
use quill_core::ports::{CommentRepository, UserRepository};

use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository. Post removal on user delete is done by the
/// `ON DELETE CASCADE` foreign key.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn for_post(&self, post_id: Uuid, active_only: bool) -> Result<Vec<Comment>, RepoError> {
        let mut select = CommentEntity::find().filter(comment::Column::PostId.eq(post_id));
        if active_only {
            select = select.filter(comment::Column::Active.eq(true));
        }

        let result = select
            .order_by_asc(comment::Column::Created)
            .order_by_asc(comment::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<Comment, RepoError> {
        let model = CommentEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .ok_or(RepoError::NotFound)?;

        let mut active_model = model.into_active_model();
        active_model.active = Set(active);
        let updated = active_model.update(&self.db).await.map_err(map_db_err)?;

        tracing::info!(comment_id = %id, active, "Comment moderated");
        Ok(updated.into())
    }
}
