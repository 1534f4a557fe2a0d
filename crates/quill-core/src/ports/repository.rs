use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{Comment, Page, Pagination, Post, PostQuery, PostScope, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository. Deleting a user removes their posts.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
}

/// Post repository.
///
/// Saving enforces that no two posts share a slug on the same publish date
/// (`RepoError::Constraint`). Deleting a post removes its comments.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// List posts matching `query`, newest `publish` first.
    async fn list(&self, query: PostQuery) -> Result<Page<Post>, RepoError>;

    /// Resolve a canonical URL back to a post.
    async fn find_by_date_and_slug(
        &self,
        date: NaiveDate,
        slug: &str,
        scope: PostScope,
    ) -> Result<Option<Post>, RepoError>;

    /// Published posts sharing tags with `post`, most shared tags first.
    async fn similar(&self, post: &Post, limit: usize) -> Result<Vec<Post>, RepoError>;

    /// Every published post in default order.
    async fn published(&self) -> Result<Vec<Post>, RepoError> {
        Ok(self.list(PostQuery::published()).await?.items)
    }

    /// One page of published posts, optionally restricted to a tag.
    async fn published_page(
        &self,
        pagination: Pagination,
        tag: Option<String>,
    ) -> Result<Page<Post>, RepoError> {
        let mut query = PostQuery::published().paginate(pagination);
        query.tag = tag;
        self.list(query).await
    }

    async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, RepoError> {
        let query = PostQuery {
            author_id: Some(author_id),
            ..Default::default()
        };
        Ok(self.list(query).await?.items)
    }
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Comments on a post, oldest first. `active_only` hides moderated ones.
    async fn for_post(&self, post_id: Uuid, active_only: bool) -> Result<Vec<Comment>, RepoError>;

    /// Flip the moderation flag and return the updated comment.
    async fn set_active(&self, id: Uuid, active: bool) -> Result<Comment, RepoError>;
}
