//! In-memory blog store - used when no database is configured.
//!
//! All three repositories share one set of tables behind a single async
//! `RwLock`, so a cascading delete is applied atomically.
//! Note: Data is lost on process restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::domain::{
    Comment, Page, Pagination, Post, PostQuery, PostScope, User, default_comment_order,
    default_post_order, next_timestamp, rank_similar,
};
use quill_core::error::RepoError;
use quill_core::ports::{BaseRepository, CommentRepository, PostRepository, UserRepository};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
}

impl Tables {
    fn remove_post(&mut self, id: Uuid) -> Option<Post> {
        let post = self.posts.remove(&id)?;
        self.comments.retain(|_, c| c.post_id != id);
        Some(post)
    }
}

type SharedTables = Arc<RwLock<Tables>>;

/// Handle to the in-memory tables. Cloning shares the same data.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: SharedTables,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryUserRepository {
            tables: self.tables.clone(),
        }
    }

    pub fn posts(&self) -> InMemoryPostRepository {
        InMemoryPostRepository {
            tables: self.tables.clone(),
        }
    }

    pub fn comments(&self) -> InMemoryCommentRepository {
        InMemoryCommentRepository {
            tables: self.tables.clone(),
        }
    }
}

/// In-memory user repository.
pub struct InMemoryUserRepository {
    tables: SharedTables,
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn save(&self, mut user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;

        if tables
            .users
            .values()
            .any(|u| u.id != user.id && u.username == user.username)
        {
            return Err(RepoError::Constraint(format!(
                "Username '{}' is taken",
                user.username
            )));
        }

        if let Some(existing) = tables.users.get(&user.id) {
            user.created_at = existing.created_at;
            user.updated_at = next_timestamp(existing.updated_at.max(user.updated_at));
        }

        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.users.remove(&id).ok_or(RepoError::NotFound)?;

        let authored: Vec<Uuid> = tables
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in &authored {
            tables.remove_post(*post_id);
        }

        tracing::debug!(user_id = %id, posts = authored.len(), "User deleted with posts");
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

/// In-memory post repository.
pub struct InMemoryPostRepository {
    tables: SharedTables,
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn save(&self, mut post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&post.author_id) {
            return Err(RepoError::Constraint(format!(
                "Author {} does not exist",
                post.author_id
            )));
        }
        if tables.posts.values().any(|p| p.conflicts_with(&post)) {
            return Err(RepoError::Constraint(format!(
                "A post with slug '{}' is already published on {}",
                post.slug,
                post.publish_date()
            )));
        }

        if let Some(existing) = tables.posts.get(&post.id) {
            post.created = existing.created;
            post.updated = next_timestamp(existing.updated.max(post.updated));
        }

        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.remove_post(id).ok_or(RepoError::NotFound)?;
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn list(&self, query: PostQuery) -> Result<Page<Post>, RepoError> {
        let tables = self.tables.read().await;
        let mut matched: Vec<Post> = tables
            .posts
            .values()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        matched.sort_by(default_post_order);

        let total = matched.len() as u64;
        let page = match query.pagination {
            Some(p) => {
                let items = matched
                    .into_iter()
                    .skip(p.offset() as usize)
                    .take(p.per_page as usize)
                    .collect();
                Page::new(items, total, p)
            }
            None => Page::new(matched, total, Pagination::new(1, total)),
        };
        Ok(page)
    }

    async fn find_by_date_and_slug(
        &self,
        date: NaiveDate,
        slug: &str,
        scope: PostScope,
    ) -> Result<Option<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .values()
            .find(|p| scope.admits(p) && p.slug == slug && p.publish_date() == date)
            .cloned())
    }

    async fn similar(&self, post: &Post, limit: usize) -> Result<Vec<Post>, RepoError> {
        let tables = self.tables.read().await;
        let candidates = tables.posts.values().cloned().collect();
        Ok(rank_similar(post, candidates, limit))
    }
}

/// In-memory comment repository.
pub struct InMemoryCommentRepository {
    tables: SharedTables,
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryCommentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn save(&self, mut comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;

        if !tables.posts.contains_key(&comment.post_id) {
            return Err(RepoError::Constraint(format!(
                "Post {} does not exist",
                comment.post_id
            )));
        }

        if let Some(existing) = tables.comments.get(&comment.id) {
            comment.created = existing.created;
            comment.updated = next_timestamp(existing.updated.max(comment.updated));
        }

        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.comments.remove(&id).ok_or(RepoError::NotFound)?;
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn for_post(&self, post_id: Uuid, active_only: bool) -> Result<Vec<Comment>, RepoError> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id && (c.active || !active_only))
            .cloned()
            .collect();
        comments.sort_by(default_comment_order);
        Ok(comments)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        let comment = tables.comments.get_mut(&id).ok_or(RepoError::NotFound)?;
        comment.set_active(active);
        Ok(comment.clone())
    }
}
