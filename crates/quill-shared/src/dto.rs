//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to register an author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
}

/// A user's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Request to create a post. `slug` is derived from the title when omitted,
/// `publish` defaults to now and `status` to `draft`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub author_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub body: String,
    #[serde(default)]
    pub publish: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial update of a post; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub body: Option<String>,
    pub publish: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub publish: DateTime<Utc>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub status: String,
    pub tags: Vec<String>,
    /// Canonical path of the post.
    pub url: String,
}

/// A published post with its visible comments and related posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetailResponse {
    pub post: PostResponse,
    pub comments: Vec<CommentResponse>,
    pub similar: Vec<PostResponse>,
}

/// A reader's comment submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub name: String,
    pub email: String,
    pub body: String,
}

/// Comment as shown to readers. The email address is never echoed back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub post_id: Uuid,
    pub name: String,
    pub body: String,
    pub created: DateTime<Utc>,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerateCommentRequest {
    pub active: bool,
}

/// Query string of the public post list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostListParams {
    pub page: Option<u64>,
    pub tag: Option<String>,
}

/// Query string of the admin post list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminPostListParams {
    pub page: Option<u64>,
    pub status: Option<String>,
    pub author: Option<Uuid>,
    pub tag: Option<String>,
    pub q: Option<String>,
}

/// A page of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}
