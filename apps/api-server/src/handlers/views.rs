//! Conversions from domain entities to API responses.

use quill_core::domain::{Comment, Page, Post, PostStatus, User};
use quill_shared::dto::{CommentResponse, PageResponse, PostResponse, UserResponse};

use crate::middleware::error::{AppError, AppResult};

pub fn post_response(post: Post) -> PostResponse {
    let url = post.absolute_url();
    PostResponse {
        id: post.id,
        author_id: post.author_id,
        title: post.title,
        slug: post.slug,
        body: post.body,
        publish: post.publish,
        created: post.created,
        updated: post.updated,
        status: post.status.to_string(),
        tags: post.tags,
        url,
    }
}

pub fn comment_response(comment: Comment) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        post_id: comment.post_id,
        name: comment.name,
        body: comment.body,
        created: comment.created,
        active: comment.active,
    }
}

pub fn user_response(user: User) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username,
        created_at: user.created_at,
    }
}

pub fn page_response<T, U>(page: Page<T>, f: impl FnMut(T) -> U) -> PageResponse<U> {
    let total_pages = page.total_pages();
    let page = page.map(f);
    PageResponse {
        items: page.items,
        page: page.page,
        per_page: page.per_page,
        total: page.total,
        total_pages,
    }
}

/// Parse an optional status string from a request.
pub fn parse_status(status: Option<&str>) -> AppResult<Option<PostStatus>> {
    status
        .map(|s| s.parse::<PostStatus>().map_err(AppError::from))
        .transpose()
}
