//! Public blog handlers.

use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use uuid::Uuid;

use quill_core::domain::{Comment, Pagination, PostScope};
use quill_shared::ApiResponse;
use quill_shared::dto::{CreateCommentRequest, PostDetailResponse, PostListParams};

use super::views::{comment_response, page_response, post_response};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const SIMILAR_POSTS: usize = 4;

/// GET /api/posts?page=&tag=
///
/// Published posts, newest first. A page past the end returns the last page.
pub async fn list_published(
    state: web::Data<AppState>,
    query: web::Query<PostListParams>,
) -> AppResult<HttpResponse> {
    let params = query.into_inner();
    let requested = Pagination::new(params.page.unwrap_or(1), state.posts_per_page);

    let mut page = state
        .posts
        .published_page(requested, params.tag.clone())
        .await?;

    let last = page.total_pages();
    if last > 0 && requested.page > last {
        page = state
            .posts
            .published_page(Pagination::new(last, state.posts_per_page), params.tag)
            .await?;
    }

    Ok(HttpResponse::Ok().json(ApiResponse::ok(page_response(page, post_response))))
}

/// GET /api/posts/{year}/{month}/{day}/{slug}
pub async fn post_detail(
    state: web::Data<AppState>,
    path: web::Path<(i32, u32, u32, String)>,
) -> AppResult<HttpResponse> {
    let (year, month, day, slug) = path.into_inner();
    let not_found = || AppError::NotFound(format!("No post '{slug}' on {year}/{month}/{day}"));

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(not_found)?;
    let post = state
        .posts
        .find_by_date_and_slug(date, &slug, PostScope::Published)
        .await?
        .ok_or_else(not_found)?;

    let comments = state.comments.for_post(post.id, true).await?;
    let similar = state.posts.similar(&post, SIMILAR_POSTS).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(PostDetailResponse {
        post: post_response(post),
        comments: comments.into_iter().map(comment_response).collect(),
        similar: similar.into_iter().map(post_response).collect(),
    })))
}

/// POST /api/posts/{id}/comments
///
/// Only published posts accept comments.
pub async fn add_comment(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<CreateCommentRequest>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let req = body.into_inner();

    let post = state
        .posts
        .find_by_id(post_id)
        .await?
        .filter(|p| p.is_published())
        .ok_or_else(|| AppError::NotFound(format!("Post {post_id} not found")))?;

    let comment = Comment::new(post.id, req.name, req.email, req.body)?;
    let saved = state.comments.save(comment).await?;

    tracing::info!(post_id = %post.id, comment_id = %saved.id, "Comment added");
    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        comment_response(saved),
        "Your comment has been added.",
    )))
}
