//! Administrative handlers: authors, posts and comment moderation.
//!
//! Every handler takes an [`AdminIdentity`], so requests without the admin
//! token never reach the repositories.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::{NewPost, Pagination, Post, PostChanges, PostQuery, PostScope, User};
use quill_shared::ApiResponse;
use quill_shared::dto::{
    AdminPostListParams, CreatePostRequest, CreateUserRequest, ModerateCommentRequest,
    UpdatePostRequest,
};

use super::views::{comment_response, page_response, parse_status, post_response, user_response};
use crate::middleware::admin::AdminIdentity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const ADMIN_PAGE_SIZE: u64 = 20;

async fn load_post(state: &AppState, id: Uuid) -> AppResult<Post> {
    state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {id} not found")))
}

/// POST /api/admin/users
pub async fn create_user(
    _admin: AdminIdentity,
    state: web::Data<AppState>,
    body: web::Json<CreateUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let user = User::new(req.username, req.email)?;

    // A taken username surfaces as a constraint violation (409).
    let saved = state.users.save(user).await?;
    tracing::info!(user_id = %saved.id, "User created");
    Ok(HttpResponse::Created().json(ApiResponse::ok(user_response(saved))))
}

/// DELETE /api/admin/users/{id}
///
/// Removes the user together with all of their posts and those posts'
/// comments.
pub async fn delete_user(
    _admin: AdminIdentity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    state.users.delete(id).await?;
    tracing::info!(user_id = %id, "User deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/admin/posts?status=&author=&tag=&q=&page=
pub async fn list_posts(
    _admin: AdminIdentity,
    state: web::Data<AppState>,
    query: web::Query<AdminPostListParams>,
) -> AppResult<HttpResponse> {
    let params = query.into_inner();
    let post_query = PostQuery {
        scope: PostScope::All,
        status: parse_status(params.status.as_deref())?,
        author_id: params.author,
        tag: params.tag,
        search: params.q.filter(|q| !q.trim().is_empty()),
        pagination: Some(Pagination::new(params.page.unwrap_or(1), ADMIN_PAGE_SIZE)),
    };

    let page = state.posts.list(post_query).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(page_response(page, post_response))))
}

/// POST /api/admin/posts
pub async fn create_post(
    _admin: AdminIdentity,
    state: web::Data<AppState>,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    if state.users.find_by_id(req.author_id).await?.is_none() {
        return Err(AppError::BadRequest(format!(
            "Author {} does not exist",
            req.author_id
        )));
    }

    let post = Post::new(NewPost {
        author_id: req.author_id,
        title: req.title,
        slug: req.slug.filter(|s| !s.is_empty()),
        body: req.body,
        publish: req.publish,
        status: parse_status(req.status.as_deref())?.unwrap_or_default(),
        tags: req.tags,
    })?;

    let saved = state.posts.save(post).await?;
    tracing::info!(post_id = %saved.id, slug = %saved.slug, status = %saved.status, "Post created");
    Ok(HttpResponse::Created().json(ApiResponse::ok(post_response(saved))))
}

/// PUT /api/admin/posts/{id}
pub async fn update_post(
    _admin: AdminIdentity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let mut post = load_post(&state, path.into_inner()).await?;

    post.apply(PostChanges {
        title: req.title,
        slug: req.slug,
        body: req.body,
        publish: req.publish,
        status: parse_status(req.status.as_deref())?,
        tags: req.tags,
    })?;

    let saved = state.posts.save(post).await?;
    tracing::info!(post_id = %saved.id, status = %saved.status, "Post updated");
    Ok(HttpResponse::Ok().json(ApiResponse::ok(post_response(saved))))
}

/// DELETE /api/admin/posts/{id}
pub async fn delete_post(
    _admin: AdminIdentity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    state.posts.delete(id).await?;
    tracing::info!(post_id = %id, "Post deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/admin/posts/{id}/comments
///
/// All comments, hidden ones included.
pub async fn post_comments(
    _admin: AdminIdentity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = load_post(&state, path.into_inner()).await?;
    let comments = state.comments.for_post(post.id, false).await?;
    let body: Vec<_> = comments.into_iter().map(comment_response).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::ok(body)))
}

/// PATCH /api/admin/comments/{id}
pub async fn moderate_comment(
    _admin: AdminIdentity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<ModerateCommentRequest>,
) -> AppResult<HttpResponse> {
    let comment = state
        .comments
        .set_active(path.into_inner(), body.active)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(comment_response(comment))))
}

/// DELETE /api/admin/comments/{id}
pub async fn delete_comment(
    _admin: AdminIdentity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state.comments.delete(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
