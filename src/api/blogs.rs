//! Blog API endpoints.

use axum::extract::{Path, State};

use super::{created, error, resolve_image, success, ApiResult, Payload, QueryParams};
use crate::errors::AppError;
use crate::models::{
    BlogListQuery, BlogPost, Comment, CreateBlogPostRequest, CreateCommentRequest,
    UpdateBlogPostRequest,
};
use crate::AppState;

/// Message for the switched-off like and dislike routes.
pub const FEATURE_DISABLED: &str = "Feature disabled";

/// GET /api/blogs - List posts, newest first.
pub async fn list_blog_posts(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<BlogListQuery>,
) -> ApiResult<Vec<BlogPost>> {
    let posts = state.repo.list_blog_posts(query.category.as_deref()).await?;
    success(posts)
}

/// GET /api/blogs/:id - Get a single post.
pub async fn get_blog_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<BlogPost> {
    match state.repo.get_blog_post(&id).await {
        Ok(Some(post)) => success(post),
        Ok(None) => error(AppError::NotFound(format!("Blog post {} not found", id))),
        Err(e) => error(e),
    }
}

/// POST /api/blogs - Publish a post (JSON or multipart with an image file).
pub async fn create_blog_post(
    State(state): State<AppState>,
    Payload { body, image }: Payload<CreateBlogPostRequest>,
) -> ApiResult<BlogPost> {
    body.validate()?;

    let image = resolve_image(&state, image, body.image.as_ref()).await?;
    let post = state.repo.create_blog_post(&body, image).await?;

    tracing::info!("Published blog post {}", post.id);
    created(post)
}

/// PATCH /api/blogs/:id - Update supplied fields of a post.
pub async fn update_blog_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Payload { body, .. }: Payload<UpdateBlogPostRequest>,
) -> ApiResult<BlogPost> {
    body.validate()?;

    let post = state.repo.update_blog_post(&id, &body).await?;
    success(post)
}

/// DELETE /api/blogs/:id - Delete a post and its comments.
pub async fn delete_blog_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.repo.delete_blog_post(&id).await?;

    tracing::info!("Deleted blog post {}", id);
    success(()).map(|r| r.with_message("Blog post deleted"))
}

/// GET /api/blogs/:id/comments - Comments on a post, oldest first.
pub async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Comment>> {
    let comments = state.repo.list_comments(&id).await?;
    success(comments)
}

/// POST /api/blogs/:id/comments - Add a comment.
pub async fn add_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Payload { body, .. }: Payload<CreateCommentRequest>,
) -> ApiResult<Comment> {
    body.validate()?;

    let comment = state.repo.add_comment(&id, &body).await?;
    created(comment)
}

/// POST /api/blogs/:id/like - Switched off; rejects every request.
pub async fn like_blog_post() -> ApiResult<BlogPost> {
    error(AppError::NotFound(FEATURE_DISABLED.to_string()))
}

/// POST /api/blogs/:id/dislike - Switched off; rejects every request.
pub async fn dislike_blog_post() -> ApiResult<BlogPost> {
    error(AppError::NotFound(FEATURE_DISABLED.to_string()))
}

/// POST /api/blogs/:id/unlike - Remove one like, never below zero.
pub async fn unlike_blog_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<BlogPost> {
    let post = state.repo.unlike_blog_post(&id).await?;
    success(post)
}
