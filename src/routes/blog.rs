/**
 * Blog Routes
 * Public reading plus admin CRUD. Post content is sanitized before it is stored.
 */
use axum::extract::{Path, State};

use crate::routes::{created, deleted, found, updated, ApiError, ApiResult, Validated};
use crate::schema::{BlogPostPatch, InsertBlogPost};
use crate::state::AppState;
use crate::storage::EntityId;

/// GET /api/blog - newest first
pub async fn list_posts(State(state): State<AppState>) -> ApiResult {
    let posts = state
        .storage
        .get_blog_posts()
        .await
        .map_err(ApiError::public)?;
    Ok(found("blogPosts", posts))
}

/// GET /api/blog/{id}
pub async fn get_post(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let post = state
        .storage
        .get_blog_post(&EntityId::from(id))
        .await
        .map_err(ApiError::public)?
        .ok_or(ApiError::NotFound("Blog post"))?;
    Ok(found("blogPost", post))
}

/// GET /api/admin/blog
pub async fn admin_list_posts(State(state): State<AppState>) -> ApiResult {
    Ok(found("blogPosts", state.storage.get_blog_posts().await?))
}

/// GET /api/admin/blog/{id}
pub async fn admin_get_post(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let post = state
        .storage
        .get_blog_post(&EntityId::from(id))
        .await?
        .ok_or(ApiError::NotFound("Blog post"))?;
    Ok(found("blogPost", post))
}

/// POST /api/admin/blog
pub async fn create_post(
    State(state): State<AppState>,
    Validated(input): Validated<InsertBlogPost>,
) -> ApiResult {
    let post = state.storage.create_blog_post(input).await?;
    tracing::info!(id = %post.id, title = %post.title, "Blog post created");
    Ok(created("blogPost", post))
}

/// PUT /api/admin/blog/{id}
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Validated(patch): Validated<BlogPostPatch>,
) -> ApiResult {
    let post = state
        .storage
        .update_blog_post(&EntityId::from(id), patch)
        .await?
        .ok_or(ApiError::NotFound("Blog post"))?;
    Ok(updated("blogPost", post))
}

/// DELETE /api/admin/blog/{id}
pub async fn delete_post(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    if !state.storage.delete_blog_post(&EntityId::from(id)).await? {
        return Err(ApiError::NotFound("Blog post"));
    }
    Ok(deleted())
}
