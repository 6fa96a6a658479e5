/**
 * Testimonial Routes
 */
use axum::extract::{Path, State};

use crate::routes::{created, deleted, found, updated, ApiError, ApiResult, Validated};
use crate::schema::{InsertTestimonial, TestimonialPatch};
use crate::state::AppState;
use crate::storage::EntityId;

/// GET /api/testimonials - in display order
pub async fn list_testimonials(State(state): State<AppState>) -> ApiResult {
    let testimonials = state
        .storage
        .get_testimonials()
        .await
        .map_err(ApiError::public)?;
    Ok(found("testimonials", testimonials))
}

/// GET /api/admin/testimonials
pub async fn admin_list_testimonials(State(state): State<AppState>) -> ApiResult {
    Ok(found("testimonials", state.storage.get_testimonials().await?))
}

/// GET /api/admin/testimonials/{id}
pub async fn get_testimonial(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let testimonial = state
        .storage
        .get_testimonial(&EntityId::from(id))
        .await?
        .ok_or(ApiError::NotFound("Testimonial"))?;
    Ok(found("testimonial", testimonial))
}

/// POST /api/admin/testimonials
pub async fn create_testimonial(
    State(state): State<AppState>,
    Validated(input): Validated<InsertTestimonial>,
) -> ApiResult {
    let testimonial = state.storage.create_testimonial(input).await?;
    Ok(created("testimonial", testimonial))
}

/// PUT /api/admin/testimonials/{id}
pub async fn update_testimonial(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Validated(patch): Validated<TestimonialPatch>,
) -> ApiResult {
    let testimonial = state
        .storage
        .update_testimonial(&EntityId::from(id), patch)
        .await?
        .ok_or(ApiError::NotFound("Testimonial"))?;
    Ok(updated("testimonial", testimonial))
}

/// DELETE /api/admin/testimonials/{id}
pub async fn delete_testimonial(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult {
    if !state
        .storage
        .delete_testimonial(&EntityId::from(id))
        .await?
    {
        return Err(ApiError::NotFound("Testimonial"));
    }
    Ok(deleted())
}
