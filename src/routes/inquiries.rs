/**
 * Inquiry Routes
 * Public contact form and the admin inbox
 */
use axum::extract::{Path, State};

use crate::routes::{created, deleted, found, updated, ApiError, ApiResult, Validated};
use crate::schema::{ContactForm, InquiryPatch, InsertInquiry};
use crate::state::AppState;
use crate::storage::EntityId;

/// POST /api/contact
pub async fn submit_contact(
    State(state): State<AppState>,
    Validated(input): Validated<ContactForm>,
) -> ApiResult {
    let inquiry = state
        .storage
        .create_inquiry(input)
        .await
        .map_err(ApiError::public)?;
    tracing::info!(id = %inquiry.id, "Contact inquiry received");
    Ok(created("inquiry", inquiry))
}

/// GET /api/admin/inquiries
pub async fn list_inquiries(State(state): State<AppState>) -> ApiResult {
    Ok(found("inquiries", state.storage.get_inquiries().await?))
}

/// GET /api/admin/inquiries/{id}
pub async fn get_inquiry(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let inquiry = state
        .storage
        .get_inquiry(&EntityId::from(id))
        .await?
        .ok_or(ApiError::NotFound("Inquiry"))?;
    Ok(found("inquiry", inquiry))
}

/// POST /api/admin/inquiries
pub async fn create_inquiry(
    State(state): State<AppState>,
    Validated(input): Validated<InsertInquiry>,
) -> ApiResult {
    let inquiry = state.storage.create_inquiry(input).await?;
    Ok(created("inquiry", inquiry))
}

/// PUT /api/admin/inquiries/{id}
pub async fn update_inquiry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Validated(patch): Validated<InquiryPatch>,
) -> ApiResult {
    let inquiry = state
        .storage
        .update_inquiry(&EntityId::from(id), patch)
        .await?
        .ok_or(ApiError::NotFound("Inquiry"))?;
    Ok(updated("inquiry", inquiry))
}

/// DELETE /api/admin/inquiries/{id}
pub async fn delete_inquiry(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    if !state.storage.delete_inquiry(&EntityId::from(id)).await? {
        return Err(ApiError::NotFound("Inquiry"));
    }
    Ok(deleted())
}
