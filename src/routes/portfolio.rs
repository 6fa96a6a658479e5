/**
 * Portfolio Routes
 * Published work for visitors, full CRUD for admins
 */
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::routes::{created, deleted, found, updated, ApiError, ApiResult, Validated};
use crate::schema::{InsertPortfolioItem, PortfolioItemPatch, PortfolioStatus};
use crate::state::AppState;
use crate::storage::EntityId;

/// Response for POST /api/admin/maintenance/reconcile
#[derive(Debug, Serialize, Deserialize)]
pub struct ReconcileResponse {
    pub success: bool,
    pub removed: u64,
}

// ============================================================================
// Public
// ============================================================================

/// GET /api/portfolio - published items only
pub async fn list_portfolio(State(state): State<AppState>) -> ApiResult {
    let items = state
        .storage
        .get_published_portfolio_items()
        .await
        .map_err(ApiError::public)?;
    Ok(found("portfolioItems", items))
}

/// GET /api/portfolio/{id} - counts as a view
///
/// Drafts are not visible here and are not counted.
pub async fn get_portfolio_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult {
    let id = EntityId::from(id);
    let published = state
        .storage
        .get_portfolio_item(&id)
        .await
        .map_err(ApiError::public)?
        .filter(|item| item.status == PortfolioStatus::Published);
    if published.is_none() {
        return Err(ApiError::NotFound("Portfolio item"));
    }

    let item = state
        .storage
        .increment_portfolio_view_count(&id)
        .await
        .map_err(ApiError::public)?
        .ok_or(ApiError::NotFound("Portfolio item"))?;
    Ok(found("portfolioItem", item))
}

// ============================================================================
// Admin
// ============================================================================

/// GET /api/admin/portfolio
pub async fn admin_list_portfolio(State(state): State<AppState>) -> ApiResult {
    Ok(found(
        "portfolioItems",
        state.storage.get_portfolio_items().await?,
    ))
}

/// GET /api/admin/portfolio/{id}
pub async fn admin_get_portfolio_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult {
    let item = state
        .storage
        .get_portfolio_item(&EntityId::from(id))
        .await?
        .ok_or(ApiError::NotFound("Portfolio item"))?;
    Ok(found("portfolioItem", item))
}

/// POST /api/admin/portfolio
pub async fn create_portfolio_item(
    State(state): State<AppState>,
    Validated(input): Validated<InsertPortfolioItem>,
) -> ApiResult {
    if let Some(service_id) = &input.service_id {
        if state.storage.get_service(service_id).await?.is_none() {
            return Err(ApiError::BadRequest(format!(
                "Service {} does not exist",
                service_id
            )));
        }
    }
    let item = state.storage.create_portfolio_item(input).await?;
    Ok(created("portfolioItem", item))
}

/// PUT /api/admin/portfolio/{id}
pub async fn update_portfolio_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Validated(patch): Validated<PortfolioItemPatch>,
) -> ApiResult {
    if let Some(service_id) = &patch.service_id {
        if state.storage.get_service(service_id).await?.is_none() {
            return Err(ApiError::BadRequest(format!(
                "Service {} does not exist",
                service_id
            )));
        }
    }
    let item = state
        .storage
        .update_portfolio_item(&EntityId::from(id), patch)
        .await?
        .ok_or(ApiError::NotFound("Portfolio item"))?;
    Ok(updated("portfolioItem", item))
}

/// DELETE /api/admin/portfolio/{id}
pub async fn delete_portfolio_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult {
    if !state
        .storage
        .delete_portfolio_item(&EntityId::from(id))
        .await?
    {
        return Err(ApiError::NotFound("Portfolio item"));
    }
    Ok(deleted())
}

/// POST /api/admin/maintenance/reconcile - drop items whose service is gone
pub async fn reconcile_portfolio(State(state): State<AppState>) -> ApiResult {
    let removed = state.storage.remove_orphaned_portfolio_items().await?;
    tracing::info!(removed, "Portfolio reconciliation finished");
    Ok((
        StatusCode::OK,
        Json(ReconcileResponse {
            success: true,
            removed,
        }),
    )
        .into_response())
}
