/**
 * Service Routes
 * Public catalogue plus admin CRUD. Deleting a service also deletes its portfolio items.
 */
use axum::extract::{Path, State};

use crate::routes::{created, deleted, found, updated, ApiError, ApiResult, Validated};
use crate::schema::{InsertService, PortfolioStatus, ServicePatch};
use crate::state::AppState;
use crate::storage::EntityId;

// ============================================================================
// Public
// ============================================================================

/// GET /api/services
pub async fn list_services(State(state): State<AppState>) -> ApiResult {
    let services = state
        .storage
        .get_services()
        .await
        .map_err(ApiError::public)?;
    Ok(found("services", services))
}

/// GET /api/services/featured
pub async fn list_featured_services(State(state): State<AppState>) -> ApiResult {
    let services = state
        .storage
        .get_featured_services()
        .await
        .map_err(ApiError::public)?;
    Ok(found("services", services))
}

/// GET /api/services/{id}
pub async fn get_service(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let id = EntityId::from(id);
    match state.storage.get_service(&id).await.map_err(ApiError::public)? {
        Some(service) => Ok(found("service", service)),
        None => Err(ApiError::NotFound("Service")),
    }
}

/// GET /api/services/{id}/portfolio - published work for one service
pub async fn get_service_portfolio(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult {
    let id = EntityId::from(id);
    if state
        .storage
        .get_service(&id)
        .await
        .map_err(ApiError::public)?
        .is_none()
    {
        return Err(ApiError::NotFound("Service"));
    }

    let items: Vec<_> = state
        .storage
        .get_portfolio_items_by_service(&id)
        .await
        .map_err(ApiError::public)?
        .into_iter()
        .filter(|item| item.status == PortfolioStatus::Published)
        .collect();
    Ok(found("portfolioItems", items))
}

// ============================================================================
// Admin
// ============================================================================

/// GET /api/admin/services
pub async fn admin_list_services(State(state): State<AppState>) -> ApiResult {
    Ok(found("services", state.storage.get_services().await?))
}

/// GET /api/admin/services/{id}
pub async fn admin_get_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult {
    let service = state
        .storage
        .get_service(&EntityId::from(id))
        .await?
        .ok_or(ApiError::NotFound("Service"))?;
    Ok(found("service", service))
}

/// POST /api/admin/services
pub async fn create_service(
    State(state): State<AppState>,
    Validated(input): Validated<InsertService>,
) -> ApiResult {
    let service = state.storage.create_service(input).await?;
    tracing::info!(id = %service.id, name = %service.name, "Service created");
    Ok(created("service", service))
}

/// PUT /api/admin/services/{id}
pub async fn update_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Validated(patch): Validated<ServicePatch>,
) -> ApiResult {
    let service = state
        .storage
        .update_service(&EntityId::from(id), patch)
        .await?
        .ok_or(ApiError::NotFound("Service"))?;
    Ok(updated("service", service))
}

/// DELETE /api/admin/services/{id}
pub async fn delete_service(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let id = EntityId::from(id);
    if !state.storage.delete_service(&id).await? {
        return Err(ApiError::NotFound("Service"));
    }
    tracing::info!(id = %id, "Service deleted with its portfolio items");
    Ok(deleted())
}
