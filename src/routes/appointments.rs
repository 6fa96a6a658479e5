/**
 * Appointment Routes
 * Public booking form and admin scheduling
 */
use axum::extract::{Path, State};

use crate::routes::{created, deleted, found, updated, ApiError, ApiResult, Validated};
use crate::schema::{AppointmentForm, AppointmentPatch, BookingForm, ValidationErrors};
use crate::state::AppState;
use crate::storage::{EntityId, StorageError};

/// Bookings must name an existing service.
async fn require_service(
    state: &AppState,
    service_id: &EntityId,
    on_storage_error: fn(StorageError) -> ApiError,
) -> Result<(), ApiError> {
    let service = state
        .storage
        .get_service(service_id)
        .await
        .map_err(on_storage_error)?;
    if service.is_some() {
        return Ok(());
    }
    let mut errors = ValidationErrors::new();
    errors.add("serviceId", "Unknown service");
    Err(ApiError::Validation(errors))
}

/// POST /api/appointments - customer booking
pub async fn book_appointment(
    State(state): State<AppState>,
    Validated(input): Validated<BookingForm>,
) -> ApiResult {
    require_service(&state, &input.service_id, ApiError::public).await?;
    let appointment = state
        .storage
        .create_appointment(input)
        .await
        .map_err(ApiError::public)?;
    tracing::info!(id = %appointment.id, date = %appointment.date, "Appointment booked");
    Ok(created("appointment", appointment))
}

/// GET /api/admin/appointments - soonest first
pub async fn list_appointments(State(state): State<AppState>) -> ApiResult {
    Ok(found("appointments", state.storage.get_appointments().await?))
}

/// GET /api/admin/appointments/{id}
pub async fn get_appointment(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let appointment = state
        .storage
        .get_appointment(&EntityId::from(id))
        .await?
        .ok_or(ApiError::NotFound("Appointment"))?;
    Ok(found("appointment", appointment))
}

/// POST /api/admin/appointments
pub async fn create_appointment(
    State(state): State<AppState>,
    Validated(input): Validated<AppointmentForm>,
) -> ApiResult {
    require_service(&state, &input.service_id, ApiError::from).await?;
    let appointment = state.storage.create_appointment(input).await?;
    Ok(created("appointment", appointment))
}

/// PUT /api/admin/appointments/{id}
pub async fn update_appointment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Validated(patch): Validated<AppointmentPatch>,
) -> ApiResult {
    let appointment = state
        .storage
        .update_appointment(&EntityId::from(id), patch)
        .await?
        .ok_or(ApiError::NotFound("Appointment"))?;
    Ok(updated("appointment", appointment))
}

/// DELETE /api/admin/appointments/{id}
pub async fn delete_appointment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult {
    if !state
        .storage
        .delete_appointment(&EntityId::from(id))
        .await?
    {
        return Err(ApiError::NotFound("Appointment"));
    }
    Ok(deleted())
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{app, send};
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    async fn app_with_service() -> axum::Router {
        let (app, _) = app();
        let (status, _) = send(
            &app,
            "POST",
            "/api/admin/services",
            Some(json!({ "name": "Lawn Care", "description": "Mowing" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        app
    }

    fn booking() -> Value {
        json!({
            "firstName": "Sam",
            "lastName": "Rivera",
            "email": "sam@example.com",
            "phone": "555-123-4567",
            "street": "12 Elm St",
            "city": "Springfield",
            "state": "IL",
            "zipCode": "62701",
            "serviceId": 1,
            "date": "2024-07-01T10:00"
        })
    }

    #[tokio::test]
    async fn test_public_booking_ignores_priority_and_status() {
        let app = app_with_service().await;
        let mut body = booking();
        body["priority"] = json!("Urgent");
        body["status"] = json!("Completed");

        let (status, res) = send(&app, "POST", "/api/appointments", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(res["appointment"]["priority"], "Normal");
        assert_eq!(res["appointment"]["status"], "Scheduled");
    }

    #[tokio::test]
    async fn test_admin_can_set_priority() {
        let app = app_with_service().await;
        let mut body = booking();
        body["priority"] = json!("Urgent");
        let (status, res) = send(&app, "POST", "/api/admin/appointments", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(res["appointment"]["priority"], "Urgent");
    }

    #[tokio::test]
    async fn test_booking_requires_address_and_date() {
        let app = app_with_service().await;
        let mut body = booking();
        body["street"] = json!("");
        body["date"] = json!("someday");
        let (status, res) = send(&app, "POST", "/api/appointments", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(res["errors"]["street"].is_array());
        assert!(res["errors"]["date"].is_array());
    }

    #[tokio::test]
    async fn test_status_update_leaves_other_fields() {
        let app = app_with_service().await;
        let (_, created) = send(&app, "POST", "/api/appointments", Some(booking())).await;
        let before = created["appointment"].clone();

        let (status, res) = send(
            &app,
            "PUT",
            &format!("/api/admin/appointments/{}", before["id"]),
            Some(json!({ "status": "Completed" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let after = &res["appointment"];
        assert_eq!(after["status"], "Completed");

        let mut expected = before.clone();
        expected["status"] = json!("Completed");
        expected["updatedAt"] = after["updatedAt"].clone();
        assert_eq!(after, &expected);
    }

    #[tokio::test]
    async fn test_unknown_service_is_rejected() {
        let app = app_with_service().await;
        let mut body = booking();
        body["serviceId"] = json!(77);
        let (status, res) = send(&app, "POST", "/api/appointments", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(res["errors"]["serviceId"].is_array());
    }

    #[tokio::test]
    async fn test_listed_by_date() {
        let app = app_with_service().await;
        for date in ["2024-09-01T09:00", "2024-08-01T09:00"] {
            let mut body = booking();
            body["date"] = json!(date);
            send(&app, "POST", "/api/appointments", Some(body)).await;
        }
        let (_, res) = send(&app, "GET", "/api/admin/appointments", None).await;
        let dates: Vec<&str> = res["appointments"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|a| a["date"].as_str())
            .collect();
        assert_eq!(dates.len(), 2);
        assert!(dates[0] < dates[1]);
    }
}
