use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use super::common::{created_response, no_content_response, PaginationParams};
use crate::{
    entities::appointment::Model as Appointment,
    errors::ServiceError,
    middleware_helpers::ClinicScope,
    services::appointments::{
        AppointmentFilter, ChangeAppointmentStatus, CreateAppointmentRequest,
        UpdateAppointmentRequest,
    },
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

#[utoipa::path(
    get,
    path = "/api/v1/appointments",
    params(PaginationParams, AppointmentFilter),
    responses(
        (status = 200, description = "Appointments ordered by start time", body = ApiResponse<PaginatedResponse<Appointment>>)
    ),
    tag = "appointments"
)]
pub async fn list_appointments(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<AppointmentFilter>,
) -> ApiResult<PaginatedResponse<Appointment>> {
    let page = pagination.resolve(&state.config);
    let (items, total) = state
        .services
        .appointments
        .list(clinic.id(), filter, page)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(items, total, page))))
}

#[utoipa::path(
    post,
    path = "/api/v1/appointments",
    request_body = CreateAppointmentRequest,
    responses(
        (status = 201, description = "Appointment booked", body = ApiResponse<Appointment>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Client, pet or service not found", body = crate::errors::ErrorResponse)
    ),
    tag = "appointments"
)]
pub async fn create_appointment(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Json(payload): Json<CreateAppointmentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let appointment = state
        .services
        .appointments
        .create(clinic.id(), payload)
        .await?;
    Ok(created_response(appointment))
}

#[utoipa::path(
    get,
    path = "/api/v1/appointments/{id}",
    params(("id" = Uuid, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment returned", body = ApiResponse<Appointment>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "appointments"
)]
pub async fn get_appointment(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
) -> ApiResult<Appointment> {
    let appointment = state.services.appointments.get(clinic.id(), id).await?;
    Ok(Json(ApiResponse::success(appointment)))
}

#[utoipa::path(
    put,
    path = "/api/v1/appointments/{id}",
    params(("id" = Uuid, Path, description = "Appointment ID")),
    request_body = UpdateAppointmentRequest,
    responses(
        (status = 200, description = "Appointment updated", body = ApiResponse<Appointment>),
        (status = 400, description = "Invalid request or closed appointment", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "appointments"
)]
pub async fn update_appointment(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAppointmentRequest>,
) -> ApiResult<Appointment> {
    let appointment = state
        .services
        .appointments
        .update(clinic.id(), id, payload)
        .await?;
    Ok(Json(ApiResponse::success(appointment)))
}

#[utoipa::path(
    post,
    path = "/api/v1/appointments/{id}/status",
    params(("id" = Uuid, Path, description = "Appointment ID")),
    request_body = ChangeAppointmentStatus,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<Appointment>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Transition not allowed", body = crate::errors::ErrorResponse)
    ),
    tag = "appointments"
)]
pub async fn change_appointment_status(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeAppointmentStatus>,
) -> ApiResult<Appointment> {
    let appointment = state
        .services
        .appointments
        .change_status(clinic.id(), id, payload.status)
        .await?;
    Ok(Json(ApiResponse::success(appointment)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/appointments/{id}",
    params(("id" = Uuid, Path, description = "Appointment ID")),
    responses(
        (status = 204, description = "Appointment deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "appointments"
)]
pub async fn delete_appointment(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.appointments.delete(clinic.id(), id).await?;
    Ok(no_content_response())
}

pub fn appointment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_appointments).post(create_appointment))
        .route(
            "/:id",
            get(get_appointment)
                .put(update_appointment)
                .delete(delete_appointment),
        )
        .route("/:id/status", post(change_appointment_status))
}
