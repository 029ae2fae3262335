use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};

use super::common::created_response;
use crate::{
    entities::clinic::Model as Clinic,
    errors::ServiceError,
    middleware_helpers::ClinicScope,
    services::clinics::{CreateClinicRequest, UpdateClinicRequest, WeeklySchedule},
    ApiResponse, ApiResult, AppState,
};

/// Register a clinic. Works before any clinic exists, so it is not clinic scoped.
#[utoipa::path(
    post,
    path = "/api/v1/clinics",
    request_body = CreateClinicRequest,
    responses(
        (status = 201, description = "Clinic created", body = ApiResponse<Clinic>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "clinic"
)]
pub async fn create_clinic(
    State(state): State<AppState>,
    Json(payload): Json<CreateClinicRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let clinic = state
        .services
        .clinics
        .create(
            payload,
            &state.config.default_currency,
            state.config.default_tax_rate,
        )
        .await?;
    Ok(created_response(clinic))
}

/// Profile of the clinic the request resolves to
#[utoipa::path(
    get,
    path = "/api/v1/clinic",
    params(("x-clinic-id" = Option<String>, Header, description = "Explicit clinic id")),
    responses(
        (status = 200, description = "Clinic profile", body = ApiResponse<Clinic>),
        (status = 404, description = "No clinic configured", body = crate::errors::ErrorResponse)
    ),
    tag = "clinic"
)]
pub async fn current_clinic(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
) -> ApiResult<Clinic> {
    let clinic = state.services.clinics.get(clinic.id()).await?;
    Ok(Json(ApiResponse::success(clinic)))
}

#[utoipa::path(
    put,
    path = "/api/v1/clinic",
    request_body = UpdateClinicRequest,
    responses(
        (status = 200, description = "Clinic profile updated", body = ApiResponse<Clinic>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "clinic"
)]
pub async fn update_clinic(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Json(payload): Json<UpdateClinicRequest>,
) -> ApiResult<Clinic> {
    let clinic = state.services.clinics.update(clinic.id(), payload).await?;
    Ok(Json(ApiResponse::success(clinic)))
}

#[utoipa::path(
    get,
    path = "/api/v1/clinic/schedule",
    responses(
        (status = 200, description = "Weekly opening hours", body = ApiResponse<WeeklySchedule>)
    ),
    tag = "clinic"
)]
pub async fn get_schedule(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
) -> ApiResult<WeeklySchedule> {
    let schedule = state.services.clinics.schedule(clinic.id()).await?;
    Ok(Json(ApiResponse::success(schedule)))
}

#[utoipa::path(
    put,
    path = "/api/v1/clinic/schedule",
    request_body = WeeklySchedule,
    responses(
        (status = 200, description = "Weekly opening hours replaced", body = ApiResponse<WeeklySchedule>),
        (status = 400, description = "Invalid schedule", body = crate::errors::ErrorResponse)
    ),
    tag = "clinic"
)]
pub async fn update_schedule(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Json(payload): Json<WeeklySchedule>,
) -> ApiResult<WeeklySchedule> {
    let schedule = state
        .services
        .clinics
        .update_schedule(clinic.id(), payload)
        .await?;
    Ok(Json(ApiResponse::success(schedule)))
}

/// Routes that need a resolved clinic
pub fn clinic_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(current_clinic).put(update_clinic))
        .route("/schedule", get(get_schedule).put(update_schedule))
}

pub fn clinic_registration_routes() -> Router<AppState> {
    Router::new().route("/clinics", post(create_clinic))
}
