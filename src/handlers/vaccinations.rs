use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use super::common::{created_response, no_content_response};
use crate::{
    entities::{
        vaccination_record::Model as VaccinationRecord, vaccine_catalog::Model as Vaccine,
    },
    errors::ServiceError,
    middleware_helpers::ClinicScope,
    services::{
        catalog::RemovalOutcome,
        vaccinations::{
            CreateVaccineRequest, DueQuery, DueVaccination, RecordVaccinationRequest,
            UpdateVaccineRequest, VaccineFilter,
        },
    },
    ApiResponse, ApiResult, AppState,
};

#[utoipa::path(
    get,
    path = "/api/v1/vaccines",
    params(VaccineFilter),
    responses(
        (status = 200, description = "Vaccine catalog", body = ApiResponse<Vec<Vaccine>>)
    ),
    tag = "vaccinations"
)]
pub async fn list_vaccines(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Query(filter): Query<VaccineFilter>,
) -> ApiResult<Vec<Vaccine>> {
    let vaccines = state
        .services
        .vaccinations
        .list_vaccines(clinic.id(), filter)
        .await?;
    Ok(Json(ApiResponse::success(vaccines)))
}

#[utoipa::path(
    post,
    path = "/api/v1/vaccines",
    request_body = CreateVaccineRequest,
    responses(
        (status = 201, description = "Vaccine added to the catalog", body = ApiResponse<Vaccine>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "vaccinations"
)]
pub async fn create_vaccine(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Json(payload): Json<CreateVaccineRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let vaccine = state
        .services
        .vaccinations
        .create_vaccine(clinic.id(), payload)
        .await?;
    Ok(created_response(vaccine))
}

#[utoipa::path(
    get,
    path = "/api/v1/vaccines/{id}",
    params(("id" = Uuid, Path, description = "Vaccine ID")),
    responses(
        (status = 200, description = "Vaccine returned", body = ApiResponse<Vaccine>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "vaccinations"
)]
pub async fn get_vaccine(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vaccine> {
    let vaccine = state.services.vaccinations.get_vaccine(clinic.id(), id).await?;
    Ok(Json(ApiResponse::success(vaccine)))
}

#[utoipa::path(
    put,
    path = "/api/v1/vaccines/{id}",
    params(("id" = Uuid, Path, description = "Vaccine ID")),
    request_body = UpdateVaccineRequest,
    responses(
        (status = 200, description = "Vaccine updated", body = ApiResponse<Vaccine>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "vaccinations"
)]
pub async fn update_vaccine(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVaccineRequest>,
) -> ApiResult<Vaccine> {
    let vaccine = state
        .services
        .vaccinations
        .update_vaccine(clinic.id(), id, payload)
        .await?;
    Ok(Json(ApiResponse::success(vaccine)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/vaccines/{id}",
    params(("id" = Uuid, Path, description = "Vaccine ID")),
    responses(
        (status = 200, description = "Vaccine removed or deactivated", body = ApiResponse<RemovalOutcome>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "vaccinations"
)]
pub async fn delete_vaccine(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
) -> ApiResult<RemovalOutcome> {
    let outcome = state
        .services
        .vaccinations
        .remove_vaccine(clinic.id(), id)
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}

#[utoipa::path(
    post,
    path = "/api/v1/vaccinations",
    request_body = RecordVaccinationRequest,
    responses(
        (status = 201, description = "Vaccination recorded", body = ApiResponse<VaccinationRecord>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Pet or vaccine not found", body = crate::errors::ErrorResponse)
    ),
    tag = "vaccinations"
)]
pub async fn record_vaccination(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Json(payload): Json<RecordVaccinationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let record = state
        .services
        .vaccinations
        .record(clinic.id(), payload)
        .await?;
    Ok(created_response(record))
}

/// Doses due within the window, overdue ones included
#[utoipa::path(
    get,
    path = "/api/v1/vaccinations/due",
    params(DueQuery),
    responses(
        (status = 200, description = "Due vaccinations, soonest first", body = ApiResponse<Vec<DueVaccination>>),
        (status = 400, description = "Invalid window", body = crate::errors::ErrorResponse)
    ),
    tag = "vaccinations"
)]
pub async fn due_vaccinations(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Query(query): Query<DueQuery>,
) -> ApiResult<Vec<DueVaccination>> {
    let days = query.days.unwrap_or(state.config.vaccine_reminder_days);
    let due = state
        .services
        .vaccinations
        .due_within(clinic.id(), days)
        .await?;
    Ok(Json(ApiResponse::success(due)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/vaccinations/{id}",
    params(("id" = Uuid, Path, description = "Vaccination record ID")),
    responses(
        (status = 204, description = "Record deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "vaccinations"
)]
pub async fn delete_vaccination(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .vaccinations
        .delete_record(clinic.id(), id)
        .await?;
    Ok(no_content_response())
}

pub fn vaccine_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vaccines).post(create_vaccine))
        .route(
            "/:id",
            get(get_vaccine).put(update_vaccine).delete(delete_vaccine),
        )
}

pub fn vaccination_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(record_vaccination))
        .route("/due", get(due_vaccinations))
        .route("/:id", delete(delete_vaccination))
}
