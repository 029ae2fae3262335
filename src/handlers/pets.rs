use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use uuid::Uuid;

use super::common::{created_response, no_content_response, PaginationParams};
use crate::{
    entities::{
        clinical_visit::Model as ClinicalVisit, pet::Model as Pet,
        vaccination_record::Model as VaccinationRecord,
    },
    errors::ServiceError,
    middleware_helpers::ClinicScope,
    services::pets::{CreatePetRequest, PetFilter, PetHistory, UpdatePetRequest},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

#[utoipa::path(
    get,
    path = "/api/v1/pets",
    params(PaginationParams, PetFilter),
    responses(
        (status = 200, description = "Active pets returned", body = ApiResponse<PaginatedResponse<Pet>>)
    ),
    tag = "pets"
)]
pub async fn list_pets(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<PetFilter>,
) -> ApiResult<PaginatedResponse<Pet>> {
    let page = pagination.resolve(&state.config);
    let (items, total) = state.services.pets.list(clinic.id(), filter, page).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(items, total, page))))
}

#[utoipa::path(
    post,
    path = "/api/v1/pets",
    request_body = CreatePetRequest,
    responses(
        (status = 201, description = "Pet registered", body = ApiResponse<Pet>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Owner not found", body = crate::errors::ErrorResponse)
    ),
    tag = "pets"
)]
pub async fn create_pet(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Json(payload): Json<CreatePetRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let pet = state.services.pets.create(clinic.id(), payload).await?;
    Ok(created_response(pet))
}

#[utoipa::path(
    get,
    path = "/api/v1/pets/{id}",
    params(("id" = Uuid, Path, description = "Pet ID")),
    responses(
        (status = 200, description = "Pet returned", body = ApiResponse<Pet>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "pets"
)]
pub async fn get_pet(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
) -> ApiResult<Pet> {
    let pet = state.services.pets.get(clinic.id(), id).await?;
    Ok(Json(ApiResponse::success(pet)))
}

#[utoipa::path(
    put,
    path = "/api/v1/pets/{id}",
    params(("id" = Uuid, Path, description = "Pet ID")),
    request_body = UpdatePetRequest,
    responses(
        (status = 200, description = "Pet updated", body = ApiResponse<Pet>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "pets"
)]
pub async fn update_pet(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePetRequest>,
) -> ApiResult<Pet> {
    let pet = state.services.pets.update(clinic.id(), id, payload).await?;
    Ok(Json(ApiResponse::success(pet)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/pets/{id}",
    params(("id" = Uuid, Path, description = "Pet ID")),
    responses(
        (status = 204, description = "Pet deactivated"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "pets"
)]
pub async fn delete_pet(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.pets.deactivate(clinic.id(), id).await?;
    Ok(no_content_response())
}

/// Visits and vaccinations of a pet, newest first
#[utoipa::path(
    get,
    path = "/api/v1/pets/{id}/history",
    params(("id" = Uuid, Path, description = "Pet ID")),
    responses(
        (status = 200, description = "Clinical history", body = ApiResponse<PetHistory>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "pets"
)]
pub async fn pet_history(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
) -> ApiResult<PetHistory> {
    let history = state.services.pets.history(clinic.id(), id).await?;
    Ok(Json(ApiResponse::success(history)))
}

#[utoipa::path(
    get,
    path = "/api/v1/pets/{id}/visits",
    params(("id" = Uuid, Path, description = "Pet ID")),
    responses(
        (status = 200, description = "Clinical visits", body = ApiResponse<Vec<ClinicalVisit>>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "visits"
)]
pub async fn pet_visits(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<ClinicalVisit>> {
    let visits = state.services.visits.list_for_pet(clinic.id(), id).await?;
    Ok(Json(ApiResponse::success(visits)))
}

#[utoipa::path(
    get,
    path = "/api/v1/pets/{id}/vaccinations",
    params(("id" = Uuid, Path, description = "Pet ID")),
    responses(
        (status = 200, description = "Vaccination records", body = ApiResponse<Vec<VaccinationRecord>>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "vaccinations"
)]
pub async fn pet_vaccinations(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<VaccinationRecord>> {
    let records = state
        .services
        .vaccinations
        .list_for_pet(clinic.id(), id)
        .await?;
    Ok(Json(ApiResponse::success(records)))
}

pub fn pet_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_pets).post(create_pet))
        .route("/:id", get(get_pet).put(update_pet).delete(delete_pet))
        .route("/:id/history", get(pet_history))
        .route("/:id/visits", get(pet_visits))
        .route("/:id/vaccinations", get(pet_vaccinations))
}
