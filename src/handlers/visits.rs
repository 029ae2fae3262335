use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use super::common::{created_response, no_content_response};
use crate::{
    entities::clinical_visit::Model as ClinicalVisit,
    errors::ServiceError,
    middleware_helpers::ClinicScope,
    services::visits::{CreateVisitRequest, UpdateVisitRequest},
    ApiResponse, ApiResult, AppState,
};

#[utoipa::path(
    post,
    path = "/api/v1/visits",
    request_body = CreateVisitRequest,
    responses(
        (status = 201, description = "Visit recorded", body = ApiResponse<ClinicalVisit>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Pet or appointment not found", body = crate::errors::ErrorResponse)
    ),
    tag = "visits"
)]
pub async fn create_visit(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Json(payload): Json<CreateVisitRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let visit = state.services.visits.create(clinic.id(), payload).await?;
    Ok(created_response(visit))
}

#[utoipa::path(
    get,
    path = "/api/v1/visits/{id}",
    params(("id" = Uuid, Path, description = "Visit ID")),
    responses(
        (status = 200, description = "Visit returned", body = ApiResponse<ClinicalVisit>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "visits"
)]
pub async fn get_visit(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
) -> ApiResult<ClinicalVisit> {
    let visit = state.services.visits.get(clinic.id(), id).await?;
    Ok(Json(ApiResponse::success(visit)))
}

#[utoipa::path(
    put,
    path = "/api/v1/visits/{id}",
    params(("id" = Uuid, Path, description = "Visit ID")),
    request_body = UpdateVisitRequest,
    responses(
        (status = 200, description = "Visit updated", body = ApiResponse<ClinicalVisit>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "visits"
)]
pub async fn update_visit(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVisitRequest>,
) -> ApiResult<ClinicalVisit> {
    let visit = state.services.visits.update(clinic.id(), id, payload).await?;
    Ok(Json(ApiResponse::success(visit)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/visits/{id}",
    params(("id" = Uuid, Path, description = "Visit ID")),
    responses(
        (status = 204, description = "Visit deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "visits"
)]
pub async fn delete_visit(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.visits.delete(clinic.id(), id).await?;
    Ok(no_content_response())
}

pub fn visit_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_visit))
        .route("/:id", get(get_visit).put(update_visit).delete(delete_visit))
}
