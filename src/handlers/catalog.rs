use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use uuid::Uuid;

use super::common::{created_response, PaginationParams};
use crate::{
    entities::service::Model as Service,
    errors::ServiceError,
    middleware_helpers::ClinicScope,
    services::catalog::{
        CreateServiceRequest, RemovalOutcome, ServiceFilter, UpdateServiceRequest,
    },
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

#[utoipa::path(
    get,
    path = "/api/v1/services",
    params(PaginationParams, ServiceFilter),
    responses(
        (status = 200, description = "Catalog services returned", body = ApiResponse<PaginatedResponse<Service>>)
    ),
    tag = "services"
)]
pub async fn list_services(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<ServiceFilter>,
) -> ApiResult<PaginatedResponse<Service>> {
    let page = pagination.resolve(&state.config);
    let (items, total) = state.services.catalog.list(clinic.id(), filter, page).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(items, total, page))))
}

#[utoipa::path(
    post,
    path = "/api/v1/services",
    request_body = CreateServiceRequest,
    responses(
        (status = 201, description = "Service created", body = ApiResponse<Service>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "services"
)]
pub async fn create_service(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Json(payload): Json<CreateServiceRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let service = state.services.catalog.create(clinic.id(), payload).await?;
    Ok(created_response(service))
}

#[utoipa::path(
    get,
    path = "/api/v1/services/{id}",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Service returned", body = ApiResponse<Service>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "services"
)]
pub async fn get_service(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
) -> ApiResult<Service> {
    let service = state.services.catalog.get(clinic.id(), id).await?;
    Ok(Json(ApiResponse::success(service)))
}

#[utoipa::path(
    put,
    path = "/api/v1/services/{id}",
    params(("id" = Uuid, Path, description = "Service ID")),
    request_body = UpdateServiceRequest,
    responses(
        (status = 200, description = "Service updated", body = ApiResponse<Service>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "services"
)]
pub async fn update_service(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateServiceRequest>,
) -> ApiResult<Service> {
    let service = state
        .services
        .catalog
        .update(clinic.id(), id, payload)
        .await?;
    Ok(Json(ApiResponse::success(service)))
}

/// Services already billed are deactivated instead of deleted
#[utoipa::path(
    delete,
    path = "/api/v1/services/{id}",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Service removed", body = ApiResponse<RemovalOutcome>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "services"
)]
pub async fn delete_service(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
) -> ApiResult<RemovalOutcome> {
    let outcome = state.services.catalog.remove(clinic.id(), id).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

pub fn service_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_services).post(create_service))
        .route(
            "/:id",
            get(get_service).put(update_service).delete(delete_service),
        )
}
