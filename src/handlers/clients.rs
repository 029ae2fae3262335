use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use uuid::Uuid;

use super::common::{created_response, no_content_response, PaginationParams};
use crate::{
    entities::{client::Model as Client, invoice::Model as Invoice, pet::Model as Pet},
    errors::ServiceError,
    middleware_helpers::ClinicScope,
    services::clients::{ClientFilter, CreateClientRequest, UpdateClientRequest},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

#[utoipa::path(
    get,
    path = "/api/v1/clients",
    params(PaginationParams, ClientFilter),
    responses(
        (status = 200, description = "Clients returned", body = ApiResponse<PaginatedResponse<Client>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "clients"
)]
pub async fn list_clients(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<ClientFilter>,
) -> ApiResult<PaginatedResponse<Client>> {
    let page = pagination.resolve(&state.config);
    let (items, total) = state.services.clients.list(clinic.id(), filter, page).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(items, total, page))))
}

#[utoipa::path(
    post,
    path = "/api/v1/clients",
    request_body = CreateClientRequest,
    responses(
        (status = 201, description = "Client created", body = ApiResponse<Client>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "clients"
)]
pub async fn create_client(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Json(payload): Json<CreateClientRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let client = state.services.clients.create(clinic.id(), payload).await?;
    Ok(created_response(client))
}

#[utoipa::path(
    get,
    path = "/api/v1/clients/{id}",
    params(("id" = Uuid, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Client returned", body = ApiResponse<Client>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "clients"
)]
pub async fn get_client(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
) -> ApiResult<Client> {
    let client = state.services.clients.get(clinic.id(), id).await?;
    Ok(Json(ApiResponse::success(client)))
}

#[utoipa::path(
    put,
    path = "/api/v1/clients/{id}",
    params(("id" = Uuid, Path, description = "Client ID")),
    request_body = UpdateClientRequest,
    responses(
        (status = 200, description = "Client updated", body = ApiResponse<Client>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "clients"
)]
pub async fn update_client(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateClientRequest>,
) -> ApiResult<Client> {
    let client = state.services.clients.update(clinic.id(), id, payload).await?;
    Ok(Json(ApiResponse::success(client)))
}

/// Archive a client. Pets and invoices stay in place.
#[utoipa::path(
    delete,
    path = "/api/v1/clients/{id}",
    params(("id" = Uuid, Path, description = "Client ID")),
    responses(
        (status = 204, description = "Client archived"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "clients"
)]
pub async fn delete_client(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.clients.archive(clinic.id(), id).await?;
    Ok(no_content_response())
}

#[utoipa::path(
    get,
    path = "/api/v1/clients/{id}/pets",
    params(("id" = Uuid, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Active pets of the client", body = ApiResponse<Vec<Pet>>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "clients"
)]
pub async fn client_pets(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<Pet>> {
    let pets = state.services.clients.pets(clinic.id(), id).await?;
    Ok(Json(ApiResponse::success(pets)))
}

#[utoipa::path(
    get,
    path = "/api/v1/clients/{id}/invoices",
    params(("id" = Uuid, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Invoices of the client, newest first", body = ApiResponse<Vec<Invoice>>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "clients"
)]
pub async fn client_invoices(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<Invoice>> {
    let invoices = state.services.clients.invoices(clinic.id(), id).await?;
    Ok(Json(ApiResponse::success(invoices)))
}

pub fn client_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_clients).post(create_client))
        .route(
            "/:id",
            get(get_client).put(update_client).delete(delete_client),
        )
        .route("/:id/pets", get(client_pets))
        .route("/:id/invoices", get(client_invoices))
}
