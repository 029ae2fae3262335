use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use super::common::{created_response, PaginationParams};
use crate::{
    entities::invoice::Model as Invoice,
    errors::ServiceError,
    middleware_helpers::ClinicScope,
    services::invoices::{
        CreateInvoiceRequest, InvoiceDetail, InvoiceFilter, NewPayment, VoidInvoiceRequest,
    },
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

/// Create an invoice, optionally collecting a payment in the same transaction
#[utoipa::path(
    post,
    path = "/api/v1/invoices",
    request_body = CreateInvoiceRequest,
    responses(
        (status = 201, description = "Invoice created", body = ApiResponse<InvoiceDetail>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Client, pet or appointment not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Invoice number could not be allocated", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "invoices"
)]
pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Json(payload): Json<CreateInvoiceRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.services.invoices.create(clinic.id(), payload).await?;
    let ticket = ticket_url(&state, detail.invoice.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(detail, format!("Ticket: {}", ticket))),
    ))
}

fn ticket_url(state: &AppState, invoice_id: Uuid) -> String {
    format!(
        "{}/api/v1/invoices/{}/ticket",
        state.config.public_base_url(),
        invoice_id
    )
}

#[utoipa::path(
    get,
    path = "/api/v1/invoices",
    params(PaginationParams, InvoiceFilter),
    responses(
        (status = 200, description = "Invoices returned", body = ApiResponse<PaginatedResponse<Invoice>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "invoices"
)]
pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<InvoiceFilter>,
) -> ApiResult<PaginatedResponse<Invoice>> {
    let page = pagination.resolve(&state.config);
    let (items, total) = state.services.invoices.list(clinic.id(), filter, page).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(items, total, page))))
}

#[utoipa::path(
    get,
    path = "/api/v1/invoices/{id}",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Invoice with items and payments", body = ApiResponse<InvoiceDetail>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "invoices"
)]
pub async fn get_invoice(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
) -> ApiResult<InvoiceDetail> {
    let detail = state.services.invoices.get(clinic.id(), id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// Register a payment and reconcile the invoice status
#[utoipa::path(
    post,
    path = "/api/v1/invoices/{id}/payments",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    request_body = NewPayment,
    responses(
        (status = 201, description = "Payment registered", body = ApiResponse<InvoiceDetail>),
        (status = 400, description = "Invalid amount", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Invoice does not accept payments", body = crate::errors::ErrorResponse)
    ),
    tag = "invoices"
)]
pub async fn add_payment(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
    Json(payload): Json<NewPayment>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state
        .services
        .invoices
        .add_payment(clinic.id(), id, payload)
        .await?;
    Ok(created_response(detail))
}

#[utoipa::path(
    post,
    path = "/api/v1/invoices/{id}/issue",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Draft issued", body = ApiResponse<InvoiceDetail>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Invoice is not a draft", body = crate::errors::ErrorResponse)
    ),
    tag = "invoices"
)]
pub async fn issue_invoice(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
) -> ApiResult<InvoiceDetail> {
    let detail = state.services.invoices.issue(clinic.id(), id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

#[utoipa::path(
    post,
    path = "/api/v1/invoices/{id}/void",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    request_body = VoidInvoiceRequest,
    responses(
        (status = 200, description = "Invoice voided", body = ApiResponse<InvoiceDetail>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Invoice cannot be voided", body = crate::errors::ErrorResponse)
    ),
    tag = "invoices"
)]
pub async fn void_invoice(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
    payload: Option<Json<VoidInvoiceRequest>>,
) -> ApiResult<InvoiceDetail> {
    let request = payload.map(|Json(p)| p).unwrap_or_default();
    let detail = state.services.invoices.void(clinic.id(), id, request).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// Printable ticket view
#[utoipa::path(
    get,
    path = "/api/v1/invoices/{id}/ticket",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "HTML ticket", content_type = "text/html", body = String),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "invoices"
)]
pub async fn invoice_ticket(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, ServiceError> {
    let html = state.services.invoices.render_ticket(clinic.id(), id).await?;
    Ok(Html(html))
}

pub fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_invoices).post(create_invoice))
        .route("/:id", get(get_invoice))
        .route("/:id/payments", post(add_payment))
        .route("/:id/issue", post(issue_invoice))
        .route("/:id/void", post(void_invoice))
        .route("/:id/ticket", get(invoice_ticket))
}
