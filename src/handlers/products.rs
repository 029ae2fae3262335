use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::{created_response, PaginationParams};
use crate::{
    entities::{product::Model as Product, stock_movement::Model as StockMovement},
    errors::ServiceError,
    middleware_helpers::ClinicScope,
    services::{
        catalog::RemovalOutcome,
        products::{
            CreateProductRequest, ProductFilter, StockAdjustmentRequest, UpdateProductRequest,
        },
    },
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

/// Product after a manual stock change, with the audit row written for it
#[derive(Debug, Serialize, ToSchema)]
pub struct StockAdjustmentResponse {
    pub product: Product,
    pub movement: StockMovement,
}

#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(PaginationParams, ProductFilter),
    responses(
        (status = 200, description = "Products returned", body = ApiResponse<PaginatedResponse<Product>>)
    ),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<ProductFilter>,
) -> ApiResult<PaginatedResponse<Product>> {
    let page = pagination.resolve(&state.config);
    let (items, total) = state.services.products.list(clinic.id(), filter, page).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(items, total, page))))
}

#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ApiResponse<Product>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.products.create(clinic.id(), payload).await?;
    Ok(created_response(product))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/low-stock",
    responses(
        (status = 200, description = "Tracked products at or below their minimum", body = ApiResponse<Vec<Product>>)
    ),
    tag = "products"
)]
pub async fn low_stock_products(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
) -> ApiResult<Vec<Product>> {
    let products = state.services.products.low_stock(clinic.id()).await?;
    Ok(Json(ApiResponse::success(products)))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product returned", body = ApiResponse<Product>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
) -> ApiResult<Product> {
    let product = state.services.products.get(clinic.id(), id).await?;
    Ok(Json(ApiResponse::success(product)))
}

#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<Product>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> ApiResult<Product> {
    let product = state
        .services
        .products
        .update(clinic.id(), id, payload)
        .await?;
    Ok(Json(ApiResponse::success(product)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product removed", body = ApiResponse<RemovalOutcome>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
) -> ApiResult<RemovalOutcome> {
    let outcome = state.services.products.remove(clinic.id(), id).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

#[utoipa::path(
    post,
    path = "/api/v1/products/{id}/stock-adjustments",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = StockAdjustmentRequest,
    responses(
        (status = 201, description = "Stock adjusted", body = ApiResponse<StockAdjustmentResponse>),
        (status = 400, description = "Invalid adjustment or untracked product", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn adjust_stock(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StockAdjustmentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let (product, movement) = state
        .services
        .products
        .adjust_stock(clinic.id(), id, payload)
        .await?;
    Ok(created_response(StockAdjustmentResponse { product, movement }))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/movements",
    params(("id" = Uuid, Path, description = "Product ID"), PaginationParams),
    responses(
        (status = 200, description = "Stock movements, newest first", body = ApiResponse<PaginatedResponse<StockMovement>>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn stock_movements(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<PaginatedResponse<StockMovement>> {
    let page = pagination.resolve(&state.config);
    let (items, total) = state
        .services
        .products
        .movements(clinic.id(), id, page)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(items, total, page))))
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/low-stock", get(low_stock_products))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/:id/stock-adjustments", post(adjust_stock))
        .route("/:id/movements", get(stock_movements))
}
