use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use super::common::created_response;
use crate::{
    entities::today_turn::Model as TodayTurn,
    errors::ServiceError,
    middleware_helpers::ClinicScope,
    services::today_turns::{
        BoardQuery, CreateTurnRequest, OwnerContact, SetTurnStatusRequest, TurnBoard,
    },
    ApiResponse, ApiResult, AppState,
};

/// Kanban board of one day
#[utoipa::path(
    get,
    path = "/api/v1/today-turns",
    params(BoardQuery),
    responses(
        (status = 200, description = "Turns grouped by status", body = ApiResponse<TurnBoard>)
    ),
    tag = "today-turns"
)]
pub async fn turn_board(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Query(query): Query<BoardQuery>,
) -> ApiResult<TurnBoard> {
    let board = state
        .services
        .today_turns
        .board(clinic.id(), query.date)
        .await?;
    Ok(Json(ApiResponse::success(board)))
}

#[utoipa::path(
    post,
    path = "/api/v1/today-turns",
    request_body = CreateTurnRequest,
    responses(
        (status = 201, description = "Turn created with the next ticket of the day", body = ApiResponse<TodayTurn>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Client or pet not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Ticket number could not be allocated", body = crate::errors::ErrorResponse)
    ),
    tag = "today-turns"
)]
pub async fn create_turn(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Json(payload): Json<CreateTurnRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let turn = state
        .services
        .today_turns
        .create(clinic.id(), payload)
        .await?;
    Ok(created_response(turn))
}

#[utoipa::path(
    get,
    path = "/api/v1/today-turns/{id}",
    params(("id" = Uuid, Path, description = "Turn ID")),
    responses(
        (status = 200, description = "Turn returned", body = ApiResponse<TodayTurn>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "today-turns"
)]
pub async fn get_turn(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
) -> ApiResult<TodayTurn> {
    let turn = state.services.today_turns.get(clinic.id(), id).await?;
    Ok(Json(ApiResponse::success(turn)))
}

#[utoipa::path(
    post,
    path = "/api/v1/today-turns/{id}/advance",
    params(("id" = Uuid, Path, description = "Turn ID")),
    responses(
        (status = 200, description = "Turn moved one step forward", body = ApiResponse<TodayTurn>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Turn is delivered or cancelled", body = crate::errors::ErrorResponse)
    ),
    tag = "today-turns"
)]
pub async fn advance_turn(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
) -> ApiResult<TodayTurn> {
    let turn = state.services.today_turns.advance(clinic.id(), id).await?;
    Ok(Json(ApiResponse::success(turn)))
}

#[utoipa::path(
    post,
    path = "/api/v1/today-turns/{id}/status",
    params(("id" = Uuid, Path, description = "Turn ID")),
    request_body = SetTurnStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<TodayTurn>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Status would skip a step", body = crate::errors::ErrorResponse)
    ),
    tag = "today-turns"
)]
pub async fn set_turn_status(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetTurnStatusRequest>,
) -> ApiResult<TodayTurn> {
    let turn = state
        .services
        .today_turns
        .set_status(clinic.id(), id, payload.status)
        .await?;
    Ok(Json(ApiResponse::success(turn)))
}

#[utoipa::path(
    post,
    path = "/api/v1/today-turns/{id}/cancel",
    params(("id" = Uuid, Path, description = "Turn ID")),
    responses(
        (status = 200, description = "Turn cancelled", body = ApiResponse<TodayTurn>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Turn already closed", body = crate::errors::ErrorResponse)
    ),
    tag = "today-turns"
)]
pub async fn cancel_turn(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
) -> ApiResult<TodayTurn> {
    let turn = state.services.today_turns.cancel(clinic.id(), id).await?;
    Ok(Json(ApiResponse::success(turn)))
}

/// Flags the owner as notified and returns phone and WhatsApp links
#[utoipa::path(
    post,
    path = "/api/v1/today-turns/{id}/notify",
    params(("id" = Uuid, Path, description = "Turn ID")),
    responses(
        (status = 200, description = "Owner contact links", body = ApiResponse<OwnerContact>),
        (status = 400, description = "Turn was cancelled", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "today-turns"
)]
pub async fn notify_owner(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
) -> ApiResult<OwnerContact> {
    let contact = state
        .services
        .today_turns
        .notify_owner(clinic.id(), id)
        .await?;
    Ok(Json(ApiResponse::success(contact)))
}

pub fn today_turn_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(turn_board).post(create_turn))
        .route("/:id", get(get_turn))
        .route("/:id/advance", post(advance_turn))
        .route("/:id/status", post(set_turn_status))
        .route("/:id/cancel", post(cancel_turn))
        .route("/:id/notify", post(notify_owner))
}
