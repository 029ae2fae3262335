use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::common::{created_response, PaginationParams};
use crate::{
    entities::{notification::Model as Notification, NotificationKind},
    errors::ServiceError,
    middleware_helpers::ClinicScope,
    services::{
        notifications::{MarkedCount, NotificationFilter, ReminderRun},
        vaccinations::DueQuery,
    },
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

/// Manually posted note for the front desk
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateNotificationRequest {
    #[serde(default = "default_kind")]
    pub kind: NotificationKind,
    #[validate(length(min = 1, max = 200, message = "title is required"))]
    pub title: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub message: String,
}

fn default_kind() -> NotificationKind {
    NotificationKind::General
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnreadCount {
    pub unread: u64,
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    params(PaginationParams, NotificationFilter),
    responses(
        (status = 200, description = "Notifications, newest first", body = ApiResponse<PaginatedResponse<Notification>>)
    ),
    tag = "notifications"
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<NotificationFilter>,
) -> ApiResult<PaginatedResponse<Notification>> {
    let page = pagination.resolve(&state.config);
    let (items, total) = state
        .services
        .notifications
        .list(clinic.id(), filter, page)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(items, total, page))))
}

#[utoipa::path(
    post,
    path = "/api/v1/notifications",
    request_body = CreateNotificationRequest,
    responses(
        (status = 201, description = "Notification posted", body = ApiResponse<Notification>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "notifications"
)]
pub async fn create_notification(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Json(payload): Json<CreateNotificationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let notification = state
        .services
        .notifications
        .create(clinic.id(), payload.kind, payload.title, payload.message)
        .await?;
    Ok(created_response(notification))
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications/unread-count",
    responses(
        (status = 200, description = "Number of unread notifications", body = ApiResponse<UnreadCount>)
    ),
    tag = "notifications"
)]
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
) -> ApiResult<UnreadCount> {
    let unread = state.services.notifications.unread_count(clinic.id()).await?;
    Ok(Json(ApiResponse::success(UnreadCount { unread })))
}

#[utoipa::path(
    post,
    path = "/api/v1/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification marked read", body = ApiResponse<Notification>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "notifications"
)]
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Path(id): Path<Uuid>,
) -> ApiResult<Notification> {
    let notification = state
        .services
        .notifications
        .mark_read(clinic.id(), id)
        .await?;
    Ok(Json(ApiResponse::success(notification)))
}

#[utoipa::path(
    post,
    path = "/api/v1/notifications/read-all",
    responses(
        (status = 200, description = "Unread notifications marked read", body = ApiResponse<MarkedCount>)
    ),
    tag = "notifications"
)]
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
) -> ApiResult<MarkedCount> {
    let marked = state.services.notifications.mark_all_read(clinic.id()).await?;
    Ok(Json(ApiResponse::success(marked)))
}

/// Creates VACCINE_DUE notifications for records not reminded yet
#[utoipa::path(
    post,
    path = "/api/v1/notifications/vaccine-reminders",
    params(DueQuery),
    responses(
        (status = 200, description = "Reminders generated", body = ApiResponse<ReminderRun>),
        (status = 400, description = "Invalid window", body = crate::errors::ErrorResponse)
    ),
    tag = "notifications"
)]
pub async fn generate_vaccine_reminders(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
    Query(query): Query<DueQuery>,
) -> ApiResult<ReminderRun> {
    let days = query.days.unwrap_or(state.config.vaccine_reminder_days);
    let run = state
        .services
        .notifications
        .generate_vaccine_reminders(clinic.id(), days)
        .await?;
    let message = format!("{} reminder(s) created", run.created.len());
    Ok(Json(ApiResponse::with_message(run, message)))
}

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications).post(create_notification))
        .route("/unread-count", get(unread_count))
        .route("/read-all", post(mark_all_read))
        .route("/vaccine-reminders", post(generate_vaccine_reminders))
        .route("/:id/read", post(mark_read))
}
