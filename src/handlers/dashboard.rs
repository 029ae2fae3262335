use axum::{extract::State, routing::get, Extension, Json, Router};

use crate::{
    middleware_helpers::ClinicScope, services::dashboard::DashboardSummary, ApiResponse,
    ApiResult, AppState,
};

#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    responses(
        (status = 200, description = "Today's front-desk overview", body = ApiResponse<DashboardSummary>),
        (status = 404, description = "No clinic configured", body = crate::errors::ErrorResponse)
    ),
    tag = "dashboard"
)]
pub async fn dashboard_summary(
    State(state): State<AppState>,
    Extension(clinic): Extension<ClinicScope>,
) -> ApiResult<DashboardSummary> {
    let summary = state.services.dashboard.summary(clinic.id()).await?;
    Ok(Json(ApiResponse::success(summary)))
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/", get(dashboard_summary))
}
