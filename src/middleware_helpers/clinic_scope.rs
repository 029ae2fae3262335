//! Resolves the clinic every scoped request operates on.
//!
//! The `x-clinic-id` header wins when present and must name an existing
//! clinic. Otherwise the configured default clinic is used, falling back to
//! the oldest clinic row. Handlers read the result through
//! `Extension<ClinicScope>`.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{errors::ServiceError, AppState};

/// Header carrying an explicit clinic id
pub const CLINIC_ID_HEADER: &str = "x-clinic-id";

/// Clinic the current request is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClinicScope(pub Uuid);

impl ClinicScope {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

fn requested_clinic(request: &Request) -> Result<Option<Uuid>, ServiceError> {
    let Some(raw) = request.headers().get(CLINIC_ID_HEADER) else {
        return Ok(None);
    };
    raw.to_str()
        .ok()
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .map(Some)
        .ok_or_else(|| {
            ServiceError::BadRequest(format!("{} must be a valid UUID", CLINIC_ID_HEADER))
        })
}

pub async fn clinic_scope_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let resolved = match requested_clinic(&request) {
        Ok(requested) => {
            state
                .services
                .clinics
                .resolve(requested, state.config.default_clinic_id)
                .await
        }
        Err(err) => Err(err),
    };

    match resolved {
        Ok(clinic) => {
            tracing::debug!(clinic_id = %clinic.id, "clinic scope resolved");
            request.extensions_mut().insert(ClinicScope(clinic.id));
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}
