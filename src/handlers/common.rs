use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use crate::{config::AppConfig, services::PageRequest, ApiResponse, PaginatedResponse};

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> impl IntoResponse {
    (StatusCode::CREATED, Json(ApiResponse::success(data)))
}

/// Standard no content response
pub fn no_content_response() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Pagination parameters for list operations
#[derive(Debug, Default, Deserialize, Serialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// 1-based page number
    pub page: Option<u64>,
    /// Falls back to the configured default page size
    pub per_page: Option<u64>,
}

impl PaginationParams {
    /// Clamps the requested page size to the configured maximum.
    pub fn resolve(&self, config: &AppConfig) -> PageRequest {
        let per_page = self
            .per_page
            .unwrap_or(config.api_default_page_size)
            .min(config.api_max_page_size.max(1));
        PageRequest::new(self.page.unwrap_or(1), per_page)
    }
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: PageRequest) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + page.per_page - 1) / page.per_page
        };
        Self {
            items,
            total,
            page: page.page,
            limit: page.per_page,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".into(),
            "127.0.0.1".into(),
            8080,
            "test".into(),
        );
        cfg.api_default_page_size = 20;
        cfg.api_max_page_size = 50;
        cfg
    }

    #[test]
    fn page_size_is_clamped() {
        let params = PaginationParams {
            page: Some(3),
            per_page: Some(500),
        };
        let page = params.resolve(&config());
        assert_eq!(page.page, 3);
        assert_eq!(page.per_page, 50);
    }

    #[test]
    fn defaults_come_from_config() {
        let page = PaginationParams::default().resolve(&config());
        assert_eq!((page.page, page.per_page), (1, 20));
    }

    #[test]
    fn total_pages_rounds_up() {
        let response = PaginatedResponse::new(vec![1, 2], 41, PageRequest::new(1, 20));
        assert_eq!(response.total_pages, 3);
        let empty = PaginatedResponse::<u8>::new(vec![], 0, PageRequest::new(1, 20));
        assert_eq!(empty.total_pages, 0);
    }
}
