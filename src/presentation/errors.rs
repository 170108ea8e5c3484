// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::application::use_cases::scrape_job_use_case::ScrapeJobUseCaseError;

/// API 错误类型
///
/// 把用例错误映射为状态码和 `{ "error": message }` 响应体
#[derive(Debug)]
pub struct ApiError(ScrapeJobUseCaseError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ScrapeJobUseCaseError::Validation(_) => StatusCode::BAD_REQUEST,
            ScrapeJobUseCaseError::NotFound => StatusCode::NOT_FOUND,
            ScrapeJobUseCaseError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = self.0.to_string();
        if status.is_server_error() {
            error!("Request failed: {}", error_message);
        }

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

impl From<ScrapeJobUseCaseError> for ApiError {
    fn from(err: ScrapeJobUseCaseError) -> Self {
        Self(err)
    }
}
