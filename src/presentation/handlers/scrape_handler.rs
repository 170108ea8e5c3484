// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    application::{
        dto::{
            scrape_request::StartScrapeDto,
            scrape_response::{ScrapeJobResponse, StartScrapeResponse},
        },
        use_cases::scrape_job_use_case::ScrapeJobUseCase,
    },
    presentation::errors::ApiError,
};

/// 启动抓取任务
///
/// 任务在后台运行，立即返回 `202` 和任务ID
pub async fn start_scrape(
    Extension(use_case): Extension<Arc<ScrapeJobUseCase>>,
    Json(payload): Json<StartScrapeDto>,
) -> Result<impl IntoResponse, ApiError> {
    let job = use_case.start(payload).await?;
    Ok((StatusCode::ACCEPTED, Json(StartScrapeResponse::from(&job))))
}

/// 查询任务状态
pub async fn get_scrape_status(
    Extension(use_case): Extension<Arc<ScrapeJobUseCase>>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let job = use_case.get_job(job_id).await?;
    Ok(Json(ScrapeJobResponse::from(job)))
}

/// 取消任务
pub async fn cancel_scrape(
    Extension(use_case): Extension<Arc<ScrapeJobUseCase>>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    use_case.cancel_job(job_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
