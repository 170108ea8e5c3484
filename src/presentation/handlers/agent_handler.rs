// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Query},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::{
    application::use_cases::scrape_job_use_case::ScrapeJobUseCase,
    domain::models::agent::AgentFilter,
    presentation::errors::ApiError,
};

/// 列出经纪人，支持地区、房产类型和仅线索过滤
pub async fn list_agents(
    Extension(use_case): Extension<Arc<ScrapeJobUseCase>>,
    Query(filter): Query<AgentFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let agents = use_case.list_agents(&filter).await?;
    Ok(Json(agents))
}

/// 经纪人统计
pub async fn agent_stats(
    Extension(use_case): Extension<Arc<ScrapeJobUseCase>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(use_case.agent_stats().await?))
}
