// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::use_cases::scrape_job_use_case::ScrapeJobUseCase;
use crate::presentation::handlers::{agent_handler, scrape_handler};
use axum::{
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 创建应用路由
///
/// # 参数
///
/// * `use_case` - 所有处理器共享的抓取任务用例
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes(use_case: Arc<ScrapeJobUseCase>) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let api_routes = Router::new()
        .route("/v1/scrape", post(scrape_handler::start_scrape))
        .route(
            "/v1/scrape/{id}",
            get(scrape_handler::get_scrape_status).delete(scrape_handler::cancel_scrape),
        )
        .route("/v1/agents", get(agent_handler::list_agents))
        .route("/v1/agents/stats", get(agent_handler::agent_stats))
        .layer(Extension(use_case));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
