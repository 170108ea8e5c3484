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

use leadscout::application::use_cases::scrape_job_use_case::ScrapeJobUseCase;
use leadscout::config::settings::Settings;
use leadscout::domain::repositories::job_repository::JobRepository;
use leadscout::domain::repositories::result_repository::ResultRepository;
use leadscout::domain::services::field_extractor::{ExtractorSelectors, FieldExtractor};
use leadscout::domain::services::identity_resolver::IdentityResolver;
use leadscout::domain::services::lead_classifier::LeadClassifier;
use leadscout::domain::services::page_crawler::PageCrawler;
use leadscout::engines::chromium_engine::ChromiumEngine;
use leadscout::infrastructure::database::connection;
use leadscout::infrastructure::metrics;
use leadscout::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use leadscout::infrastructure::repositories::result_repo_impl::ResultRepositoryImpl;
use leadscout::presentation::routes;
use leadscout::utils::telemetry;
use leadscout::workers::{ScrapeJobWorker, WorkerManager};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{debug, error, info};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting leadscout...");

    // 2. Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded");

    metrics::init_metrics(&settings.metrics);

    // 3. Connect to database
    let db = Arc::new(connection::create_pool(&settings.database).await?);
    info!("Database connection established");
    connection::run_migrations(db.as_ref()).await?;

    // 4. Initialize components
    let jobs: Arc<dyn JobRepository> = Arc::new(JobRepositoryImpl::new(db.clone()));
    let results: Arc<dyn ResultRepository> = Arc::new(ResultRepositoryImpl::new(db.clone()));

    let engine = Arc::new(ChromiumEngine::new(settings.browser.clone()));
    let crawler = Arc::new(PageCrawler::new(engine, settings.crawler.clone()));
    let extractor = Arc::new(FieldExtractor::new(&ExtractorSelectors::default())?);
    let resolver = Arc::new(IdentityResolver::new(
        results.clone(),
        LeadClassifier::new(&settings.crawler.base_url),
        settings.identity,
        settings.crawler.source_label.clone(),
    ));

    // 5. Start worker manager
    let worker = Arc::new(ScrapeJobWorker::new(
        jobs.clone(),
        results.clone(),
        crawler,
        extractor,
        resolver,
    ));
    let manager = Arc::new(
        WorkerManager::new(
            worker,
            jobs.clone(),
            settings.concurrency.max_concurrent_jobs,
        )
        .with_progress_callback(Arc::new(|progress, total, leads| {
            metrics::record_item_processed();
            debug!("Scrape progress {}/{} ({} leads)", progress, total, leads);
        })),
    );

    let use_case = Arc::new(ScrapeJobUseCase::new(
        jobs,
        results,
        manager.clone(),
        settings.crawler.clone(),
    ));

    // 6. Start HTTP server
    let app = routes::routes(use_case);
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    manager.shutdown(settings.concurrency.shutdown_grace()).await;
    info!("leadscout stopped");
    Ok(())
}

/// 等待关闭信号
async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => error!("Unable to listen for shutdown signal: {}", err),
    }
}
