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

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::models::scrape_job::{expected_total, JobUpdate, ScrapeJob};
use crate::domain::repositories::job_repository::{JobRepository, RepositoryError};
use crate::domain::repositories::result_repository::ResultRepository;
use crate::domain::services::field_extractor::{ExtractedPage, FieldExtractor};
use crate::domain::services::identity_resolver::{IdentityResolver, Resolution};
use crate::domain::services::page_crawler::{CrawlSession, PageCrawler};
use crate::engines::traits::EngineError;
use crate::infrastructure::metrics;

/// 关闭时写入被中断任务的失败原因
pub const INTERRUPTED_BY_SHUTDOWN: &str = "Scrape job interrupted by shutdown";

/// 进度回调：`(已处理数, 预期总数, 线索数)`
pub type ProgressCallback = Arc<dyn Fn(u32, u32, u32) + Send + Sync>;

/// 任务运行级错误
///
/// `Display` 输出即写入任务记录的失败原因。
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("Job store unavailable: {0}")]
    Repository(#[from] RepositoryError),
}

/// 一次运行的最终结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    Cancelled,
    Failed,
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobOutcome::Completed => write!(f, "completed"),
            JobOutcome::Cancelled => write!(f, "cancelled"),
            JobOutcome::Failed => write!(f, "failed"),
        }
    }
}

enum Flow {
    Finished,
    Cancelled,
    /// 服务关闭，任务在检查点处停下
    Interrupted,
}

/// 单次运行的计数
struct RunState {
    job_id: Uuid,
    progress: u32,
    total: u32,
    /// 经纪人片段被判定为线索且写入成功的条目数
    leads_found: u32,
}

/// 抓取任务工作器
///
/// 驱动一个任务从列表页到详情页的完整流程：逐页、逐条串行处理，
/// 在每个列表页和每个详情页之前检查取消标记，单条失败只跳过该条。
/// 浏览器会话在所有退出路径上恰好关闭一次。
pub struct ScrapeJobWorker {
    jobs: Arc<dyn JobRepository>,
    results: Arc<dyn ResultRepository>,
    crawler: Arc<PageCrawler>,
    extractor: Arc<FieldExtractor>,
    resolver: Arc<IdentityResolver>,
    stopping: AtomicBool,
}

impl ScrapeJobWorker {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        results: Arc<dyn ResultRepository>,
        crawler: Arc<PageCrawler>,
        extractor: Arc<FieldExtractor>,
        resolver: Arc<IdentityResolver>,
    ) -> Self {
        Self {
            jobs,
            results,
            crawler,
            extractor,
            resolver,
            stopping: AtomicBool::new(false),
        }
    }

    /// 要求所有运行中的任务在下一个检查点停下
    ///
    /// 停下的任务写为 `failed`，已处理的条目和进度保留。
    pub fn request_stop(&self) {
        self.stopping.store(true, Ordering::SeqCst);
    }

    /// 执行任务并把终止状态写回任务记录
    ///
    /// 被取消的任务保持取消方写入的状态，不会被改写为 `completed` 或 `failed`。
    #[instrument(skip(self, job, on_progress), fields(job_id = %job.id, location = %job.location))]
    pub async fn run(&self, job: &ScrapeJob, on_progress: Option<ProgressCallback>) -> JobOutcome {
        info!("Starting scrape job ({} pages)", job.max_pages);

        let outcome = match self.execute(job, on_progress.as_ref()).await {
            Ok(Flow::Finished) => {
                if let Err(e) = self.jobs.update(job.id, &JobUpdate::completed()).await {
                    error!("Failed to mark job completed: {}", e);
                }
                info!("Scrape job completed");
                JobOutcome::Completed
            }
            Ok(Flow::Cancelled) => {
                info!("Scrape job cancelled, stopping");
                JobOutcome::Cancelled
            }
            Ok(Flow::Interrupted) => {
                warn!("Scrape job interrupted by shutdown");
                let update = JobUpdate::failed(INTERRUPTED_BY_SHUTDOWN);
                if let Err(e) = self.jobs.update(job.id, &update).await {
                    error!("Failed to record job interruption: {}", e);
                }
                JobOutcome::Failed
            }
            Err(e) => {
                error!("Scrape job failed: {}", e);
                if let Err(write_err) = self.jobs.update(job.id, &JobUpdate::failed(e.to_string())).await {
                    error!("Failed to record job failure: {}", write_err);
                }
                JobOutcome::Failed
            }
        };

        metrics::record_job_finished(&outcome.to_string());
        outcome
    }

    async fn execute(
        &self,
        job: &ScrapeJob,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Flow, CrawlError> {
        self.crawler.check_environment()?;

        let mut session = self.crawler.open_session().await?;
        let result = self.crawl_pages(&mut session, job, on_progress).await;
        if let Err(e) = session.close().await {
            warn!("Failed to close browser session: {}", e);
        }
        result
    }

    async fn crawl_pages(
        &self,
        session: &mut CrawlSession<'_>,
        job: &ScrapeJob,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Flow, CrawlError> {
        let mut state = RunState {
            job_id: job.id,
            progress: 0,
            total: expected_total(job.max_pages),
            leads_found: 0,
        };

        for page in 1..=job.max_pages {
            if let Some(flow) = self.checkpoint(job.id).await? {
                return Ok(flow);
            }

            let links = session.fetch_index(&job.location, page).await?;
            if links.is_empty() {
                info!("No listings found on page {}, moving on", page);
                continue;
            }
            debug!("Processing {} listings from page {}", links.len(), page);

            for url in &links {
                if let Some(flow) = self.checkpoint(job.id).await? {
                    return Ok(flow);
                }
                self.process_item(session, url, &mut state, on_progress)
                    .await?;
            }
        }

        Ok(Flow::Finished)
    }

    /// 取消优先于关闭：已取消的任务不会被改写为 `failed`
    async fn checkpoint(&self, job_id: Uuid) -> Result<Option<Flow>, CrawlError> {
        if self.jobs.is_cancelled(job_id).await? {
            return Ok(Some(Flow::Cancelled));
        }
        if self.stopping.load(Ordering::SeqCst) {
            return Ok(Some(Flow::Interrupted));
        }
        Ok(None)
    }

    /// 处理单个详情页
    ///
    /// 导航失败或写入失败时跳过该条且不推进进度；页面可访问但无法提取时
    /// 推进进度但不写入任何记录。只有进度写入失败会向上传播。
    #[instrument(skip(self, session, state, on_progress), fields(url = %url))]
    async fn process_item(
        &self,
        session: &mut CrawlSession<'_>,
        url: &str,
        state: &mut RunState,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<(), CrawlError> {
        let page = match session.fetch_detail(url).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Skipping listing: {}", e);
                metrics::record_item_skipped();
                return Ok(());
            }
        };

        match self.extractor.extract(&page.content, url) {
            Ok(extracted) => match self.store(&extracted).await {
                Ok(resolution) => {
                    if resolution.lead {
                        state.leads_found += 1;
                    }
                }
                Err(e) => {
                    warn!("Skipping listing, failed to store results: {}", e);
                    metrics::record_item_skipped();
                    return Ok(());
                }
            },
            Err(e) => warn!("Nothing extracted: {}", e),
        }

        state.progress = (state.progress + 1).min(state.total);
        self.report_progress(state, on_progress).await
    }

    async fn store(&self, extracted: &ExtractedPage) -> Result<Resolution, RepositoryError> {
        let resolution = self
            .resolver
            .resolve(&extracted.agent, &extracted.listing)
            .await?;
        if resolution.created {
            metrics::record_agent_created();
        }

        let (listing, created) = self
            .results
            .create_listing(&extracted.listing, resolution.agent.id)
            .await?;
        if created {
            metrics::record_listing_scraped();
            debug!("Stored listing {} for agent {}", listing.id, resolution.agent.id);
        } else {
            debug!("Listing {} already stored", listing.url);
        }

        Ok(resolution)
    }

    async fn report_progress(
        &self,
        state: &RunState,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<(), CrawlError> {
        let leads_found = state.leads_found;
        self.jobs
            .update(
                state.job_id,
                &JobUpdate::progress(state.progress, state.total, leads_found),
            )
            .await?;

        if let Some(callback) = on_progress {
            callback(state.progress, state.total, leads_found);
        }
        Ok(())
    }
}
