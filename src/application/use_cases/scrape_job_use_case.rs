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

use crate::{
    application::dto::{scrape_request::StartScrapeDto, scrape_response::AgentView},
    config::settings::CrawlerSettings,
    domain::{
        models::{
            agent::{AgentFilter, AgentStats},
            scrape_job::ScrapeJob,
        },
        repositories::{
            job_repository::{JobRepository, RepositoryError},
            result_repository::ResultRepository,
        },
    },
    utils::phone::whatsapp_link,
    workers::manager::JobScheduler,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Error, Debug)]
pub enum ScrapeJobUseCaseError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Scrape job not found")]
    NotFound,
    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ScrapeJobUseCaseError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ScrapeJobUseCaseError::NotFound,
            other => ScrapeJobUseCaseError::Repository(other),
        }
    }
}

/// 抓取任务用例
///
/// 启动、查询和取消任务，以及查询抓取结果
pub struct ScrapeJobUseCase {
    jobs: Arc<dyn JobRepository>,
    results: Arc<dyn ResultRepository>,
    scheduler: Arc<dyn JobScheduler>,
    settings: CrawlerSettings,
}

impl ScrapeJobUseCase {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        results: Arc<dyn ResultRepository>,
        scheduler: Arc<dyn JobScheduler>,
        settings: CrawlerSettings,
    ) -> Self {
        Self {
            jobs,
            results,
            scheduler,
            settings,
        }
    }

    /// 创建任务并交给后台执行，立即返回
    ///
    /// # 返回值
    ///
    /// * `Ok(ScrapeJob)` - 处于 `pending` 状态的新任务
    /// * `Err(ScrapeJobUseCaseError::Validation)` - 参数不合法
    pub async fn start(&self, dto: StartScrapeDto) -> Result<ScrapeJob, ScrapeJobUseCaseError> {
        dto.validate()
            .map_err(|e| ScrapeJobUseCaseError::Validation(e.to_string()))?;

        let location = dto
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(&self.settings.default_location)
            .to_string();
        let max_pages = dto.max_pages.unwrap_or(self.settings.default_max_pages);
        if max_pages > self.settings.max_pages_limit {
            return Err(ScrapeJobUseCaseError::Validation(format!(
                "max_pages must not exceed {}",
                self.settings.max_pages_limit
            )));
        }

        let job = ScrapeJob::new(self.settings.source_label.clone(), location, max_pages);
        let job = self.jobs.create(&job).await?;
        info!(job_id = %job.id, "Created scrape job for {} ({} pages)", job.location, job.max_pages);

        self.scheduler.schedule(job.clone());
        Ok(job)
    }

    pub async fn get_job(&self, id: Uuid) -> Result<ScrapeJob, ScrapeJobUseCaseError> {
        self.jobs
            .find_by_id(id)
            .await?
            .ok_or(ScrapeJobUseCaseError::NotFound)
    }

    /// 请求取消任务；运行中的任务在下一个列表页或详情页之前停止
    pub async fn cancel_job(&self, id: Uuid) -> Result<ScrapeJob, ScrapeJobUseCaseError> {
        let job = self.jobs.request_cancel(id).await?;
        info!(job_id = %id, "Cancellation requested (status: {})", job.status);
        Ok(job)
    }

    /// 按条件列出经纪人及其房源
    pub async fn list_agents(
        &self,
        filter: &AgentFilter,
    ) -> Result<Vec<AgentView>, ScrapeJobUseCaseError> {
        let agents = self.results.list_agents(filter).await?;

        let mut views = Vec::with_capacity(agents.len());
        for agent in agents {
            let listings = self.results.listings_for_agent(agent.id).await?;
            let whatsapp_link = agent
                .phone
                .as_deref()
                .map(|phone| whatsapp_link(phone, &self.settings.dial_code));
            views.push(AgentView {
                agent,
                whatsapp_link,
                listings,
            });
        }
        Ok(views)
    }

    pub async fn agent_stats(&self) -> Result<AgentStats, ScrapeJobUseCaseError> {
        Ok(self.results.agent_stats().await?)
    }
}
