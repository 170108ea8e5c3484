// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::agent::Agent;
use crate::domain::models::listing::Listing;
use crate::domain::models::scrape_job::{JobStatus, ScrapeJob};
use serde::Serialize;
use uuid::Uuid;

/// 启动任务后的响应
#[derive(Debug, Serialize)]
pub struct StartScrapeResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub total: u32,
}

impl From<&ScrapeJob> for StartScrapeResponse {
    fn from(job: &ScrapeJob) -> Self {
        Self {
            job_id: job.id,
            status: job.status,
            total: job.total,
        }
    }
}

/// 任务状态响应
#[derive(Debug, Serialize)]
pub struct ScrapeJobResponse {
    #[serde(flatten)]
    pub job: ScrapeJob,
    pub percent_complete: f64,
}

impl From<ScrapeJob> for ScrapeJobResponse {
    fn from(job: ScrapeJob) -> Self {
        let percent_complete = job.percent_complete();
        Self {
            job,
            percent_complete,
        }
    }
}

/// 带房源和 WhatsApp 链接的经纪人
#[derive(Debug, Serialize)]
pub struct AgentView {
    #[serde(flatten)]
    pub agent: Agent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whatsapp_link: Option<String>,
    pub listings: Vec<Listing>,
}
