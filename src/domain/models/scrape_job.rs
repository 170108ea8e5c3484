// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 每个列表页最多处理的详情页数量
///
/// 同时用于计算任务的预期总数（`max_pages × ITEMS_PER_PAGE`）
pub const ITEMS_PER_PAGE: u32 = 20;

/// 抓取任务实体
///
/// 表示一次完整的列表站点抓取运行，包含状态、进度计数、
/// 取消标记和生命周期时间戳。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScrapeJob {
    /// 任务唯一标识符
    pub id: Uuid,
    /// 任务状态
    pub status: JobStatus,
    /// 来源站点标签
    pub source: String,
    /// 抓取的地区
    pub location: String,
    /// 最大列表页数
    pub max_pages: u32,
    /// 已处理的详情页数量
    pub progress: u32,
    /// 预期处理总数
    pub total: u32,
    /// 本次运行发现的线索数量
    pub leads_found: u32,
    /// 取消标记，一旦设置永不清除
    pub cancelled: bool,
    /// 失败原因，仅在 `failed` 状态下存在
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
    /// 完成时间，仅在终止状态下存在
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ScrapeJob {
    /// 创建处于 `pending` 状态的新任务
    pub fn new(source: impl Into<String>, location: impl Into<String>, max_pages: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            status: JobStatus::Pending,
            source: source.into(),
            location: location.into(),
            max_pages,
            progress: 0,
            total: expected_total(max_pages),
            leads_found: 0,
            cancelled: false,
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// 进度百分比，总数未知时为 0
    pub fn percent_complete(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.progress.min(self.total) as f64 / self.total as f64) * 100.0
    }
}

/// 按页数计算预期处理总数
pub fn expected_total(max_pages: u32) -> u32 {
    max_pages.saturating_mul(ITEMS_PER_PAGE)
}

/// 任务状态枚举
///
/// 状态转换遵循以下流程：
/// Pending → Running → Completed/Failed/Cancelled
///
/// Pending 也可以直接进入任一终止状态（例如启动前被取消或浏览器启动失败）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// 已创建，等待执行
    #[default]
    Pending,
    /// 执行中
    Running,
    /// 已完成
    Completed,
    /// 已失败
    Failed,
    /// 已取消
    Cancelled,
}

impl JobStatus {
    /// 是否为终止状态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// 可以转换到当前状态的前驱状态
    pub fn predecessors(&self) -> &'static [JobStatus] {
        match self {
            JobStatus::Pending => &[],
            JobStatus::Running => &[JobStatus::Pending],
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled => {
                &[JobStatus::Pending, JobStatus::Running]
            }
        }
    }

    /// 判断从 `self` 到 `next` 的转换是否合法
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        next.predecessors().contains(self)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            "cancelled" => Ok(JobStatus::Cancelled),
            _ => Err(()),
        }
    }
}

/// 任务部分更新
///
/// 计数字段直接写入；`status` 仅在当前状态是合法前驱时生效，
/// `error` 与 `completed_at` 随状态转换一同写入。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub progress: Option<u32>,
    pub total: Option<u32>,
    pub leads_found: Option<u32>,
    pub error: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobUpdate {
    /// 进度写入：计数一次性更新，并把 `pending` 推进到 `running`
    pub fn progress(progress: u32, total: u32, leads_found: u32) -> Self {
        Self {
            status: Some(JobStatus::Running),
            progress: Some(progress),
            total: Some(total),
            leads_found: Some(leads_found),
            ..Default::default()
        }
    }

    /// 正常结束
    pub fn completed() -> Self {
        Self {
            status: Some(JobStatus::Completed),
            completed_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// 运行失败
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            error: Some(message.into()),
            completed_at: Some(Utc::now()),
            ..Default::default()
        }
    }
}
