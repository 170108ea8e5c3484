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

use crate::domain::models::scrape_job::{JobStatus, JobUpdate, ScrapeJob};
use crate::domain::repositories::job_repository::{JobRepository, RepositoryError};
use crate::infrastructure::database::entities::scrape_job as job_entity;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::{Expr, SimpleExpr},
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 抓取任务仓库实现
///
/// 基于SeaORM实现的任务数据访问层。状态写入在 SQL 中以
/// `CASE WHEN` 守卫，非法转换保持原状态不变。
#[derive(Clone)]
pub struct JobRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl JobRepositoryImpl {
    /// 创建新的任务仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn to_db(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn from_db(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

impl TryFrom<job_entity::Model> for ScrapeJob {
    type Error = RepositoryError;

    fn try_from(model: job_entity::Model) -> Result<Self, Self::Error> {
        let status = model.status.parse::<JobStatus>().map_err(|_| {
            RepositoryError::InvalidData(format!("unknown job status '{}'", model.status))
        })?;

        Ok(Self {
            id: model.id,
            status,
            source: model.source,
            location: model.location,
            max_pages: from_db(model.max_pages),
            progress: from_db(model.progress),
            total: from_db(model.total),
            leads_found: from_db(model.leads_found),
            cancelled: model.cancelled,
            error: model.error,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
            completed_at: model.completed_at.map(|t| t.with_timezone(&Utc)),
        })
    }
}

impl From<&ScrapeJob> for job_entity::ActiveModel {
    fn from(job: &ScrapeJob) -> Self {
        Self {
            id: Set(job.id),
            status: Set(job.status.to_string()),
            source: Set(job.source.clone()),
            location: Set(job.location.clone()),
            max_pages: Set(to_db(job.max_pages)),
            progress: Set(to_db(job.progress)),
            total: Set(to_db(job.total)),
            leads_found: Set(to_db(job.leads_found)),
            cancelled: Set(job.cancelled),
            error: Set(job.error.clone()),
            created_at: Set(job.created_at.into()),
            updated_at: Set(job.updated_at.into()),
            completed_at: Set(job.completed_at.map(Into::into)),
        }
    }
}

/// 状态转换守卫：当前状态是合法前驱，且（非取消转换时）未被取消
fn transition_guard(next: JobStatus) -> SimpleExpr {
    let predecessors: Vec<String> = next.predecessors().iter().map(|s| s.to_string()).collect();
    let legal = job_entity::Column::Status.is_in(predecessors);
    if next == JobStatus::Cancelled {
        legal
    } else {
        legal.and(job_entity::Column::Cancelled.eq(false))
    }
}

/// 任务仍可写：处于 `pending`/`running` 且未被取消
///
/// 终止状态的任务不再接受任何字段写入。
fn open_guard() -> SimpleExpr {
    job_entity::Column::Status
        .is_in([JobStatus::Pending.to_string(), JobStatus::Running.to_string()])
        .and(job_entity::Column::Cancelled.eq(false))
}

/// `CASE WHEN guard THEN value ELSE column END`
fn guarded(guard: &SimpleExpr, value: SimpleExpr, column: job_entity::Column) -> SimpleExpr {
    Expr::case(guard.clone(), value)
        .finally(Expr::col(column))
        .into()
}

#[async_trait]
impl JobRepository for JobRepositoryImpl {
    async fn create(&self, job: &ScrapeJob) -> Result<ScrapeJob, RepositoryError> {
        let model: job_entity::ActiveModel = job.into();
        let inserted = model.insert(self.db.as_ref()).await?;
        inserted.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScrapeJob>, RepositoryError> {
        job_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(ScrapeJob::try_from)
            .transpose()
    }

    async fn update(&self, id: Uuid, update: &JobUpdate) -> Result<(), RepositoryError> {
        let now: DateTime<FixedOffset> = Utc::now().into();
        let open = open_guard();
        // All CASE arms read the pre-update row, so they agree on every guard
        let mut query = job_entity::Entity::update_many()
            .col_expr(
                job_entity::Column::UpdatedAt,
                guarded(&open, Expr::value(now), job_entity::Column::UpdatedAt),
            )
            .filter(job_entity::Column::Id.eq(id));

        if let Some(progress) = update.progress {
            query = query.col_expr(
                job_entity::Column::Progress,
                guarded(&open, Expr::value(to_db(progress)), job_entity::Column::Progress),
            );
        }
        if let Some(total) = update.total {
            query = query.col_expr(
                job_entity::Column::Total,
                guarded(&open, Expr::value(to_db(total)), job_entity::Column::Total),
            );
        }
        if let Some(leads_found) = update.leads_found {
            query = query.col_expr(
                job_entity::Column::LeadsFound,
                guarded(
                    &open,
                    Expr::value(to_db(leads_found)),
                    job_entity::Column::LeadsFound,
                ),
            );
        }

        if let Some(status) = update.status {
            let guard = transition_guard(status);
            if let Some(error) = &update.error {
                query = query.col_expr(
                    job_entity::Column::Error,
                    guarded(&guard, Expr::value(Some(error.clone())), job_entity::Column::Error),
                );
            }
            if let Some(completed_at) = update.completed_at {
                let completed_at: DateTime<FixedOffset> = completed_at.into();
                query = query.col_expr(
                    job_entity::Column::CompletedAt,
                    guarded(
                        &guard,
                        Expr::value(Some(completed_at)),
                        job_entity::Column::CompletedAt,
                    ),
                );
            }
            query = query.col_expr(
                job_entity::Column::Status,
                guarded(&guard, Expr::value(status.to_string()), job_entity::Column::Status),
            );
        }

        let result = query.exec(self.db.as_ref()).await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn is_cancelled(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let cancelled: Option<bool> = job_entity::Entity::find_by_id(id)
            .select_only()
            .column(job_entity::Column::Cancelled)
            .into_tuple()
            .one(self.db.as_ref())
            .await?;
        cancelled.ok_or(RepositoryError::NotFound)
    }

    async fn request_cancel(&self, id: Uuid) -> Result<ScrapeJob, RepositoryError> {
        let now: DateTime<FixedOffset> = Utc::now().into();
        let guard = transition_guard(JobStatus::Cancelled);

        let result = job_entity::Entity::update_many()
            .col_expr(
                job_entity::Column::Cancelled,
                guarded(&guard, Expr::value(true), job_entity::Column::Cancelled),
            )
            .col_expr(
                job_entity::Column::CompletedAt,
                guarded(&guard, Expr::value(Some(now)), job_entity::Column::CompletedAt),
            )
            .col_expr(
                job_entity::Column::Status,
                guarded(
                    &guard,
                    Expr::value(JobStatus::Cancelled.to_string()),
                    job_entity::Column::Status,
                ),
            )
            .col_expr(
                job_entity::Column::UpdatedAt,
                guarded(&guard, Expr::value(now), job_entity::Column::UpdatedAt),
            )
            .filter(job_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.find_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }
}
