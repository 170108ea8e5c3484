// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scrape_job::{JobUpdate, ScrapeJob};
use async_trait::async_trait;
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
    /// 存储的数据无法解析
    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

/// 抓取任务仓库特质
///
/// 定义抓取任务的数据访问接口。任务记录只由执行中的工作器修改，
/// 取消请求方只会设置取消标记。
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// 创建任务
    ///
    /// # 参数
    ///
    /// * `job` - 要创建的任务实体
    ///
    /// # 返回值
    ///
    /// * `Ok(ScrapeJob)` - 创建后的任务
    /// * `Err(RepositoryError)` - 创建失败时返回错误
    async fn create(&self, job: &ScrapeJob) -> Result<ScrapeJob, RepositoryError>;

    /// 根据ID查找任务
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(ScrapeJob))` - 找到任务
    /// * `Ok(None)` - 任务不存在
    /// * `Err(RepositoryError)` - 查询失败
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScrapeJob>, RepositoryError>;

    /// 部分更新任务
    ///
    /// 计数字段作为一次写入生效，但只写入尚未终止且未被取消的任务。
    /// 状态字段只有在当前状态是合法前驱、且任务未被取消时才生效，
    /// 因此已终止的任务（包括已取消的）不会再被改写。
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 写入完成（状态可能因守卫条件未改变）
    /// * `Err(RepositoryError::NotFound)` - 任务不存在
    async fn update(&self, id: Uuid, update: &JobUpdate) -> Result<(), RepositoryError>;

    /// 读取持久化的取消标记
    async fn is_cancelled(&self, id: Uuid) -> Result<bool, RepositoryError>;

    /// 请求取消任务
    ///
    /// 任务尚未终止时设置取消标记、把状态置为 `cancelled` 并记录完成时间；
    /// 已终止的任务保持不变。
    ///
    /// # 返回值
    ///
    /// * `Ok(ScrapeJob)` - 取消请求后的任务状态
    /// * `Err(RepositoryError::NotFound)` - 任务不存在
    async fn request_cancel(&self, id: Uuid) -> Result<ScrapeJob, RepositoryError>;
}
