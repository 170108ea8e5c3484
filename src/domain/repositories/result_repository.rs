// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::job_repository::RepositoryError;
use crate::domain::models::agent::{Agent, AgentFilter, AgentStats, NewAgent};
use crate::domain::models::listing::{Listing, ListingCandidate};
use async_trait::async_trait;
use uuid::Uuid;

/// 经纪人身份查询键
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityKey<'a> {
    pub phone: Option<&'a str>,
    pub email: Option<&'a str>,
    /// `None` 表示不参与姓名匹配
    pub name: Option<&'a str>,
}

impl IdentityKey<'_> {
    /// 三个维度都为空时无法匹配任何记录
    pub fn is_empty(&self) -> bool {
        self.phone.is_none() && self.email.is_none() && self.name.is_none()
    }
}

/// 抓取结果仓库特质
///
/// 定义经纪人和房源的数据访问接口
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// 按身份键查找经纪人
    ///
    /// 电话、邮箱、姓名任一相等即匹配（单次析取查询），
    /// 多个匹配时返回最早创建的记录。
    async fn find_agent_by_identity(
        &self,
        key: IdentityKey<'_>,
    ) -> Result<Option<Agent>, RepositoryError>;

    /// 创建经纪人
    async fn create_agent(&self, agent: &NewAgent) -> Result<Agent, RepositoryError>;

    /// 向经纪人的房产类型集合追加标签（已存在则忽略）
    async fn add_property_type(
        &self,
        agent_id: Uuid,
        property_type: &str,
    ) -> Result<Agent, RepositoryError>;

    /// 创建房源
    ///
    /// 以 URL 为自然键：相同 URL 已存在时返回已有记录，不会重复创建。
    ///
    /// # 返回值
    ///
    /// * `Ok((Listing, true))` - 新建的房源
    /// * `Ok((Listing, false))` - 已存在的房源
    async fn create_listing(
        &self,
        listing: &ListingCandidate,
        agent_id: Uuid,
    ) -> Result<(Listing, bool), RepositoryError>;

    /// 按条件列出经纪人，最新发现的在前
    async fn list_agents(&self, filter: &AgentFilter) -> Result<Vec<Agent>, RepositoryError>;

    /// 列出经纪人名下的房源
    async fn listings_for_agent(&self, agent_id: Uuid) -> Result<Vec<Listing>, RepositoryError>;

    /// 经纪人统计
    async fn agent_stats(&self) -> Result<AgentStats, RepositoryError>;
}
