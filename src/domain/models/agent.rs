// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 经纪人名称缺失时的占位值
pub const UNKNOWN_AGENT_NAME: &str = "Unknown Agent";

/// 经纪人实体
///
/// 表示一个去重后的真实发布者。线索标记在创建时计算，之后不再修改。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Agent {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    /// 房产类型标签集合，只增不减
    pub property_types: Vec<String>,
    pub profile_url: Option<String>,
    pub website: Option<String>,
    pub is_lead: bool,
    pub source: String,
    /// 首次发现时间
    pub created_at: DateTime<Utc>,
}

/// 从详情页提取出的经纪人候选数据
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentCandidate {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub profile_url: Option<String>,
    pub location: Option<String>,
    pub property_types: Vec<String>,
}

/// 创建经纪人所需的字段
#[derive(Debug, Clone, PartialEq)]
pub struct NewAgent {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    pub property_types: Vec<String>,
    pub profile_url: Option<String>,
    pub website: Option<String>,
    pub is_lead: bool,
    pub source: String,
}

impl NewAgent {
    pub fn from_candidate(candidate: &AgentCandidate, is_lead: bool, source: &str) -> Self {
        Self {
            name: candidate.name.clone(),
            phone: candidate.phone.clone(),
            email: candidate.email.clone(),
            location: candidate.location.clone(),
            property_types: candidate.property_types.clone(),
            profile_url: candidate.profile_url.clone(),
            website: candidate.website.clone(),
            is_lead,
            source: source.to_string(),
        }
    }
}

/// 经纪人查询过滤条件
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentFilter {
    /// 地区（不区分大小写的子串匹配）
    pub location: Option<String>,
    /// 房产类型标签
    pub property_type: Option<String>,
    /// 只返回线索
    #[serde(default)]
    pub leads_only: bool,
}

/// 按地区分组的经纪人数量
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocationCount {
    pub location: String,
    pub count: u64,
}

/// 经纪人统计
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentStats {
    pub total_agents: u64,
    pub total_leads: u64,
    pub agents_by_location: Vec<LocationCount>,
}
