// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::IdentitySettings;
use crate::domain::models::agent::{Agent, AgentCandidate, NewAgent};
use crate::domain::models::listing::ListingCandidate;
use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::repositories::result_repository::{IdentityKey, ResultRepository};
use crate::domain::services::lead_classifier::LeadClassifier;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// 身份解析结果
#[derive(Debug, Clone)]
pub struct Resolution {
    pub agent: Agent,
    /// 本次解析是否新建了经纪人
    pub created: bool,
    /// 本页提取出的经纪人片段是否构成线索
    ///
    /// 按片段判定，与已有经纪人创建时记录的 `is_lead` 无关。
    pub lead: bool,
}

/// 经纪人身份解析器
///
/// 查找与候选经纪人匹配的已有记录，找不到时创建新记录。
/// 查找和创建在同一个临界区内完成，多个任务共享同一实例时不会重复创建。
///
/// 默认匹配规则是电话、邮箱、姓名的析取；仅有占位姓名的候选可能误合并到
/// 无关经纪人，可通过 `require_contact_match` 关闭姓名匹配。
pub struct IdentityResolver {
    repo: Arc<dyn ResultRepository>,
    classifier: LeadClassifier,
    settings: IdentitySettings,
    source: String,
    guard: Mutex<()>,
}

impl IdentityResolver {
    pub fn new(
        repo: Arc<dyn ResultRepository>,
        classifier: LeadClassifier,
        settings: IdentitySettings,
        source: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            classifier,
            settings,
            source: source.into(),
            guard: Mutex::new(()),
        }
    }

    /// 候选经纪人的身份查询键
    pub fn identity_key<'a>(&self, candidate: &'a AgentCandidate) -> IdentityKey<'a> {
        IdentityKey {
            phone: present(candidate.phone.as_deref()),
            email: present(candidate.email.as_deref()),
            name: if self.settings.require_contact_match {
                None
            } else {
                present(Some(candidate.name.as_str()))
            },
        }
    }

    /// 查找或创建经纪人
    ///
    /// # 参数
    ///
    /// * `candidate` - 详情页提取出的经纪人
    /// * `listing` - 同一页面的房源，用于补充地区和房产类型
    pub async fn resolve(
        &self,
        candidate: &AgentCandidate,
        listing: &ListingCandidate,
    ) -> Result<Resolution, RepositoryError> {
        let key = self.identity_key(candidate);
        let lead = self.classifier.is_lead(candidate);
        let _held = self.guard.lock().await;

        if !key.is_empty() {
            if let Some(existing) = self.repo.find_agent_by_identity(key).await? {
                debug!("Matched existing agent {} for {}", existing.id, candidate.name);
                let agent = self.merge_property_type(existing, listing).await?;
                return Ok(Resolution {
                    agent,
                    created: false,
                    lead,
                });
            }
        }

        let mut new_agent =
            NewAgent::from_candidate(candidate, lead, &self.source);
        if new_agent.location.is_none() {
            new_agent.location = listing.known_location().map(str::to_string);
        }
        if let Some(property_type) = listing.known_property_type() {
            if !new_agent.property_types.iter().any(|t| t == property_type) {
                new_agent.property_types.push(property_type.to_string());
            }
        }

        let agent = self.repo.create_agent(&new_agent).await?;
        debug!("Created agent {} (lead: {})", agent.id, agent.is_lead);
        Ok(Resolution {
            agent,
            created: true,
            lead,
        })
    }

    async fn merge_property_type(
        &self,
        existing: Agent,
        listing: &ListingCandidate,
    ) -> Result<Agent, RepositoryError> {
        if !self.settings.accumulate_property_types {
            return Ok(existing);
        }
        match listing.known_property_type() {
            Some(tag) if !existing.property_types.iter().any(|t| t == tag) => {
                self.repo.add_property_type(existing.id, tag).await
            }
            _ => Ok(existing),
        }
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
