// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::agent::AgentCandidate;
use url::Url;

/// 线索分类器
///
/// 有电话且没有独立对外网站（或网站就在来源站点域名下）的经纪人视为线索。
#[derive(Debug, Clone)]
pub struct LeadClassifier {
    source_host: Option<String>,
}

impl LeadClassifier {
    /// 以来源站点根地址创建分类器
    pub fn new(source_base_url: &str) -> Self {
        Self {
            source_host: host_of(source_base_url),
        }
    }

    pub fn is_lead(&self, candidate: &AgentCandidate) -> bool {
        let has_phone = candidate
            .phone
            .as_deref()
            .is_some_and(|phone| !phone.trim().is_empty());
        if !has_phone {
            return false;
        }

        match candidate.website.as_deref() {
            None => true,
            Some(website) => self.is_source_site(website),
        }
    }

    fn is_source_site(&self, website: &str) -> bool {
        let (Some(source), Some(host)) = (self.source_host.as_deref(), host_of(website)) else {
            return false;
        };
        host == source || host.ends_with(&format!(".{}", source))
    }
}

fn host_of(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
}
