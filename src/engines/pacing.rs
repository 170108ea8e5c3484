// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::DelayRange;
use rand::Rng;
use std::time::Duration;
use tracing::debug;

/// 浏览器指纹使用的 User-Agent 池
pub const USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// 随机选择一个 User-Agent
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::rng();
    USER_AGENTS[rng.random_range(0..USER_AGENTS.len())]
}

/// 在区间内随机选择一个延迟，`max < min` 时按 `min` 处理
pub fn random_delay(range: DelayRange) -> Duration {
    if range.max <= range.min {
        return Duration::from_millis(range.min);
    }
    let mut rng = rand::rng();
    Duration::from_millis(rng.random_range(range.min..=range.max))
}

/// 导航前的节奏控制
///
/// 这是对目标站点的限速，不是正确性机制。
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    index: DelayRange,
    detail: DelayRange,
}

impl Pacer {
    pub fn new(index: DelayRange, detail: DelayRange) -> Self {
        Self { index, detail }
    }

    /// 列表页导航前等待
    pub async fn before_index(&self) {
        Self::pause(self.index, "index").await;
    }

    /// 详情页导航前等待
    pub async fn before_detail(&self) {
        Self::pause(self.detail, "detail").await;
    }

    async fn pause(range: DelayRange, kind: &str) {
        let delay = random_delay(range);
        if delay.is_zero() {
            return;
        }
        debug!("Waiting {}ms before {} navigation", delay.as_millis(), kind);
        tokio::time::sleep(delay).await;
    }
}
