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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// 应用程序配置设置
///
/// 包含数据库、服务器、爬虫、浏览器、身份匹配、并发控制和指标等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// 服务器配置
    pub server: ServerSettings,
    /// 爬虫配置
    pub crawler: CrawlerSettings,
    /// 浏览器配置
    pub browser: BrowserSettings,
    /// 经纪人身份匹配配置
    pub identity: IdentitySettings,
    /// 并发控制配置
    pub concurrency: ConcurrencySettings,
    /// 指标配置
    pub metrics: MetricsSettings,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 随机延迟区间（毫秒）
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct DelayRange {
    pub min: u64,
    pub max: u64,
}

impl DelayRange {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// 不等待的区间，测试中使用
    pub const fn zero() -> Self {
        Self { min: 0, max: 0 }
    }
}

/// 爬虫配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerSettings {
    /// 目标站点根地址
    pub base_url: String,
    /// 写入任务和经纪人记录的来源标签
    pub source_label: String,
    /// 详情页链接必须包含的路径片段
    pub listing_marker: String,
    /// 默认地区
    pub default_location: String,
    /// 默认最大页数
    pub default_max_pages: u32,
    /// 单个任务允许的最大页数
    pub max_pages_limit: u32,
    /// 列表页导航前的随机延迟
    pub index_delay_ms: DelayRange,
    /// 详情页导航前的随机延迟
    pub detail_delay_ms: DelayRange,
    /// 列表页导航超时（秒）
    pub index_timeout_secs: u64,
    /// 详情页导航超时（秒）
    pub detail_timeout_secs: u64,
    /// 生成 WhatsApp 链接时使用的国家区号
    pub dial_code: String,
}

impl CrawlerSettings {
    pub fn index_timeout(&self) -> Duration {
        Duration::from_secs(self.index_timeout_secs)
    }

    pub fn detail_timeout(&self) -> Duration {
        Duration::from_secs(self.detail_timeout_secs)
    }
}

impl Default for CrawlerSettings {
    fn default() -> Self {
        Self {
            base_url: "https://nigeriapropertycentre.com".to_string(),
            source_label: "Nigeria Property Centre".to_string(),
            listing_marker: "/for-sale/".to_string(),
            default_location: "lagos".to_string(),
            default_max_pages: 5,
            max_pages_limit: 50,
            index_delay_ms: DelayRange::new(3000, 6000),
            detail_delay_ms: DelayRange::new(2000, 4000),
            index_timeout_secs: 60,
            detail_timeout_secs: 30,
            dial_code: "234".to_string(),
        }
    }
}

/// 浏览器配置设置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrowserSettings {
    /// 远程 Chrome 调试地址，设置后不再本地启动浏览器
    pub remote_debugging_url: Option<String>,
    /// 本地 Chrome 可执行文件路径
    pub executable: Option<String>,
    /// 等待网络空闲时的额外稳定时间（毫秒）
    #[serde(default)]
    pub network_idle_settle_ms: u64,
}

/// 经纪人身份匹配配置
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct IdentitySettings {
    /// 仅通过电话或邮箱匹配，不再使用姓名
    pub require_contact_match: bool,
    /// 匹配到已有经纪人时合并新的房产类型标签
    pub accumulate_property_types: bool,
}

/// 并发控制配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ConcurrencySettings {
    /// 同时运行的抓取任务上限
    pub max_concurrent_jobs: usize,
    /// 关闭时等待运行中任务到达检查点的秒数，超时后强制中止
    pub shutdown_grace_secs: u64,
}

impl ConcurrencySettings {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启动 Prometheus 导出器
    pub enabled: bool,
    /// 导出器监听地址
    pub listen_addr: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从配置文件和环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let crawler = CrawlerSettings::default();
        let builder = Config::builder()
            // Start with default settings
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            // Default DB settings
            .set_default("database.url", "sqlite://leadscout.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            // Default crawler settings
            .set_default("crawler.base_url", crawler.base_url)?
            .set_default("crawler.source_label", crawler.source_label)?
            .set_default("crawler.listing_marker", crawler.listing_marker)?
            .set_default("crawler.default_location", crawler.default_location)?
            .set_default("crawler.default_max_pages", crawler.default_max_pages as i64)?
            .set_default("crawler.max_pages_limit", crawler.max_pages_limit as i64)?
            .set_default("crawler.index_delay_ms.min", crawler.index_delay_ms.min as i64)?
            .set_default("crawler.index_delay_ms.max", crawler.index_delay_ms.max as i64)?
            .set_default("crawler.detail_delay_ms.min", crawler.detail_delay_ms.min as i64)?
            .set_default("crawler.detail_delay_ms.max", crawler.detail_delay_ms.max as i64)?
            .set_default("crawler.index_timeout_secs", crawler.index_timeout_secs as i64)?
            .set_default("crawler.detail_timeout_secs", crawler.detail_timeout_secs as i64)?
            .set_default("crawler.dial_code", crawler.dial_code)?
            // Default browser settings
            .set_default("browser.network_idle_settle_ms", 500)?
            // Default identity settings
            .set_default("identity.require_contact_match", false)?
            .set_default("identity.accumulate_property_types", false)?
            // Default concurrency settings
            .set_default("concurrency.max_concurrent_jobs", 2)?
            .set_default("concurrency.shutdown_grace_secs", 10)?
            // Default metrics settings
            .set_default("metrics.enabled", false)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("LEADSCOUT").separator("__"));

        builder.build()?.try_deserialize()
    }
}
