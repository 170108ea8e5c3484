// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::CrawlerSettings;
use crate::domain::models::scrape_job::ITEMS_PER_PAGE;
use crate::engines::pacing::{random_user_agent, Pacer};
use crate::engines::traits::{
    BrowserEngine, BrowserSession, EngineError, NavigationRequest, RenderedPage, WaitUntil,
};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// 页面爬取器
///
/// 按页码遍历列表页并抓取详情页。导航前应用随机延迟和随机 User-Agent，
/// 同一会话内的所有导航严格串行。
pub struct PageCrawler {
    engine: Arc<dyn BrowserEngine>,
    settings: CrawlerSettings,
    pacer: Pacer,
}

impl PageCrawler {
    pub fn new(engine: Arc<dyn BrowserEngine>, settings: CrawlerSettings) -> Self {
        let pacer = Pacer::new(settings.index_delay_ms, settings.detail_delay_ms);
        Self {
            engine,
            settings,
            pacer,
        }
    }

    pub fn settings(&self) -> &CrawlerSettings {
        &self.settings
    }

    /// 检查运行环境是否支持浏览器
    pub fn check_environment(&self) -> Result<(), EngineError> {
        self.engine.check_environment()
    }

    /// 列表页地址：`{base}/for-sale/properties/{location}?page={n}`
    ///
    /// 地区中的 `/` 视为路径分隔符，`lagos/lekki` 对应两级路径。
    pub fn index_url(&self, location: &str, page: u32) -> Result<String, EngineError> {
        let mut url = Url::parse(&self.settings.base_url).map_err(|e| {
            EngineError::Other(format!("invalid base URL {}: {}", self.settings.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                EngineError::Other(format!(
                    "base URL {} cannot carry a path",
                    self.settings.base_url
                ))
            })?
            .pop_if_empty()
            .extend(["for-sale", "properties"])
            .extend(location.trim().split('/').filter(|s| !s.is_empty()));
        url.query_pairs_mut().append_pair("page", &page.to_string());
        Ok(url.to_string())
    }

    /// 启动浏览器会话
    ///
    /// 返回的会话必须通过 `CrawlSession::close` 关闭。
    pub async fn open_session(&self) -> Result<CrawlSession<'_>, EngineError> {
        info!("Launching {} browser session", self.engine.name());
        let session = self.engine.launch().await?;
        Ok(CrawlSession {
            crawler: self,
            session,
        })
    }
}

/// 一次抓取任务独占的浏览器会话
pub struct CrawlSession<'a> {
    crawler: &'a PageCrawler,
    session: Box<dyn BrowserSession>,
}

impl CrawlSession<'_> {
    /// 抓取列表页并返回去重后的详情页链接，最多 `ITEMS_PER_PAGE` 个
    pub async fn fetch_index(&mut self, location: &str, page: u32) -> Result<Vec<String>, EngineError> {
        let settings = &self.crawler.settings;
        let url = self.crawler.index_url(location, page)?;
        self.crawler.pacer.before_index().await;

        let rendered = self
            .navigate(url.clone(), WaitUntil::NetworkIdle, settings.index_timeout())
            .await?;
        let page_url = Url::parse(&rendered.final_url)
            .or_else(|_| Url::parse(&url))
            .map_err(|e| EngineError::Other(format!("invalid index URL {}: {}", url, e)))?;

        let links = discover_listing_links(
            &rendered.content,
            &page_url,
            &settings.listing_marker,
            ITEMS_PER_PAGE as usize,
        );
        debug!("Found {} listing links on {}", links.len(), url);
        Ok(links)
    }

    /// 抓取详情页，只等待初始内容就绪
    pub async fn fetch_detail(&mut self, url: &str) -> Result<RenderedPage, EngineError> {
        let timeout = self.crawler.settings.detail_timeout();
        self.crawler.pacer.before_detail().await;
        self.navigate(url.to_string(), WaitUntil::DomContentLoaded, timeout)
            .await
    }

    async fn navigate(
        &mut self,
        url: String,
        wait_until: WaitUntil,
        timeout: Duration,
    ) -> Result<RenderedPage, EngineError> {
        let request = NavigationRequest {
            url,
            wait_until,
            timeout,
            user_agent: random_user_agent().to_string(),
        };
        self.session.navigate(&request).await
    }

    /// 关闭会话并释放浏览器资源
    pub async fn close(self) -> Result<(), EngineError> {
        self.session.close().await
    }
}

/// 从列表页中提取详情页链接
///
/// 只保留路径包含 `marker` 的链接；相对地址按页面地址解析并去掉片段；
/// 列表页自身（分页链接）被排除；保持文档顺序去重，最多 `cap` 个。
pub fn discover_listing_links(html: &str, page_url: &Url, marker: &str, cap: usize) -> Vec<String> {
    let Ok(anchors) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let document = Html::parse_document(html);

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for anchor in document.select(&anchors) {
        if links.len() >= cap {
            break;
        }
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(mut resolved) = page_url.join(href.trim()) else {
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") || !resolved.path().contains(marker) {
            continue;
        }
        if resolved.path() == page_url.path() {
            continue;
        }
        resolved.set_fragment(None);
        let link = resolved.to_string();
        if seen.insert(link.clone()) {
            links.push(link);
        }
    }
    links
}
