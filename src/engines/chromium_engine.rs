// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::BrowserSettings;
use crate::engines::environment::check_browser_support;
use crate::engines::traits::{
    BrowserEngine, BrowserSession, EngineError, NavigationRequest, RenderedPage, WaitUntil,
};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{Headers, SetExtraHttpHeadersParams};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use serde_json::json;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Chromium 引擎
///
/// 基于 chromiumoxide 的无头浏览器实现。每次 `launch` 都会启动（或连接）
/// 一个独立的浏览器实例，由返回的会话独占并负责关闭。
pub struct ChromiumEngine {
    settings: BrowserSettings,
}

impl ChromiumEngine {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    async fn start_browser(&self) -> Result<(Browser, chromiumoxide::Handler, bool), EngineError> {
        if let Some(url) = &self.settings.remote_debugging_url {
            info!("Connecting to remote Chrome instance at: {}", url);
            let (browser, handler) = Browser::connect(url.as_str())
                .await
                .map_err(|e| EngineError::Launch(format!("failed to connect to remote Chrome: {}", e)))?;
            return Ok((browser, handler, false));
        }

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1920, 1080)
            .request_timeout(Duration::from_secs(60))
            .arg("--disable-setuid-sandbox")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage");

        if let Some(executable) = &self.settings.executable {
            builder = builder.chrome_executable(executable);
        }

        let config = builder.build().map_err(EngineError::Launch)?;
        let (browser, handler) = Browser::launch(config)
            .await
            .map_err(|e| EngineError::Launch(e.to_string()))?;
        Ok((browser, handler, true))
    }
}

#[async_trait]
impl BrowserEngine for ChromiumEngine {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, EngineError> {
        let (mut browser, mut handler, launched) = self.start_browser().await?;

        // The CDP handler must be polled for the browser connection to make progress
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match open_page(&browser).await {
            Ok(page) => page,
            Err(e) => {
                if launched {
                    if let Err(close_err) = browser.close().await {
                        warn!("Failed to close browser after page setup error: {}", close_err);
                    }
                }
                handler_task.abort();
                return Err(e);
            }
        };

        Ok(Box::new(ChromiumSession {
            browser,
            page,
            handler_task,
            launched,
            settle: Duration::from_millis(self.settings.network_idle_settle_ms),
        }))
    }

    fn check_environment(&self) -> Result<(), EngineError> {
        check_browser_support(&self.settings)
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}

async fn open_page(browser: &Browser) -> Result<Page, EngineError> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| EngineError::Launch(e.to_string()))?;

    let headers = Headers::new(json!({ "Accept-Language": "en-US,en;q=0.9" }));
    page.execute(SetExtraHttpHeadersParams::new(headers))
        .await
        .map_err(|e| EngineError::Launch(format!("failed to set request headers: {}", e)))?;

    Ok(page)
}

/// Chromium 浏览器会话
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    launched: bool,
    settle: Duration,
}

impl ChromiumSession {
    async fn load(&self, request: &NavigationRequest) -> Result<RenderedPage, EngineError> {
        let nav_err = |reason: String| EngineError::Navigation {
            url: request.url.clone(),
            reason,
        };

        self.page
            .set_user_agent(request.user_agent.as_str())
            .await
            .map_err(|e| nav_err(e.to_string()))?;

        self.page
            .goto(request.url.as_str())
            .await
            .map_err(|e| nav_err(e.to_string()))?;

        if request.wait_until == WaitUntil::NetworkIdle {
            self.page
                .wait_for_navigation()
                .await
                .map_err(|e| nav_err(e.to_string()))?;
            if !self.settle.is_zero() {
                tokio::time::sleep(self.settle).await;
            }
        }

        let content = self
            .page
            .content()
            .await
            .map_err(|e| nav_err(e.to_string()))?;
        let final_url = self
            .page
            .url()
            .await
            .map_err(|e| nav_err(e.to_string()))?
            .unwrap_or_else(|| request.url.clone());

        Ok(RenderedPage { final_url, content })
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, request: &NavigationRequest) -> Result<RenderedPage, EngineError> {
        debug!(url = %request.url, wait = ?request.wait_until, "Navigating");
        tokio::time::timeout(request.timeout, self.load(request))
            .await
            .map_err(|_| EngineError::Timeout {
                url: request.url.clone(),
                seconds: request.timeout.as_secs(),
            })?
    }

    async fn close(mut self: Box<Self>) -> Result<(), EngineError> {
        let result = if self.launched {
            let closed = self
                .browser
                .close()
                .await
                .map(|_| ())
                .map_err(|e| EngineError::Other(format!("failed to close browser: {}", e)));
            if let Err(e) = self.browser.wait().await {
                warn!("Failed waiting for browser process to exit: {}", e);
            }
            closed
        } else {
            // Remote browser is shared, only this session's tab is closed
            self.page
                .clone()
                .close()
                .await
                .map_err(|e| EngineError::Other(format!("failed to close page: {}", e)))
        };
        self.handler_task.abort();
        debug!("Browser session closed");
        result
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        // Reached without `close` only when the owning task is aborted or panics
        if !self.handler_task.is_finished() {
            self.handler_task.abort();
        }
    }
}
