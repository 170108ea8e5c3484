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

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 浏览器启动或连接失败
    #[error("Failed to start browser session: {0}")]
    Launch(String),
    /// 导航失败
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    /// 超时
    #[error("Navigation to {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },
    /// 当前运行环境不支持无头浏览器
    #[error("Headless browser not supported in this environment: {0}")]
    UnsupportedEnvironment(String),
    /// 其他错误
    #[error("Browser error: {0}")]
    Other(String),
}

/// 页面就绪等待策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    /// 等待网络空闲，列表页使用
    NetworkIdle,
    /// 等待初始 DOM 就绪，详情页使用
    DomContentLoaded,
}

/// 导航请求
#[derive(Debug, Clone)]
pub struct NavigationRequest {
    /// 目标URL
    pub url: String,
    /// 就绪等待策略
    pub wait_until: WaitUntil,
    /// 单次导航超时
    pub timeout: Duration,
    /// 本次导航使用的 User-Agent
    pub user_agent: String,
}

/// 导航后的渲染结果
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// 重定向之后的最终地址
    pub final_url: String,
    /// 渲染后的 HTML
    pub content: String,
}

/// 浏览器引擎特质
///
/// 负责建立浏览器会话；每个抓取任务独占一个会话。
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    /// 启动（或连接）浏览器并打开一个会话
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, EngineError>;

    /// 启动前检查运行环境，默认不做限制
    fn check_environment(&self) -> Result<(), EngineError> {
        Ok(())
    }

    /// 引擎名称
    fn name(&self) -> &'static str;
}

/// 浏览器会话特质
///
/// 会话内的导航严格串行。调用方必须在所有退出路径上调用一次 `close`。
#[async_trait]
pub trait BrowserSession: Send {
    /// 导航到指定页面并返回渲染后的内容
    async fn navigate(&mut self, request: &NavigationRequest) -> Result<RenderedPage, EngineError>;

    /// 释放会话占用的所有浏览器资源
    async fn close(self: Box<Self>) -> Result<(), EngineError>;
}
