// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::BrowserSettings;
use crate::engines::traits::EngineError;
use std::path::Path;

/// 已知无法运行无头 Chromium 的托管平台及其标识环境变量
const SERVERLESS_MARKERS: [(&str, &str); 3] = [
    ("VERCEL", "Vercel"),
    ("AWS_LAMBDA_FUNCTION_NAME", "AWS Lambda"),
    ("NETLIFY", "Netlify"),
];

/// 检查当前进程环境能否执行无头浏览器
///
/// 在任何导航之前调用，避免在注定失败的环境里浪费时间。
/// 配置了远程调试地址时，浏览器运行在别处，跳过平台检查。
pub fn check_browser_support(settings: &BrowserSettings) -> Result<(), EngineError> {
    check_with(settings, |key| std::env::var(key).ok())
}

/// 可注入环境变量读取的检查实现
pub fn check_with<F>(settings: &BrowserSettings, env: F) -> Result<(), EngineError>
where
    F: Fn(&str) -> Option<String>,
{
    if settings.remote_debugging_url.is_some() {
        return Ok(());
    }

    for (key, platform) in SERVERLESS_MARKERS {
        if env(key).is_some_and(|value| !value.is_empty()) {
            return Err(EngineError::UnsupportedEnvironment(format!(
                "{} does not support launching a headless browser; configure browser.remote_debugging_url instead",
                platform
            )));
        }
    }

    if let Some(executable) = &settings.executable {
        if !Path::new(executable).exists() {
            return Err(EngineError::UnsupportedEnvironment(format!(
                "browser executable not found at {}",
                executable
            )));
        }
    }

    Ok(())
}
