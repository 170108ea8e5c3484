// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// 启动抓取任务的请求
///
/// 两个字段都可省略，省略时使用配置中的默认值
#[derive(Debug, Default, Deserialize, Serialize, Validate)]
pub struct StartScrapeDto {
    /// 地区（自由文本）
    #[validate(length(min = 1, max = 100, message = "location must be 1-100 characters"))]
    pub location: Option<String>,
    /// 最大列表页数
    #[validate(range(min = 1, message = "max_pages must be at least 1"))]
    pub max_pages: Option<u32>,
}
