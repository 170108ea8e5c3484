// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 定义抓取任务、经纪人和房源等核心业务实体
pub mod agent;
pub mod listing;
pub mod scrape_job;
