// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：抓取任务、经纪人和房源
/// - 仓库接口（repositories）：任务存储和结果存储的抽象接口
/// - 服务（services）：提取、去重、分类和页面遍历
///
/// 领域层不依赖任何具体的存储或浏览器实现。
pub mod models;
pub mod repositories;
pub mod services;
