// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 连接表示层与领域层：请求校验、任务启动和结果查询
pub mod dto;
pub mod use_cases;
