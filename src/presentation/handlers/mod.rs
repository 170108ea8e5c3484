// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// HTTP 处理器模块
pub mod agent_handler;
pub mod scrape_handler;
