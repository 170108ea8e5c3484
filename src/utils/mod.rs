// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工具模块
///
/// 文本清洗、电话号码格式化与遥测初始化
pub mod phone;
pub mod telemetry;
pub mod text;
