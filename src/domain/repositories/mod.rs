// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 定义抓取任务存储和抓取结果存储的访问接口，
/// 领域层只依赖这些特质而不依赖具体的数据存储实现
pub mod job_repository;
pub mod result_repository;
