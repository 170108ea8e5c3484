// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 抓取流水线中与存储无关的业务逻辑：
/// - 字段提取（field_extractor）：把详情页转换为经纪人和房源候选
/// - 身份解析（identity_resolver）：查找或创建去重后的经纪人
/// - 线索分类（lead_classifier）：判断经纪人是否为销售线索
/// - 页面爬取（page_crawler）：带节奏控制的列表页和详情页遍历
pub mod field_extractor;
pub mod identity_resolver;
pub mod lead_classifier;
pub mod page_crawler;
