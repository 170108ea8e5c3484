// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const UNTITLED_LISTING: &str = "Untitled Property";
pub const UNKNOWN_FIELD: &str = "Unknown";

/// 房源实体
///
/// `url` 是自然键；`agent_id` 在创建时确定，之后不可修改。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub title: String,
    /// 原始价格文本，不做货币解析
    pub price: Option<String>,
    pub location: String,
    pub property_type: String,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub url: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 从详情页提取出的房源候选数据
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingCandidate {
    pub title: String,
    pub price: Option<String>,
    pub location: String,
    pub property_type: String,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub url: String,
    pub image_url: Option<String>,
}

impl ListingCandidate {
    /// 地区是否为真实值（非占位符）
    pub fn known_location(&self) -> Option<&str> {
        known(&self.location)
    }

    /// 房产类型是否为真实值（非占位符）
    pub fn known_property_type(&self) -> Option<&str> {
        known(&self.property_type)
    }
}

fn known(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == UNKNOWN_FIELD {
        None
    } else {
        Some(trimmed)
    }
}
