// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use regex::Regex;
use std::sync::LazyLock;

static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// 折叠连续空白并去掉首尾空白
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 文本中第一个整数子串
pub fn first_integer(text: &str) -> Option<u32> {
    INTEGER
        .find(text)
        .and_then(|m| m.as_str().parse::<u32>().ok())
}
