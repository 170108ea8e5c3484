// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 把本地电话号码转换为带国家区号的纯数字形式
///
/// 以 `0` 开头的本地号码替换为区号；已带区号的号码保持不变；
/// 其他号码直接加上区号。
pub fn to_international(phone: &str, dial_code: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if let Some(rest) = digits.strip_prefix('0') {
        return format!("{}{}", dial_code, rest);
    }
    if digits.starts_with(dial_code) {
        return digits;
    }
    format!("{}{}", dial_code, digits)
}

/// 经纪人电话的 WhatsApp 链接
pub fn whatsapp_link(phone: &str, dial_code: &str) -> String {
    format!("https://wa.me/{}", to_international(phone, dial_code))
}
