// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::agent::{AgentCandidate, UNKNOWN_AGENT_NAME};
use crate::domain::models::listing::{ListingCandidate, UNKNOWN_FIELD, UNTITLED_LISTING};
use crate::utils::text::{collapse_whitespace, first_integer};
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

/// 字段提取错误
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// 选择器无法解析
    #[error("Invalid selector for {field}: {selector}")]
    InvalidSelector { field: &'static str, selector: String },
    /// 页面地址无法解析
    #[error("Invalid page URL {0}")]
    InvalidPageUrl(String),
    /// 页面没有可读取的内容
    #[error("Page at {0} has no readable content")]
    EmptyDocument(String),
}

/// 详情页字段选择器
///
/// 每个字段取文档顺序中第一个匹配的元素
#[derive(Debug, Clone)]
pub struct ExtractorSelectors {
    pub agent_name: String,
    pub agent_phone: String,
    pub agent_email: String,
    pub agent_website: String,
    pub title: String,
    pub price: String,
    pub location: String,
    pub property_type: String,
    pub bedrooms: String,
    pub bathrooms: String,
    pub image: String,
}

impl Default for ExtractorSelectors {
    fn default() -> Self {
        Self {
            agent_name: r#".agent-name, .contact-name, [class*="agent"] h3, [class*="agent"] h4"#
                .to_string(),
            agent_phone: r#".agent-phone, .contact-phone, a[href^="tel:"]"#.to_string(),
            agent_email: r#".agent-email, a[href^="mailto:"]"#.to_string(),
            agent_website: r#".agent-website, a[href*="http"]"#.to_string(),
            title: r#"h1, .property-title, [class*="title"]"#.to_string(),
            price: r#".price, [class*="price"]"#.to_string(),
            location: r#".location, [class*="location"]"#.to_string(),
            property_type: r#".property-type, [class*="type"]"#.to_string(),
            bedrooms: r#"[class*="bedroom"]"#.to_string(),
            bathrooms: r#"[class*="bathroom"]"#.to_string(),
            image: r#"img[src*="property"], .property-image img"#.to_string(),
        }
    }
}

/// 一个详情页的提取结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    pub agent: AgentCandidate,
    pub listing: ListingCandidate,
}

struct CompiledSelectors {
    agent_name: Selector,
    agent_phone: Selector,
    agent_email: Selector,
    agent_website: Selector,
    title: Selector,
    price: Selector,
    location: Selector,
    property_type: Selector,
    bedrooms: Selector,
    bathrooms: Selector,
    image: Selector,
    body: Selector,
}

fn compile(field: &'static str, selector: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(selector).map_err(|_| ExtractionError::InvalidSelector {
        field,
        selector: selector.to_string(),
    })
}

/// 字段提取器
///
/// 把渲染后的详情页转换为经纪人候选和房源候选。提取是字段级尽力而为的：
/// 缺失的元素得到该字段的回退值，只有页面本身不可读时才整体失败。
pub struct FieldExtractor {
    selectors: CompiledSelectors,
}

impl FieldExtractor {
    pub fn new(selectors: &ExtractorSelectors) -> Result<Self, ExtractionError> {
        Ok(Self {
            selectors: CompiledSelectors {
                agent_name: compile("agent_name", &selectors.agent_name)?,
                agent_phone: compile("agent_phone", &selectors.agent_phone)?,
                agent_email: compile("agent_email", &selectors.agent_email)?,
                agent_website: compile("agent_website", &selectors.agent_website)?,
                title: compile("title", &selectors.title)?,
                price: compile("price", &selectors.price)?,
                location: compile("location", &selectors.location)?,
                property_type: compile("property_type", &selectors.property_type)?,
                bedrooms: compile("bedrooms", &selectors.bedrooms)?,
                bathrooms: compile("bathrooms", &selectors.bathrooms)?,
                image: compile("image", &selectors.image)?,
                body: compile("body", "body")?,
            },
        })
    }

    /// 提取详情页
    ///
    /// # 参数
    ///
    /// * `html` - 渲染后的页面内容
    /// * `page_url` - 页面最终地址，用作经纪人主页和房源URL
    ///
    /// # 返回值
    ///
    /// * `Ok(ExtractedPage)` - 提取结果
    /// * `Err(ExtractionError)` - 页面不可提取
    pub fn extract(&self, html: &str, page_url: &str) -> Result<ExtractedPage, ExtractionError> {
        let base = Url::parse(page_url)
            .map_err(|_| ExtractionError::InvalidPageUrl(page_url.to_string()))?;

        if html.trim().is_empty() {
            return Err(ExtractionError::EmptyDocument(page_url.to_string()));
        }
        let document = Html::parse_document(html);
        let has_body = document
            .select(&self.selectors.body)
            .next()
            .is_some_and(|body| body.children().next().is_some());
        if !has_body {
            return Err(ExtractionError::EmptyDocument(page_url.to_string()));
        }

        let s = &self.selectors;
        let agent = AgentCandidate {
            name: first_text(&document, &s.agent_name)
                .unwrap_or_else(|| UNKNOWN_AGENT_NAME.to_string()),
            phone: text_or_link(&document, &s.agent_phone, "tel:"),
            email: text_or_link(&document, &s.agent_email, "mailto:"),
            website: first_attr(&document, &s.agent_website, "href"),
            profile_url: Some(page_url.to_string()),
            location: None,
            property_types: Vec::new(),
        };

        let listing = ListingCandidate {
            title: first_text(&document, &s.title).unwrap_or_else(|| UNTITLED_LISTING.to_string()),
            price: first_text(&document, &s.price),
            location: first_text(&document, &s.location)
                .unwrap_or_else(|| UNKNOWN_FIELD.to_string()),
            property_type: first_text(&document, &s.property_type)
                .unwrap_or_else(|| UNKNOWN_FIELD.to_string()),
            bedrooms: Some(first_count(&document, &s.bedrooms)),
            bathrooms: Some(first_count(&document, &s.bathrooms)),
            url: page_url.to_string(),
            image_url: first_attr(&document, &s.image, "src")
                .and_then(|src| base.join(&src).ok())
                .map(|url| url.to_string()),
        };

        Ok(ExtractedPage { agent, listing })
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|el| non_empty(element_text(el)))
}

fn first_attr(document: &Html, selector: &Selector, attr: &str) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .and_then(|value| non_empty(value.to_string()))
}

/// 元素文本优先；文本为空时回退到去掉协议前缀的链接目标
fn text_or_link(document: &Html, selector: &Selector, scheme: &str) -> Option<String> {
    let element = document.select(selector).next()?;
    non_empty(element_text(element)).or_else(|| {
        element
            .value()
            .attr("href")
            .map(|href| href.trim_start_matches(scheme).to_string())
            .and_then(non_empty)
    })
}

fn first_count(document: &Html, selector: &Selector) -> u32 {
    document
        .select(selector)
        .next()
        .and_then(|el| first_integer(&element_text(el)))
        .unwrap_or(0)
}
