//! 文档页面检查模块
//!
//! 解析导航条目指向的HTML页面，提取页面标题和可跳转的锚点。

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.title").expect("div.title 是合法的选择器"));
static HEAD_TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("title 是合法的选择器"));
static ID_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("[id]").expect("[id] 是合法的选择器"));
static NAMED_ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[name]").expect("a[name] 是合法的选择器"));

/// 文档页面摘要
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSummary {
    /// 页面标题，优先取正文中的 `div.title`
    pub title: Option<String>,
    /// 页面中所有的锚点（`id` 属性和 `<a name>`）
    pub anchors: BTreeSet<String>,
}

impl PageSummary {
    /// 解析HTML页面
    pub fn parse_html(html: &str) -> Self {
        let document = Html::parse_document(html);

        let title = document
            .select(&TITLE_SELECTOR)
            .next()
            .or_else(|| document.select(&HEAD_TITLE_SELECTOR).next())
            .map(element_text)
            .filter(|text| !text.is_empty());

        let mut anchors = BTreeSet::new();
        for element in document.select(&ID_SELECTOR) {
            if let Some(id) = element.value().attr("id") {
                anchors.insert(id.to_string());
            }
        }
        for element in document.select(&NAMED_ANCHOR_SELECTOR) {
            if let Some(name) = element.value().attr("name") {
                anchors.insert(name.to_string());
            }
        }

        Self { title, anchors }
    }

    /// 页面中是否存在指定锚点
    pub fn has_anchor(&self, anchor: &str) -> bool {
        self.anchors.contains(anchor)
    }
}

/// 提取元素文本并压缩空白
fn element_text(element: ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
