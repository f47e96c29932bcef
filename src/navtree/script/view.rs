//! 导航树显示模块
//!
//! 提供导航索引的统计信息和树形文本渲染。

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::navtree::script::node::{NavIndex, NavNode};

/// 导航树显示样式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeStyle {
    /// 使用树状符号（├── └──）
    #[default]
    TreeSymbols,
    /// 使用缩进和符号（• ）
    Indented,
}

/// 导航索引统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStatistics {
    /// 总节点数
    pub total_nodes: usize,
    /// 最大深度
    pub max_depth: usize,
    /// 叶子节点数
    pub leaf_count: usize,
    /// 根节点数
    pub root_count: usize,
    /// 分组节点数（没有页面）
    pub grouping_count: usize,
    /// 带页面的节点数
    pub page_count: usize,
    /// 未加载的子表数
    pub deferred_count: usize,
}

impl Display for IndexStatistics {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "索引统计: {} 个节点, {} 个根节点, {} 个叶子节点, {} 个分组, {} 个页面, {} 个延迟子表, 最大深度: {}",
            self.total_nodes,
            self.root_count,
            self.leaf_count,
            self.grouping_count,
            self.page_count,
            self.deferred_count,
            self.max_depth
        )
    }
}

impl NavIndex {
    /// 获取导航索引的统计信息
    pub fn statistics(&self) -> IndexStatistics {
        let mut stats = IndexStatistics {
            root_count: self.roots.len(),
            ..IndexStatistics::default()
        };

        for entry in self.walk() {
            let node = entry.node;
            stats.total_nodes += 1;
            stats.max_depth = stats.max_depth.max(entry.depth + 1);
            if node.is_leaf() {
                stats.leaf_count += 1;
            }
            if node.is_grouping() {
                stats.grouping_count += 1;
            } else {
                stats.page_count += 1;
            }
            if node.deferred_script().is_some() {
                stats.deferred_count += 1;
            }
        }

        stats
    }

    /// 创建树形视图
    pub fn view(&self) -> TreeView<'_> {
        TreeView::new(self)
    }
}

/// 导航树的文本视图
#[derive(Debug, Clone)]
pub struct TreeView<'a> {
    index: &'a NavIndex,
    /// 显示样式
    pub style: TreeStyle,
    /// 是否显示链接
    pub show_links: bool,
    /// 最大显示深度（None表示显示所有）
    pub max_depth: Option<usize>,
}

impl<'a> TreeView<'a> {
    /// 创建新的树形视图
    pub fn new(index: &'a NavIndex) -> Self {
        Self {
            index,
            style: TreeStyle::TreeSymbols,
            show_links: true,
            max_depth: None,
        }
    }

    /// 设置显示样式
    pub fn with_style(mut self, style: TreeStyle) -> Self {
        self.style = style;
        self
    }

    /// 设置是否显示链接
    pub fn with_show_links(mut self, show_links: bool) -> Self {
        self.show_links = show_links;
        self
    }

    /// 设置最大显示深度
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn within_depth(&self, depth: usize) -> bool {
        self.max_depth.is_none_or(|max| depth < max)
    }

    fn node_content(&self, node: &NavNode) -> String {
        let mut content = node.label.clone();
        if self.show_links {
            if let Some(link) = &node.link {
                content.push_str(&format!(" → {}", link));
            }
            if let Some(script) = node.deferred_script() {
                content.push_str(&format!(" (+{}.js)", script));
            }
        }
        content
    }

    /// 渲染树状符号风格
    fn render_tree_style(&self, node: &NavNode, depth: usize, is_last: bool, prefix: &str, result: &mut String) {
        if !self.within_depth(depth) {
            return;
        }

        let branch = if is_last { "└── " } else { "├── " };
        result.push_str(&format!("{}{}{}\n", prefix, branch, self.node_content(node)));

        let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
        let children = node.child_nodes();
        for (index, child) in children.iter().enumerate() {
            let is_child_last = index == children.len() - 1;
            self.render_tree_style(child, depth + 1, is_child_last, &child_prefix, result);
        }
    }

    /// 渲染缩进风格
    fn render_indent_style(&self, node: &NavNode, depth: usize, result: &mut String) {
        if !self.within_depth(depth) {
            return;
        }

        let indent = "  ".repeat(depth);
        result.push_str(&format!("{}• {}\n", indent, self.node_content(node)));

        for child in node.child_nodes() {
            self.render_indent_style(child, depth + 1, result);
        }
    }
}

impl Display for TreeView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut result = String::new();

        if let Some(name) = &self.index.name {
            let depth_info = match self.max_depth {
                Some(max_depth) => format!(" (深度限制: {})", max_depth),
                None => String::new(),
            };
            result.push_str(&format!("🧭 {}{}\n", name, depth_info));
            result.push_str("═══════════════════════════════════════\n");
        }

        let roots = self.index.roots();
        for (index, root) in roots.iter().enumerate() {
            match self.style {
                TreeStyle::TreeSymbols => {
                    let is_last = index == roots.len() - 1;
                    self.render_tree_style(root, 0, is_last, "", &mut result);
                }
                TreeStyle::Indented => self.render_indent_style(root, 0, &mut result),
            }
        }

        write!(f, "{}", result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NavIndex {
        NavIndex::new(
            None,
            vec![
                NavNode::grouping(
                    "App",
                    vec![NavNode::new("Biodiverse", Some("classApp_1_1Biodiverse.html".to_string()))],
                ),
                NavNode::new("Tree", Some("classTree.html".to_string())).with_deferred("classTree"),
            ],
        )
    }

    #[test]
    fn test_statistics() {
        let stats = sample().statistics();
        assert_eq!(
            stats,
            IndexStatistics {
                total_nodes: 3,
                max_depth: 2,
                leaf_count: 2,
                root_count: 2,
                grouping_count: 1,
                page_count: 2,
                deferred_count: 1,
            }
        );
    }

    #[test]
    fn test_tree_symbols() {
        let index = sample();
        let rendered = index.view().to_string();
        assert_eq!(
            rendered,
            "├── App\n│   └── Biodiverse → classApp_1_1Biodiverse.html\n└── Tree → classTree.html (+classTree.js)\n"
        );
    }

    #[test]
    fn test_indented_without_links() {
        let index = sample();
        let rendered = index
            .view()
            .with_style(TreeStyle::Indented)
            .with_show_links(false)
            .to_string();
        assert_eq!(rendered, "• App\n  • Biodiverse\n• Tree\n");
    }

    #[test]
    fn test_max_depth() {
        let index = sample();
        let rendered = index.view().with_show_links(false).with_max_depth(Some(1)).to_string();
        assert_eq!(rendered, "├── App\n└── Tree\n");
    }

    #[test]
    fn test_title_header() {
        let mut index = sample();
        index.name = Some("annotated".to_string());
        let rendered = index.view().to_string();
        assert!(rendered.starts_with("🧭 annotated\n"));
    }
}
