//! 导航索引数据结构定义
//!
//! 定义导航脚本中的节点、子表以及整个索引，并提供深度优先遍历和查找功能。

use serde::{Deserialize, Serialize};

use crate::navtree::error::{NavError, Result};

/// 限定名的分隔符（与文档工具的命名空间写法一致）
pub const QUALIFIED_SEPARATOR: &str = "::";

/// 节点的最大嵌套深度
///
/// 遍历之外的大部分操作（统计、校验、写出、序列化）都是递归的，
/// 解析和展开时超过此深度直接报错。
pub const MAX_DEPTH: usize = 64;

/// 节点的子表
///
/// 文档工具在条目第三个字段中要么内联写出子表，
/// 要么写出另一个脚本的名字（`<name>.js`），由浏览器按需加载。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NavChildren {
    /// 内联子表
    Inline(Vec<NavNode>),
    /// 延迟加载的子表脚本名
    Deferred(String),
}

/// 导航节点
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavNode {
    /// 显示名称（类、命名空间或包名）
    pub label: String,
    /// 文档页面链接，命名空间分组节点没有自己的页面
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// 子表，叶子节点为 None
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<NavChildren>,
}

impl NavNode {
    /// 创建新的叶子节点
    pub fn new(label: impl Into<String>, link: Option<String>) -> Self {
        Self {
            label: label.into(),
            link,
            children: None,
        }
    }

    /// 创建没有页面的分组节点
    pub fn grouping(label: impl Into<String>, children: Vec<NavNode>) -> Self {
        Self {
            label: label.into(),
            link: None,
            children: Some(NavChildren::Inline(children)),
        }
    }

    /// 设置内联子表
    pub fn with_children(mut self, children: Vec<NavNode>) -> Self {
        self.children = Some(NavChildren::Inline(children));
        self
    }

    /// 设置延迟加载的子表脚本
    pub fn with_deferred(mut self, script: impl Into<String>) -> Self {
        self.children = Some(NavChildren::Deferred(script.into()));
        self
    }

    /// 是否为分组节点（没有自己的页面）
    pub fn is_grouping(&self) -> bool {
        self.link.is_none()
    }

    /// 是否为叶子节点（没有已加载的子节点）
    pub fn is_leaf(&self) -> bool {
        self.child_nodes().is_empty()
    }

    /// 已加载的子节点，延迟子表或无子表时为空
    pub fn child_nodes(&self) -> &[NavNode] {
        match &self.children {
            Some(NavChildren::Inline(children)) => children,
            _ => &[],
        }
    }

    /// 尚未加载的子表脚本名
    pub fn deferred_script(&self) -> Option<&str> {
        match &self.children {
            Some(NavChildren::Deferred(script)) => Some(script),
            _ => None,
        }
    }

    /// 链接的页面部分（去掉 `#` 锚点）
    pub fn page(&self) -> Option<&str> {
        self.link
            .as_deref()
            .map(|link| link.split_once('#').map_or(link, |(page, _)| page))
    }

    /// 链接中的锚点
    pub fn anchor(&self) -> Option<&str> {
        self.link
            .as_deref()
            .and_then(|link| link.split_once('#'))
            .map(|(_, anchor)| anchor)
            .filter(|anchor| !anchor.is_empty())
    }

    /// 节点及其所有子节点的数量
    pub fn count_nodes(&self) -> usize {
        1 + self
            .child_nodes()
            .iter()
            .map(|child| child.count_nodes())
            .sum::<usize>()
    }

    /// 节点深度（叶子节点为1）
    pub fn depth(&self) -> usize {
        1 + self
            .child_nodes()
            .iter()
            .map(|child| child.depth())
            .max()
            .unwrap_or(0)
    }

    /// 根据路径数组获取子节点，`[]` 表示当前节点本身
    pub fn get_node_by_path(&self, path: &[usize]) -> Option<&NavNode> {
        match path.split_first() {
            None => Some(self),
            Some((first, rest)) => self.child_nodes().get(*first)?.get_node_by_path(rest),
        }
    }

    fn find_qualified(&self, segments: &[&str]) -> Option<&NavNode> {
        match segments.split_first() {
            None => Some(self),
            Some((first, rest)) => self
                .child_nodes()
                .iter()
                .filter(|child| child.label == *first)
                .find_map(|child| child.find_qualified(rest)),
        }
    }

    fn collect_qualified<'a>(&'a self, prefix: &str, names: &mut Vec<(String, &'a NavNode)>) {
        let name = if prefix.is_empty() {
            self.label.clone()
        } else {
            format!("{}{}{}", prefix, QUALIFIED_SEPARATOR, self.label)
        };
        names.push((name.clone(), self));
        for child in self.child_nodes() {
            child.collect_qualified(&name, names);
        }
    }

    fn resolve_deferred_with<F>(
        &mut self,
        depth: usize,
        load: &mut F,
        chain: &mut Vec<String>,
        resolved: &mut usize,
    ) -> Result<()>
    where
        F: FnMut(&str) -> Result<Vec<NavNode>>,
    {
        if depth > MAX_DEPTH {
            return Err(NavError::DepthLimit {
                script: chain.last().cloned().unwrap_or_default(),
                max_depth: MAX_DEPTH,
            });
        }

        let mut entered = false;
        if let Some(NavChildren::Deferred(script)) = &self.children {
            if chain.iter().any(|seen| seen == script) {
                let mut cycle = chain.clone();
                cycle.push(script.clone());
                return Err(NavError::ScriptCycle(cycle.join(" -> ")));
            }
            let script = script.clone();
            let loaded = load(&script)?;
            self.children = Some(NavChildren::Inline(loaded));
            chain.push(script);
            entered = true;
            *resolved += 1;
        }

        if let Some(NavChildren::Inline(children)) = &mut self.children {
            for child in children {
                child.resolve_deferred_with(depth + 1, load, chain, resolved)?;
            }
        }

        if entered {
            chain.pop();
        }
        Ok(())
    }
}

/// 遍历时产生的条目
#[derive(Debug, Clone)]
pub struct NavEntry<'a> {
    /// 节点引用
    pub node: &'a NavNode,
    /// 节点深度（根节点为0）
    pub depth: usize,
    /// 从根开始的索引路径
    pub path: Vec<usize>,
}

/// 深度优先先序遍历器
pub struct Walk<'a> {
    stack: Vec<(&'a [NavNode], usize)>,
}

impl<'a> Walk<'a> {
    fn new(roots: &'a [NavNode]) -> Self {
        Self {
            stack: vec![(roots, 0)],
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = NavEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            let nodes: &'a [NavNode] = frame.0;
            let index = frame.1;
            if index >= nodes.len() {
                self.stack.pop();
                continue;
            }
            frame.1 += 1;

            let node = &nodes[index];
            let path: Vec<usize> = self.stack.iter().map(|(_, next)| next - 1).collect();
            let depth = path.len() - 1;

            let children = node.child_nodes();
            if !children.is_empty() {
                self.stack.push((children, 0));
            }

            return Some(NavEntry { node, depth, path });
        }
    }
}

/// 导航索引
///
/// 对应文档工具生成的一个脚本文件：一个变量名加上顶层条目列表。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavIndex {
    /// 脚本中声明的变量名（例如 `annotated`）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// 顶层节点列表
    pub roots: Vec<NavNode>,
}

impl NavIndex {
    /// 创建新的导航索引
    pub fn new(name: Option<String>, roots: Vec<NavNode>) -> Self {
        Self { name, roots }
    }

    /// 获取顶层节点列表
    pub fn roots(&self) -> &[NavNode] {
        &self.roots
    }

    /// 深度优先先序遍历所有已加载的节点
    pub fn walk(&self) -> Walk<'_> {
        Walk::new(&self.roots)
    }

    /// 按先序列出所有 (标签, 链接) 对
    pub fn links(&self) -> Vec<(&str, Option<&str>)> {
        self.walk()
            .map(|entry| (entry.node.label.as_str(), entry.node.link.as_deref()))
            .collect()
    }

    /// 节点总数
    pub fn node_count(&self) -> usize {
        self.roots.iter().map(|root| root.count_nodes()).sum()
    }

    /// 最大深度，空索引为0
    pub fn depth(&self) -> usize {
        self.roots.iter().map(|root| root.depth()).max().unwrap_or(0)
    }

    /// 根据路径数组获取节点
    /// - `[0]` 表示第一个根节点
    /// - `[1, 0, 2]` 表示第二个根节点的第一个子节点的第三个子节点
    pub fn get_node_by_path(&self, path: &[usize]) -> Option<&NavNode> {
        let (first, rest) = path.split_first()?;
        self.roots.get(*first)?.get_node_by_path(rest)
    }

    /// 获取下一个兄弟节点
    pub fn next_sibling(&self, path: &[usize]) -> Option<&NavNode> {
        let (last, parent) = path.split_last()?;
        let mut next_path = parent.to_vec();
        next_path.push(last.checked_add(1)?);
        self.get_node_by_path(&next_path)
    }

    /// 获取上一个兄弟节点，第一个节点返回 None
    pub fn prev_sibling(&self, path: &[usize]) -> Option<&NavNode> {
        let (last, parent) = path.split_last()?;
        let mut prev_path = parent.to_vec();
        prev_path.push(last.checked_sub(1)?);
        self.get_node_by_path(&prev_path)
    }

    /// 按标签查找第一个匹配的节点
    pub fn find_by_label(&self, label: &str) -> Option<&NavNode> {
        self.walk()
            .find(|entry| entry.node.label == label)
            .map(|entry| entry.node)
    }

    /// 按链接查找节点（完整匹配）
    pub fn find_by_link(&self, link: &str) -> Option<&NavNode> {
        self.find_path_by_link(link)
            .and_then(|path| self.get_node_by_path(&path))
    }

    /// 按链接查找节点路径
    pub fn find_path_by_link(&self, link: &str) -> Option<Vec<usize>> {
        self.walk()
            .find(|entry| entry.node.link.as_deref() == Some(link))
            .map(|entry| entry.path)
    }

    /// 按限定名查找节点，例如 `Biodiverse::GUI::Tabs::Spatial`
    ///
    /// 同一层允许命名空间和同名类并存，查找时会尝试所有同名节点。
    pub fn find_by_qualified_name(&self, name: &str) -> Option<&NavNode> {
        let segments: Vec<&str> = name.split(QUALIFIED_SEPARATOR).collect();
        let (first, rest) = segments.split_first()?;
        self.roots
            .iter()
            .filter(|root| root.label == *first)
            .find_map(|root| root.find_qualified(rest))
    }

    /// 按先序列出所有节点的限定名
    pub fn qualified_names(&self) -> Vec<(String, &NavNode)> {
        let mut names = Vec::with_capacity(self.node_count());
        for root in &self.roots {
            root.collect_qualified("", &mut names);
        }
        names
    }

    /// 所有尚未加载的子表脚本名（先序）
    pub fn deferred_scripts(&self) -> Vec<&str> {
        self.walk()
            .filter_map(|entry| entry.node.deferred_script())
            .collect()
    }

    /// 用给定的加载函数展开所有延迟子表，返回展开的子表数量
    ///
    /// 加载得到的子表中如果还有延迟引用会继续展开；
    /// 一个脚本出现在自己的展开链上时返回 `ScriptCycle`，
    /// 展开后的深度超过 [`MAX_DEPTH`] 时返回 `DepthLimit`。
    ///
    /// 在副本上展开，全部成功后才替换；出错时索引保持不变。
    pub fn resolve_deferred_with<F>(&mut self, mut load: F) -> Result<usize>
    where
        F: FnMut(&str) -> Result<Vec<NavNode>>,
    {
        let mut roots = self.roots.clone();
        let mut chain = Vec::new();
        let mut resolved = 0;
        for root in &mut roots {
            root.resolve_deferred_with(1, &mut load, &mut chain, &mut resolved)?;
        }
        self.roots = roots;
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NavIndex {
        NavIndex::new(
            Some("annotated".to_string()),
            vec![
                NavNode::grouping(
                    "App",
                    vec![NavNode::new(
                        "Biodiverse",
                        Some("classApp_1_1Biodiverse.html".to_string()),
                    )],
                ),
                NavNode::grouping(
                    "Biodiverse",
                    vec![
                        NavNode::grouping(
                            "Matrix",
                            vec![NavNode::new(
                                "Base",
                                Some("classBiodiverse_1_1Matrix_1_1Base.html".to_string()),
                            )],
                        ),
                        NavNode::new(
                            "Matrix",
                            Some("classBiodiverse_1_1Matrix.html".to_string()),
                        )
                        .with_deferred("classBiodiverse_1_1Matrix"),
                    ],
                ),
                NavNode::new("main", Some("classmain.html".to_string())),
            ],
        )
    }

    #[test]
    fn test_walk_is_preorder() {
        let index = sample();
        let labels: Vec<&str> = index.walk().map(|entry| entry.node.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["App", "Biodiverse", "Biodiverse", "Matrix", "Base", "Matrix", "main"]
        );
    }

    #[test]
    fn test_walk_paths_and_depths() {
        let index = sample();
        let entries: Vec<(Vec<usize>, usize)> =
            index.walk().map(|entry| (entry.path, entry.depth)).collect();
        assert_eq!(entries[0], (vec![0], 0));
        assert_eq!(entries[1], (vec![0, 0], 1));
        assert_eq!(entries[4], (vec![1, 0, 0], 2));
        assert_eq!(entries[6], (vec![2], 0));
        for entry in index.walk() {
            let found = index.get_node_by_path(&entry.path).unwrap();
            assert!(std::ptr::eq(found, entry.node));
        }
    }

    #[test]
    fn test_walk_visits_every_node_once() {
        let index = sample();
        assert_eq!(index.walk().count(), index.node_count());
        assert_eq!(index.node_count(), 7);
        assert_eq!(index.depth(), 3);
    }

    #[test]
    fn test_empty_index() {
        let index = NavIndex::default();
        assert_eq!(index.walk().count(), 0);
        assert_eq!(index.depth(), 0);
        assert!(index.get_node_by_path(&[0]).is_none());
        assert!(index.get_node_by_path(&[]).is_none());
    }

    #[test]
    fn test_links() {
        let index = sample();
        let links = index.links();
        assert_eq!(links[0], ("App", None));
        assert_eq!(links[1], ("Biodiverse", Some("classApp_1_1Biodiverse.html")));
        assert_eq!(links.len(), 7);
    }

    #[test]
    fn test_qualified_lookup_backtracks_over_same_label() {
        let index = sample();
        let base = index.find_by_qualified_name("Biodiverse::Matrix::Base").unwrap();
        assert_eq!(base.link.as_deref(), Some("classBiodiverse_1_1Matrix_1_1Base.html"));

        let matrix = index.find_by_qualified_name("Biodiverse::Matrix").unwrap();
        assert!(matrix.is_grouping());

        assert!(index.find_by_qualified_name("Biodiverse::Missing").is_none());
    }

    #[test]
    fn test_qualified_names_in_preorder() {
        let index = sample();
        let names: Vec<String> = index.qualified_names().into_iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec![
                "App",
                "App::Biodiverse",
                "Biodiverse",
                "Biodiverse::Matrix",
                "Biodiverse::Matrix::Base",
                "Biodiverse::Matrix",
                "main",
            ]
        );
    }

    #[test]
    fn test_siblings() {
        let index = sample();
        assert_eq!(index.next_sibling(&[0]).unwrap().label, "Biodiverse");
        assert!(index.prev_sibling(&[0]).is_none());
        assert_eq!(index.prev_sibling(&[1, 1]).unwrap().label, "Matrix");
        assert!(index.next_sibling(&[1, 1]).is_none());
    }

    #[test]
    fn test_page_and_anchor() {
        let node = NavNode::new("run", Some("classSpatial.html#a1b2".to_string()));
        assert_eq!(node.page(), Some("classSpatial.html"));
        assert_eq!(node.anchor(), Some("a1b2"));

        let plain = NavNode::new("Spatial", Some("classSpatial.html".to_string()));
        assert_eq!(plain.page(), Some("classSpatial.html"));
        assert_eq!(plain.anchor(), None);
    }

    #[test]
    fn test_find_by_link() {
        let index = sample();
        assert_eq!(index.find_by_link("classmain.html").unwrap().label, "main");
        assert_eq!(index.find_path_by_link("classApp_1_1Biodiverse.html"), Some(vec![0, 0]));
        assert_eq!(index.find_by_label("Base").unwrap().label, "Base");
    }

    #[test]
    fn test_resolve_deferred() {
        let mut index = sample();
        assert_eq!(index.deferred_scripts(), vec!["classBiodiverse_1_1Matrix"]);

        let resolved = index
            .resolve_deferred_with(|script| {
                assert_eq!(script, "classBiodiverse_1_1Matrix");
                Ok(vec![NavNode::new(
                    "get_element",
                    Some("classBiodiverse_1_1Matrix.html#a01".to_string()),
                )])
            })
            .unwrap();

        assert_eq!(resolved, 1);
        assert!(index.deferred_scripts().is_empty());
        assert_eq!(index.get_node_by_path(&[1, 1, 0]).unwrap().label, "get_element");
    }

    #[test]
    fn test_resolve_deferred_detects_cycle() {
        let mut index = NavIndex::new(
            None,
            vec![NavNode::new("A", Some("a.html".to_string())).with_deferred("a")],
        );
        let err = index
            .resolve_deferred_with(|_| {
                Ok(vec![NavNode::new("again", Some("a.html".to_string())).with_deferred("a")])
            })
            .unwrap_err();
        assert!(matches!(err, NavError::ScriptCycle(ref chain) if chain == "a -> a"));
    }

    #[test]
    fn test_failed_resolve_leaves_index_unchanged() {
        let mut index = NavIndex::new(
            None,
            vec![
                NavNode::new("A", Some("a.html".to_string())).with_deferred("a"),
                NavNode::new("B", Some("b.html".to_string())).with_deferred("b"),
            ],
        );
        let before = index.clone();
        let err = index
            .resolve_deferred_with(|script| match script {
                "a" => Ok(vec![NavNode::new("run", Some("a.html#r".to_string()))]),
                other => Err(NavError::MissingScript(format!("{}.js", other))),
            })
            .unwrap_err();
        assert!(matches!(err, NavError::MissingScript(_)));
        assert_eq!(index, before);
    }

    #[test]
    fn test_resolve_stops_at_depth_limit() {
        let mut index = NavIndex::new(
            None,
            vec![NavNode::new("A", Some("a.html".to_string())).with_deferred("s0")],
        );
        // 每个脚本引用下一个不同的脚本，不构成循环
        let mut next = 0;
        let err = index
            .resolve_deferred_with(|_| {
                next += 1;
                Ok(vec![NavNode::new("n", Some("n.html".to_string())).with_deferred(format!("s{}", next))])
            })
            .unwrap_err();
        assert!(matches!(err, NavError::DepthLimit { max_depth: MAX_DEPTH, .. }));
        assert_eq!(index.deferred_scripts(), vec!["s0"]);
    }
}
