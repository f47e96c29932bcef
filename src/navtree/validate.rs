//! 导航索引校验模块
//!
//! 对解析后的导航树做结构检查。格式错误的条目属于生成工具的缺陷，
//! 解析器照常接受，由这里统一报告。

use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::Serialize;

use crate::navtree::config::{DuplicatePolicy, ValidationConfig};
use crate::navtree::script::{NavChildren, NavIndex, NavNode, QUALIFIED_SEPARATOR};

/// 问题严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// 问题类型
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// 标签为空
    EmptyLabel,
    /// 标签只包含空白字符
    BlankLabel,
    /// 既没有链接也没有子表
    NoLinkNoChildren,
    /// 内联子表为空
    EmptyChildTable,
    /// 同级重复标签，记录第一次出现的位置
    DuplicateLabel { first_index: usize },
    /// 超过允许的最大深度
    ExcessiveDepth { depth: usize, max_depth: usize },
}

impl IssueKind {
    pub fn severity(&self) -> Severity {
        match self {
            IssueKind::EmptyLabel | IssueKind::NoLinkNoChildren | IssueKind::DuplicateLabel { .. } => {
                Severity::Error
            }
            IssueKind::BlankLabel | IssueKind::EmptyChildTable | IssueKind::ExcessiveDepth { .. } => {
                Severity::Warning
            }
        }
    }
}

impl Display for IssueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            IssueKind::EmptyLabel => write!(f, "标签为空"),
            IssueKind::BlankLabel => write!(f, "标签只包含空白字符"),
            IssueKind::NoLinkNoChildren => write!(f, "节点既没有链接也没有子表"),
            IssueKind::EmptyChildTable => write!(f, "子表为空"),
            IssueKind::DuplicateLabel { first_index } => {
                write!(f, "同级重复标签，首次出现在索引 {}", first_index)
            }
            IssueKind::ExcessiveDepth { depth, max_depth } => {
                write!(f, "深度 {} 超过限制 {}", depth, max_depth)
            }
        }
    }
}

/// 校验发现的问题
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    /// 从根开始的索引路径
    pub path: Vec<usize>,
    /// 节点的限定名
    pub qualified_name: String,
}

impl Issue {
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl Display for Issue {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let level = match self.severity() {
            Severity::Error => "错误",
            Severity::Warning => "警告",
        };
        let path: Vec<String> = self.path.iter().map(|i| i.to_string()).collect();
        write!(
            f,
            "[{}] {} (路径 {}): {}",
            level,
            self.qualified_name,
            path.join("."),
            self.kind
        )
    }
}

/// 校验报告
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    /// 发现的问题（先序）
    pub issues: Vec<Issue>,
    /// 检查过的节点数
    pub checked_nodes: usize,
}

impl ValidationReport {
    /// 没有错误级别的问题即视为有效
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|issue| issue.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|issue| issue.severity() == Severity::Warning)
    }
}

/// 导航索引校验器
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// 校验整个索引
    pub fn validate(&self, index: &NavIndex) -> ValidationReport {
        let mut report = ValidationReport::default();
        let mut path = Vec::new();
        self.check_table(index.roots(), &mut path, "", &mut report);
        tracing::debug!(
            checked = report.checked_nodes,
            issues = report.issues.len(),
            "导航索引校验完成"
        );
        report
    }

    fn check_table(
        &self,
        nodes: &[NavNode],
        path: &mut Vec<usize>,
        prefix: &str,
        report: &mut ValidationReport,
    ) {
        let mut seen: HashMap<(&str, bool), usize> = HashMap::new();

        for (index, node) in nodes.iter().enumerate() {
            path.push(index);
            let name = if prefix.is_empty() {
                node.label.clone()
            } else {
                format!("{}{}{}", prefix, QUALIFIED_SEPARATOR, node.label)
            };
            report.checked_nodes += 1;

            let mut push = |kind: IssueKind| {
                report.issues.push(Issue {
                    kind,
                    path: path.clone(),
                    qualified_name: name.clone(),
                });
            };

            if node.label.is_empty() {
                push(IssueKind::EmptyLabel);
            } else if node.label.trim().is_empty() {
                push(IssueKind::BlankLabel);
            }

            if node.link.is_none() && node.children.is_none() {
                push(IssueKind::NoLinkNoChildren);
            }

            if let Some(NavChildren::Inline(children)) = &node.children {
                if children.is_empty() && !self.config.allow_empty_tables {
                    push(IssueKind::EmptyChildTable);
                }
            }

            let key = match self.config.duplicate_policy {
                DuplicatePolicy::Label => (node.label.as_str(), false),
                DuplicatePolicy::LabelAndKind => (node.label.as_str(), node.is_grouping()),
            };
            match seen.get(&key) {
                Some(&first_index) => push(IssueKind::DuplicateLabel { first_index }),
                None => {
                    seen.insert(key, index);
                }
            }

            if let Some(max_depth) = self.config.max_depth {
                let depth = path.len();
                if depth > max_depth {
                    push(IssueKind::ExcessiveDepth { depth, max_depth });
                }
            }

            self.check_table(node.child_nodes(), path, &name, report);
            path.pop();
        }
    }
}

impl NavIndex {
    /// 使用默认规则校验索引
    pub fn validate(&self) -> ValidationReport {
        Validator::default().validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = include_str!("../../tests/fixtures/annotated.js");

    fn page(label: &str) -> NavNode {
        NavNode::new(label, Some(format!("class{}.html", label)))
    }

    #[test]
    fn test_fixture_is_valid_with_default_policy() {
        let index = NavIndex::parse_js(FIXTURE).unwrap();
        let report = index.validate();
        assert!(report.is_valid(), "{:?}", report.issues);
        assert_eq!(report.checked_nodes, index.node_count());
    }

    #[test]
    fn test_fixture_has_namespace_class_pairs_under_label_policy() {
        let index = NavIndex::parse_js(FIXTURE).unwrap();
        let validator = Validator::new(ValidationConfig {
            duplicate_policy: DuplicatePolicy::Label,
            ..ValidationConfig::default()
        });
        let report = validator.validate(&index);
        let names: Vec<&str> = report.errors().map(|issue| issue.qualified_name.as_str()).collect();
        assert!(names.contains(&"Biodiverse::Matrix"));
        assert!(names.contains(&"Biodiverse::SpatialParams"));
        assert!(!report.is_valid());
    }

    #[test]
    fn test_node_without_link_or_children() {
        let index = NavIndex::new(None, vec![NavNode::new("Orphan", None)]);
        let report = index.validate();
        assert!(!report.is_valid());
        assert_eq!(report.issues[0].kind, IssueKind::NoLinkNoChildren);
        assert_eq!(report.issues[0].path, vec![0]);
    }

    #[test]
    fn test_empty_label_and_empty_table() {
        let index = NavIndex::new(
            None,
            vec![NavNode::grouping(
                "Ns",
                vec![
                    NavNode::grouping("", vec![]),
                    NavNode::new(" ", Some("blank.html".to_string())),
                ],
            )],
        );
        let report = index.validate();
        let kinds: Vec<&IssueKind> = report.issues.iter().map(|issue| &issue.kind).collect();
        assert_eq!(
            kinds,
            vec![&IssueKind::EmptyLabel, &IssueKind::EmptyChildTable, &IssueKind::BlankLabel]
        );
        assert_eq!(report.errors().count(), 1);
        assert_eq!(report.warnings().count(), 2);
        assert_eq!(report.issues[0].qualified_name, "Ns::");
        assert_eq!(report.issues[2].qualified_name, "Ns:: ");
    }

    #[test]
    fn test_allow_empty_tables() {
        let index = NavIndex::new(None, vec![NavNode::grouping("Ns", vec![])]);
        let validator = Validator::new(ValidationConfig {
            allow_empty_tables: true,
            ..ValidationConfig::default()
        });
        assert!(validator.validate(&index).issues.is_empty());
    }

    #[test]
    fn test_duplicate_siblings() {
        let index = NavIndex::new(
            None,
            vec![NavNode::grouping("Ns", vec![page("A"), page("B"), page("A")])],
        );
        let report = index.validate();
        assert_eq!(report.errors().count(), 1);
        let issue = report.errors().next().unwrap();
        assert_eq!(issue.kind, IssueKind::DuplicateLabel { first_index: 0 });
        assert_eq!(issue.path, vec![0, 2]);
        assert_eq!(issue.qualified_name, "Ns::A");
    }

    #[test]
    fn test_same_label_on_different_levels_is_fine() {
        let index = NavIndex::new(
            None,
            vec![NavNode::grouping("A", vec![page("A")])],
        );
        assert!(index.validate().issues.is_empty());
    }

    #[test]
    fn test_max_depth_warning() {
        let index = NavIndex::new(
            None,
            vec![NavNode::grouping("A", vec![NavNode::grouping("B", vec![page("C")])])],
        );
        let validator = Validator::new(ValidationConfig {
            max_depth: Some(2),
            ..ValidationConfig::default()
        });
        let report = validator.validate(&index);
        assert!(report.is_valid());
        assert_eq!(
            report.issues[0].kind,
            IssueKind::ExcessiveDepth { depth: 3, max_depth: 2 }
        );
        assert_eq!(report.issues[0].to_string(), "[警告] A::B::C (路径 0.0.0): 深度 3 超过限制 2");
    }
}
