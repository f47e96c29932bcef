pub mod navtree;

// === 核心API重新导出 ===

/// 导航索引（主要数据结构）
pub use navtree::{NavIndex, NavNode, NavChildren};

/// 文档站点读取器
pub use navtree::DocSite;

/// 错误处理
pub use navtree::{NavError, Result};

// === 遍历、显示与校验 ===

/// 遍历
pub use navtree::{NavEntry, Walk};

/// 树形显示和统计
pub use navtree::{IndexStatistics, TreeStyle, TreeView};

/// 校验
pub use navtree::{Issue, IssueKind, Severity, ValidationReport, Validator};

/// 链接检查和页面信息
pub use navtree::{BrokenLink, LinkReport, PageSummary};

// === 配置与导出 ===

pub use navtree::{NavConfig, ValidationConfig, DisplayConfig, DuplicatePolicy};
pub use navtree::ExportFormat;

// === 库信息 ===

/// navforge库的版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// navforge库的描述
pub const DESCRIPTION: &str = "读取、校验和导出文档导航索引的工具库";

// === 便捷函数 ===

/// 快速解析导航脚本文件
///
/// 这是 `NavIndex::parse_file` 的便捷包装函数。
///
/// # 示例
///
/// ```rust,no_run
/// let index = navforge::open("doc/html/annotated.js")?;
/// println!("节点数: {}", index.node_count());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<NavIndex> {
    NavIndex::parse_file(path)
}
