pub mod error;
pub mod config;
pub mod site;
pub mod page;
pub mod script;
pub mod validate;
pub mod export;

// 重新导出错误处理
pub use error::{NavError, Result};

// 重新导出配置相关
pub use config::{DisplayConfig, DuplicatePolicy, NavConfig, ValidationConfig, DEFAULT_CONFIG_PATH};

// 重新导出站点相关
pub use site::{BrokenLink, DocSite, LinkReport};
pub use page::PageSummary;

// 重新导出脚本相关
pub use script::{
    NavChildren,
    NavEntry,
    NavIndex,
    NavNode,
    Walk,
    IndexStatistics,
    TreeStyle,
    TreeView,
};

// 重新导出校验和导出
pub use validate::{Issue, IssueKind, Severity, ValidationReport, Validator};
pub use export::ExportFormat;
