//! 配置模块
//!
//! 提供导航索引处理的配置管理功能，支持从YAML文件加载配置。

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::navtree::error::{NavError, Result};
use crate::navtree::script::TreeStyle;

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "navforge.yaml";

/// 同级重复标签的判定方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// 同级标签相同即视为重复
    Label,
    /// 标签相同且同为分组节点或同为页面节点才视为重复
    ///
    /// 文档工具会把命名空间和同名类并列在同一层（例如 `Matrix` 命名空间和 `Matrix` 类）。
    #[default]
    LabelAndKind,
}

/// 校验规则配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// 重复标签判定方式
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
    /// 允许的最大深度
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    /// 是否允许空的内联子表
    #[serde(default)]
    pub allow_empty_tables: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::LabelAndKind,
            max_depth: None,
            allow_empty_tables: false,
        }
    }
}

/// 树形显示配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// 显示样式
    #[serde(default)]
    pub style: TreeStyle,
    /// 是否显示链接
    #[serde(default = "default_show_links")]
    pub show_links: bool,
    /// 最大显示深度
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
}

fn default_show_links() -> bool {
    true
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            style: TreeStyle::TreeSymbols,
            show_links: default_show_links(),
            max_depth: None,
        }
    }
}

/// navforge 配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavConfig {
    /// 站点中的索引脚本名（不含 `.js`）
    #[serde(default = "default_index_script")]
    pub index_script: String,
    /// 打开站点时是否展开延迟子表
    #[serde(default)]
    pub resolve_deferred: bool,
    /// 校验规则
    #[serde(default)]
    pub validation: ValidationConfig,
    /// 显示选项
    #[serde(default)]
    pub display: DisplayConfig,
}

fn default_index_script() -> String {
    "annotated".to_string()
}

impl Default for NavConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

impl NavConfig {
    /// 获取默认配置
    pub fn default_config() -> Self {
        Self {
            index_script: default_index_script(),
            resolve_deferred: false,
            validation: ValidationConfig::default(),
            display: DisplayConfig::default(),
        }
    }

    /// 从YAML文本解析配置
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yml::from_str(content)
            .map_err(|e| NavError::ConfigError(format!("配置文件格式错误: {}", e)))
    }

    /// 从配置文件中加载配置
    ///
    /// # 示例
    ///
    /// ```rust,no_run
    /// use navforge::NavConfig;
    /// let config = NavConfig::from_file("navforge.yaml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| NavError::ConfigError(format!("无法读取配置文件: {}", e)))?;
        Self::from_yaml(&content)
    }

    /// 序列化为带注释头的YAML文本
    pub fn to_yaml(&self) -> Result<String> {
        let yaml_content = serde_yml::to_string(self)
            .map_err(|e| NavError::ConfigError(format!("序列化配置失败: {}", e)))?;

        Ok(format!(
            "# navforge 配置文件\n# index_script: 站点中的索引脚本名\n# validation.duplicate_policy: label | label_and_kind\n# display.style: tree_symbols | indented\n\n{}",
            yaml_content
        ))
    }

    /// 生成默认配置文件到指定路径
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let content = Self::default_config().to_yaml()?;
        fs::write(path, content)
            .map_err(|e| NavError::ConfigError(format!("写入配置文件失败: {}", e)))?;
        Ok(())
    }

    /// 尝试从配置文件加载，文件不存在时先生成默认配置文件
    ///
    /// 文件存在但格式错误时返回错误。
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }

        tracing::info!(path = %path.display(), "配置文件不存在，生成默认配置");
        Self::generate_default_config(path)?;
        Ok(Self::default_config())
    }
}
