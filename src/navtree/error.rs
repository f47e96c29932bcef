use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, NavError>;

/// 导航索引相关的错误类型
#[derive(Error, Debug)]
pub enum NavError {
    #[error("IO错误: {0}")]
    Io(#[from] io::Error),

    #[error("Zip文件错误: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML解析错误: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("JSON错误: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("脚本语法错误 (第{line}行, 第{column}列): {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("无效的索引条目 (第{line}行, 第{column}列): {message}")]
    InvalidEntry {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("不是有效的文档站点: {0}")]
    InvalidSite(String),

    #[error("找不到索引脚本: {0}")]
    MissingIndex(String),

    #[error("找不到子表脚本: {0}")]
    MissingScript(String),

    #[error("脚本变量名不匹配: 期望 {expected}, 找到: {found}")]
    ScriptMismatch { expected: String, found: String },

    #[error("子表脚本存在循环引用: {0}")]
    ScriptCycle(String),

    #[error("展开子表脚本 {script}.js 后嵌套深度超过 {max_depth} 层")]
    DepthLimit { script: String, max_depth: usize },

    #[error("配置文件错误: {0}")]
    ConfigError(String),

    #[error("导出错误: {0}")]
    ExportError(String),

    #[error("导入错误: {0}")]
    ImportError(String),
}
