//! 文档站点模块
//!
//! 打开文档工具的输出目录或其zip压缩包，按需读取索引脚本、延迟子表脚本和页面，
//! 并检查索引中的链接是否指向存在的页面和锚点。

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};
use zip::ZipArchive;
use zip::result::ZipError;

use crate::navtree::config::NavConfig;
use crate::navtree::error::{NavError, Result};
use crate::navtree::page::PageSummary;
use crate::navtree::script::{NavIndex, NavNode};

/// 站点首页，用于定位文档根目录
const SITE_ENTRY: &str = "index.html";

/// 站点内容的存放方式
enum Backend {
    Directory(PathBuf),
    Archive(ZipArchive<File>),
}

/// 表示一个文档站点（目录或zip压缩包）
pub struct DocSite {
    backend: Backend,
    /// 文档根目录在压缩包内的前缀，例如 `html/`
    prefix: String,
}

/// 链接检查发现的失效链接
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokenLink {
    /// 节点的限定名
    pub qualified_name: String,
    /// 原始链接
    pub link: String,
}

/// 链接检查报告
#[derive(Debug, Clone, Default, Serialize)]
pub struct LinkReport {
    /// 检查过的链接数
    pub checked: usize,
    /// 跳过的外部链接数
    pub skipped: usize,
    /// 页面不存在的链接
    pub missing_pages: Vec<BrokenLink>,
    /// 页面存在但锚点不存在的链接
    pub missing_anchors: Vec<BrokenLink>,
    /// 页面存在但无法读取的链接
    pub unreadable_pages: Vec<BrokenLink>,
}

impl LinkReport {
    /// 是否所有链接都有效
    pub fn is_clean(&self) -> bool {
        self.missing_pages.is_empty()
            && self.missing_anchors.is_empty()
            && self.unreadable_pages.is_empty()
    }
}

impl DocSite {
    /// 打开文档站点
    ///
    /// # 参数
    /// * `path` - 文档输出目录或其zip压缩包
    ///
    /// # 返回值
    /// * `Result<DocSite, NavError>` - 成功返回站点实例
    pub fn open<P: AsRef<Path>>(path: P) -> Result<DocSite> {
        let path = path.as_ref();

        let site = if path.is_dir() {
            let root = if !path.join(SITE_ENTRY).is_file() && path.join("html").join(SITE_ENTRY).is_file() {
                path.join("html")
            } else {
                path.to_path_buf()
            };
            DocSite {
                backend: Backend::Directory(root),
                prefix: String::new(),
            }
        } else if path.is_file() {
            let file = File::open(path)?;
            let archive = ZipArchive::new(file)?;
            let prefix = Self::detect_archive_prefix(&archive);
            DocSite {
                backend: Backend::Archive(archive),
                prefix,
            }
        } else {
            return Err(NavError::InvalidSite(format!("路径不存在: {}", path.display())));
        };

        info!(path = %path.display(), prefix = %site.prefix, "打开文档站点");
        Ok(site)
    }

    /// 直接以指定目录作为文档根目录，不做 `html/` 子目录探测
    pub fn from_dir<P: AsRef<Path>>(root: P) -> DocSite {
        DocSite {
            backend: Backend::Directory(root.as_ref().to_path_buf()),
            prefix: String::new(),
        }
    }

    /// 在压缩包中寻找最浅的 `index.html` 所在目录
    fn detect_archive_prefix(archive: &ZipArchive<File>) -> String {
        archive
            .file_names()
            .filter(|name| *name == SITE_ENTRY || name.ends_with(&format!("/{}", SITE_ENTRY)))
            .min_by_key(|name| name.matches('/').count())
            .map(|name| name[..name.len() - SITE_ENTRY.len()].to_string())
            .unwrap_or_default()
    }

    /// 列出站点中的所有文件（相对于文档根目录）
    pub fn list_files(&mut self) -> Result<Vec<String>> {
        let mut files = match &self.backend {
            Backend::Directory(root) => {
                let mut files = Vec::new();
                collect_dir_files(root, root, &mut files)?;
                files
            }
            Backend::Archive(archive) => archive
                .file_names()
                .filter(|name| !name.ends_with('/'))
                .filter_map(|name| name.strip_prefix(self.prefix.as_str()))
                .map(|name| name.to_string())
                .collect(),
        };
        files.sort();
        Ok(files)
    }

    /// 站点中是否存在指定文件
    pub fn has_file(&self, name: &str) -> bool {
        match &self.backend {
            Backend::Directory(root) => root.join(name).is_file(),
            Backend::Archive(archive) => archive
                .index_for_name(&format!("{}{}", self.prefix, name))
                .is_some(),
        }
    }

    /// 读取指定文件的文本内容
    pub fn read_file(&mut self, name: &str) -> Result<String> {
        match &mut self.backend {
            Backend::Directory(root) => Ok(fs::read_to_string(root.join(name))?),
            Backend::Archive(archive) => {
                let mut file = archive.by_name(&format!("{}{}", self.prefix, name))?;
                let mut content = String::new();
                file.read_to_string(&mut content)?;
                Ok(content)
            }
        }
    }

    /// 读取指定文件的原始字节
    pub fn read_bytes(&mut self, name: &str) -> Result<Vec<u8>> {
        match &mut self.backend {
            Backend::Directory(root) => Ok(fs::read(root.join(name))?),
            Backend::Archive(archive) => {
                let mut file = archive.by_name(&format!("{}{}", self.prefix, name))?;
                let mut content = Vec::new();
                file.read_to_end(&mut content)?;
                Ok(content)
            }
        }
    }

    /// 读取并解析索引脚本，例如 `annotated` 对应 `annotated.js`
    pub fn load_index(&mut self, script: &str) -> Result<NavIndex> {
        let file_name = format!("{}.js", script);
        if !self.has_file(&file_name) {
            return Err(NavError::MissingIndex(file_name));
        }
        debug!(script, "读取索引脚本");
        let content = self.read_file(&file_name)?;
        NavIndex::parse_js(&content)
    }

    /// 读取延迟加载的子表脚本
    ///
    /// 脚本中声明的变量名必须与脚本名一致。
    pub fn load_script_table(&mut self, script: &str) -> Result<Vec<NavNode>> {
        let file_name = format!("{}.js", script);
        let content = match self.read_file(&file_name) {
            Ok(content) => content,
            Err(NavError::Zip(ZipError::FileNotFound)) => {
                return Err(NavError::MissingScript(file_name));
            }
            Err(NavError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(NavError::MissingScript(file_name));
            }
            Err(err) => return Err(err),
        };

        let table = NavIndex::parse_js(&content)?;
        if table.name.as_deref() != Some(script) {
            return Err(NavError::ScriptMismatch {
                expected: script.to_string(),
                found: table.name.unwrap_or_else(|| "<无>".to_string()),
            });
        }
        debug!(script, entries = table.roots.len(), "加载子表脚本");
        Ok(table.roots)
    }

    /// 展开索引中所有的延迟子表，返回展开的数量
    pub fn resolve_deferred(&mut self, index: &mut NavIndex) -> Result<usize> {
        let resolved = index.resolve_deferred_with(|script| self.load_script_table(script))?;
        info!(resolved, "延迟子表展开完成");
        Ok(resolved)
    }

    /// 按配置打开站点索引
    pub fn open_index(&mut self, config: &NavConfig) -> Result<NavIndex> {
        let mut index = self.load_index(&config.index_script)?;
        if config.resolve_deferred {
            self.resolve_deferred(&mut index)?;
        }
        Ok(index)
    }

    /// 读取并解析页面
    ///
    /// 页面不是有效的UTF-8时按替换字符解码。
    pub fn page_summary(&mut self, page: &str) -> Result<PageSummary> {
        let bytes = self.read_bytes(page)?;
        Ok(PageSummary::parse_html(&String::from_utf8_lossy(&bytes)))
    }

    /// 检查索引中的所有链接
    ///
    /// 外部链接（带协议的URL）跳过；页面不存在、锚点不存在或页面无法读取的链接进入报告。
    /// 单个页面的读取错误不会中断检查。
    pub fn check_links(&mut self, index: &NavIndex) -> Result<LinkReport> {
        let mut report = LinkReport::default();
        let mut pages: HashMap<String, PageState> = HashMap::new();

        for (qualified_name, node) in index.qualified_names() {
            let (Some(link), Some(page)) = (node.link.as_deref(), node.page()) else {
                continue;
            };
            if is_external(link) {
                report.skipped += 1;
                continue;
            }
            report.checked += 1;

            if !pages.contains_key(page) {
                let state = if !self.has_file(page) {
                    PageState::Missing
                } else {
                    match self.page_summary(page) {
                        Ok(summary) => PageState::Loaded(summary),
                        Err(err) => {
                            warn!(page, error = %err, "页面无法读取");
                            PageState::Unreadable
                        }
                    }
                };
                pages.insert(page.to_string(), state);
            }

            let broken = BrokenLink {
                qualified_name,
                link: link.to_string(),
            };
            match (pages.get(page), node.anchor()) {
                (None | Some(PageState::Missing), _) => {
                    warn!(link, "页面不存在");
                    report.missing_pages.push(broken);
                }
                (Some(PageState::Unreadable), _) => report.unreadable_pages.push(broken),
                (Some(PageState::Loaded(summary)), Some(anchor)) if !summary.has_anchor(anchor) => {
                    warn!(link, "锚点不存在");
                    report.missing_anchors.push(broken);
                }
                _ => {}
            }
        }

        Ok(report)
    }
}

/// 链接检查中缓存的页面状态
enum PageState {
    Missing,
    Unreadable,
    Loaded(PageSummary),
}

fn is_external(link: &str) -> bool {
    link.contains("://") || link.starts_with("mailto:")
}

/// 递归收集目录中的文件
fn collect_dir_files(root: &Path, dir: &Path, files: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_dir_files(root, &path, files)?;
        } else if let Ok(relative) = path.strip_prefix(root) {
            let name: Vec<String> = relative
                .components()
                .map(|part| part.as_os_str().to_string_lossy().into_owned())
                .collect();
            files.push(name.join("/"));
        }
    }
    Ok(())
}
