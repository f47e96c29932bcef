//! 导出模块
//!
//! 把导航索引转换为其他格式：原始脚本、JSON、YAML 和 XML 大纲。
//! JSON、YAML 和 XML 也可以重新导入。

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::Writer;

use crate::navtree::error::{NavError, Result};
use crate::navtree::script::{NavChildren, NavIndex, NavNode, MAX_DEPTH};

/// 导出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// 文档工具的导航脚本
    Js,
    Json,
    Yaml,
    /// `<navindex>` / `<node>` 大纲
    Xml,
}

impl ExportFormat {
    /// 对应的文件扩展名
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Js => "js",
            ExportFormat::Json => "json",
            ExportFormat::Yaml => "yaml",
            ExportFormat::Xml => "xml",
        }
    }
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = NavError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "js" => Ok(ExportFormat::Js),
            "json" => Ok(ExportFormat::Json),
            "yaml" | "yml" => Ok(ExportFormat::Yaml),
            "xml" => Ok(ExportFormat::Xml),
            other => Err(NavError::ExportError(format!("不支持的导出格式: {}", other))),
        }
    }
}

impl NavIndex {
    /// 按指定格式导出
    pub fn export(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Js => Ok(self.to_js()),
            ExportFormat::Json => self.to_json(),
            ExportFormat::Yaml => self.to_yaml(),
            ExportFormat::Xml => self.to_xml(),
        }
    }

    /// 按指定格式导入，脚本格式等同于 `parse_js`
    pub fn import(content: &str, format: ExportFormat) -> Result<NavIndex> {
        match format {
            ExportFormat::Js => Self::parse_js(content),
            ExportFormat::Json => Self::from_json(content),
            ExportFormat::Yaml => Self::from_yaml(content),
            ExportFormat::Xml => Self::from_xml(content),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(content: &str) -> Result<NavIndex> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yml::to_string(self).map_err(|e| NavError::ExportError(format!("YAML序列化失败: {}", e)))
    }

    pub fn from_yaml(content: &str) -> Result<NavIndex> {
        serde_yml::from_str(content).map_err(|e| NavError::ImportError(format!("YAML格式错误: {}", e)))
    }

    /// 导出为XML大纲
    ///
    /// 分组节点和带页面的节点都写成 `<node>`，链接写在 `href`，
    /// 延迟子表写在 `script`；有内联子表的节点写成非空元素。
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut root = BytesStart::new("navindex");
        if let Some(name) = &self.name {
            root.push_attribute(("name", name.as_str()));
        }
        writer.write_event(Event::Start(root))?;
        for node in &self.roots {
            write_xml_node(&mut writer, node)?;
        }
        writer.write_event(Event::End(BytesEnd::new("navindex")))?;

        String::from_utf8(writer.into_inner())
            .map_err(|e| NavError::ExportError(format!("XML不是有效的UTF-8: {}", e)))
    }

    /// 从XML大纲导入
    pub fn from_xml(xml_content: &str) -> Result<NavIndex> {
        let mut reader = Reader::from_str(xml_content);
        reader.config_mut().trim_text(true);

        let mut name = None;
        let mut seen_root = false;
        let mut roots = Vec::new();
        let mut open_nodes: Vec<NavNode> = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => match e.local_name().as_ref() {
                    b"navindex" => {
                        name = Self::parse_xml_attribute(e, b"name")?;
                        seen_root = true;
                    }
                    b"node" => {
                        check_xml_depth(&open_nodes)?;
                        let mut node = Self::parse_xml_node(e)?;
                        if node.children.is_some() {
                            return Err(NavError::ImportError(format!(
                                "节点 '{}' 不能同时有 script 属性和内联子节点",
                                node.label
                            )));
                        }
                        node.children = Some(NavChildren::Inline(Vec::new()));
                        open_nodes.push(node);
                    }
                    other => {
                        return Err(NavError::ImportError(format!(
                            "未知元素: {}",
                            String::from_utf8_lossy(other)
                        )));
                    }
                },
                Event::Empty(ref e) => match e.local_name().as_ref() {
                    b"navindex" => {
                        name = Self::parse_xml_attribute(e, b"name")?;
                        seen_root = true;
                    }
                    b"node" => {
                        check_xml_depth(&open_nodes)?;
                        let node = Self::parse_xml_node(e)?;
                        attach_node(&mut open_nodes, &mut roots, node);
                    }
                    other => {
                        return Err(NavError::ImportError(format!(
                            "未知元素: {}",
                            String::from_utf8_lossy(other)
                        )));
                    }
                },
                Event::End(ref e) => {
                    if e.local_name().as_ref() == b"node" {
                        let node = open_nodes
                            .pop()
                            .ok_or_else(|| NavError::ImportError("多余的 </node>".to_string()))?;
                        attach_node(&mut open_nodes, &mut roots, node);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !seen_root {
            return Err(NavError::ImportError("缺少 <navindex> 根元素".to_string()));
        }
        if !open_nodes.is_empty() {
            return Err(NavError::ImportError("存在未闭合的 <node>".to_string()));
        }

        Ok(NavIndex { name, roots })
    }

    /// 读取单个属性值
    fn parse_xml_attribute(e: &BytesStart, key: &[u8]) -> Result<Option<String>> {
        for attr_result in e.attributes() {
            let attr = attr_result.map_err(|err| NavError::XmlError(quick_xml::Error::InvalidAttr(err)))?;
            if attr.key.local_name().as_ref() == key {
                return Ok(Some(attr.unescape_value()?.into_owned()));
            }
        }
        Ok(None)
    }

    /// 解析node元素的属性
    fn parse_xml_node(e: &BytesStart) -> Result<NavNode> {
        let mut label = None;
        let mut link = None;
        let mut script = None;

        for attr_result in e.attributes() {
            let attr = attr_result.map_err(|err| NavError::XmlError(quick_xml::Error::InvalidAttr(err)))?;
            let value = attr.unescape_value()?.into_owned();
            match attr.key.local_name().as_ref() {
                b"label" => label = Some(value),
                b"href" => link = Some(value),
                b"script" => script = Some(value),
                _ => {}
            }
        }

        let label = label.ok_or_else(|| NavError::ImportError("node 缺少 label 属性".to_string()))?;
        Ok(NavNode {
            label,
            link,
            children: script.map(NavChildren::Deferred),
        })
    }
}

fn check_xml_depth(open_nodes: &[NavNode]) -> Result<()> {
    if open_nodes.len() >= MAX_DEPTH {
        return Err(NavError::ImportError(format!("node 嵌套超过{}层", MAX_DEPTH)));
    }
    Ok(())
}

fn attach_node(open_nodes: &mut [NavNode], roots: &mut Vec<NavNode>, node: NavNode) {
    match open_nodes.last_mut() {
        Some(NavNode {
            children: Some(NavChildren::Inline(children)),
            ..
        }) => children.push(node),
        _ => roots.push(node),
    }
}

fn write_xml_node(writer: &mut Writer<Vec<u8>>, node: &NavNode) -> Result<()> {
    let mut element = BytesStart::new("node");
    element.push_attribute(("label", node.label.as_str()));
    if let Some(link) = &node.link {
        element.push_attribute(("href", link.as_str()));
    }

    match &node.children {
        Some(NavChildren::Inline(children)) => {
            writer.write_event(Event::Start(element))?;
            for child in children {
                write_xml_node(writer, child)?;
            }
            writer.write_event(Event::End(BytesEnd::new("node")))?;
        }
        Some(NavChildren::Deferred(script)) => {
            element.push_attribute(("script", script.as_str()));
            writer.write_event(Event::Empty(element))?;
        }
        None => {
            writer.write_event(Event::Empty(element))?;
        }
    }
    Ok(())
}
