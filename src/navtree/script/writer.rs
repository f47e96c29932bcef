//! 导航脚本写出模块
//!
//! 按文档工具生成文件的排版写出导航索引，保证对工具生成的输入能逐字节往返。

use std::fmt::Write as _;

use crate::navtree::script::node::{NavChildren, NavIndex, NavNode};

/// 顶层条目的缩进
const ROOT_INDENT: usize = 4;
/// 每一层嵌套增加的缩进
const LEVEL_INDENT: usize = 2;

impl NavIndex {
    /// 序列化为导航脚本文本
    ///
    /// 有变量名时写出 `var NAME =\n[ ... ];`，否则只写出数组本身。
    pub fn to_js(&self) -> String {
        let mut out = String::new();
        if let Some(name) = &self.name {
            let _ = writeln!(out, "var {} =", name);
        }
        out.push_str("[\n");
        write_table(&mut out, &self.roots, ROOT_INDENT);
        out.push(']');
        if self.name.is_some() {
            out.push(';');
        }
        out
    }
}

fn write_table(out: &mut String, nodes: &[NavNode], indent: usize) {
    for (index, node) in nodes.iter().enumerate() {
        write_entry(out, node, indent);
        if index + 1 < nodes.len() {
            out.push(',');
        }
        out.push('\n');
    }
}

fn write_entry(out: &mut String, node: &NavNode, indent: usize) {
    push_indent(out, indent);
    out.push_str("[ ");
    write_string(out, &node.label);
    out.push_str(", ");
    match &node.link {
        Some(link) => write_string(out, link),
        None => out.push_str("null"),
    }
    out.push_str(", ");
    match &node.children {
        None => out.push_str("null ]"),
        Some(NavChildren::Deferred(script)) => {
            write_string(out, script);
            out.push_str(" ]");
        }
        Some(NavChildren::Inline(children)) => {
            out.push_str("[\n");
            write_table(out, children, indent + LEVEL_INDENT);
            push_indent(out, indent);
            out.push_str("] ]");
        }
    }
}

fn push_indent(out: &mut String, indent: usize) {
    out.extend(std::iter::repeat_n(' ', indent));
}

/// 写出带双引号的字符串字面量
fn write_string(out: &mut String, value: &str) {
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
