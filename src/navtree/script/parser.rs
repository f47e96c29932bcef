//! 导航脚本解析器模块
//!
//! 从读取器拉取事件，用一个帧栈把嵌套数组还原为导航树。
//! 每个条目必须是 `[标签, 链接或null, 子表或脚本名或null]` 三元组。

use std::fs;
use std::path::Path;

use crate::navtree::error::{NavError, Result};
use crate::navtree::script::lexer::{syntax_error, Event, Position, ScriptReader};
use crate::navtree::script::node::{NavChildren, NavIndex, NavNode, MAX_DEPTH};

/// 数组的最大嵌套层数：每层节点占用条目和子表两层数组
const MAX_NESTING: usize = 2 * MAX_DEPTH;

/// 条目中已读取的字段
enum Field {
    Str(String),
    Null,
    Table(Vec<NavNode>),
}

enum FrameKind {
    /// 条目列表
    Table(Vec<NavNode>),
    /// 单个条目的字段
    Entry(Vec<Field>),
}

/// 解析栈中的一帧，对应一个尚未闭合的 `[`
struct Frame {
    kind: FrameKind,
    expect_comma: bool,
    start: Position,
}

impl Frame {
    fn table(start: Position) -> Self {
        Self {
            kind: FrameKind::Table(Vec::new()),
            expect_comma: false,
            start,
        }
    }

    fn entry(start: Position) -> Self {
        Self {
            kind: FrameKind::Entry(Vec::new()),
            expect_comma: false,
            start,
        }
    }

    /// 在当前帧中开始一个新值前的检查
    fn begin_value(&self, position: Position) -> Result<()> {
        if self.expect_comma {
            return Err(syntax_error(position, "缺少 ','"));
        }
        if let FrameKind::Entry(fields) = &self.kind {
            if fields.len() >= 3 {
                return Err(invalid_entry(self.start, "条目超过三个字段"));
            }
        }
        Ok(())
    }

    fn push_field(&mut self, field: Field, position: Position) -> Result<()> {
        self.begin_value(position)?;
        match &mut self.kind {
            FrameKind::Entry(fields) => fields.push(field),
            FrameKind::Table(_) => {
                return Err(invalid_entry(position, "索引表中只能包含条目数组"));
            }
        }
        self.expect_comma = true;
        Ok(())
    }
}

fn invalid_entry(position: Position, message: impl Into<String>) -> NavError {
    NavError::InvalidEntry {
        line: position.line,
        column: position.column,
        message: message.into(),
    }
}

/// 把三个字段组装成节点
fn build_node(fields: Vec<Field>, start: Position) -> Result<NavNode> {
    if fields.len() != 3 {
        return Err(invalid_entry(
            start,
            format!("条目应有3个字段，实际为{}个", fields.len()),
        ));
    }

    let mut fields = fields.into_iter();
    let (Some(label), Some(link), Some(children)) = (fields.next(), fields.next(), fields.next())
    else {
        return Err(invalid_entry(start, "条目字段不完整"));
    };

    let label = match label {
        Field::Str(label) => label,
        _ => return Err(invalid_entry(start, "第一个字段必须是字符串标签")),
    };

    let link = match link {
        Field::Str(link) => Some(link),
        Field::Null => None,
        Field::Table(_) => return Err(invalid_entry(start, "第二个字段必须是链接字符串或null")),
    };

    let children = match children {
        Field::Null => None,
        Field::Str(script) => Some(NavChildren::Deferred(script)),
        Field::Table(nodes) => Some(NavChildren::Inline(nodes)),
    };

    Ok(NavNode {
        label,
        link,
        children,
    })
}

impl NavIndex {
    /// 解析导航脚本内容
    ///
    /// # 参数
    /// * `source` - 脚本文本，例如 `var annotated = [ ... ];`
    ///
    /// # 返回值
    /// * `Result<NavIndex, NavError>` - 解析后的导航索引
    ///
    /// # 示例
    ///
    /// ```rust
    /// use navforge::NavIndex;
    ///
    /// let index = NavIndex::parse_js(
    ///     r#"var annotated = [ [ "App", null, [ [ "Biodiverse", "classApp_1_1Biodiverse.html", null ] ] ] ];"#,
    /// )?;
    /// assert_eq!(index.roots()[0].child_nodes()[0].label, "Biodiverse");
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn parse_js(source: &str) -> Result<NavIndex> {
        let mut reader = ScriptReader::from_str(source);
        let (mut event, mut position) = reader.read_event()?;

        let mut name = None;
        if let Event::Keyword(_) = event {
            let (ident, ident_position) = reader.read_event()?;
            let Event::Ident(ident) = ident else {
                return Err(syntax_error(ident_position, "期望变量名"));
            };
            let (assign, assign_position) = reader.read_event()?;
            if assign != Event::Assign {
                return Err(syntax_error(assign_position, "期望 '='"));
            }
            name = Some(ident);
            (event, position) = reader.read_event()?;
        }

        if event != Event::ArrayStart {
            return Err(syntax_error(position, "期望 '['"));
        }
        let roots = Self::parse_table(&mut reader, position)?;

        let (mut event, mut position) = reader.read_event()?;
        if event == Event::Semicolon {
            (event, position) = reader.read_event()?;
        }
        if event != Event::Eof {
            return Err(syntax_error(position, "索引表之后存在多余内容"));
        }

        Ok(NavIndex { name, roots })
    }

    /// 读取并解析脚本文件
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<NavIndex> {
        let source = fs::read_to_string(path)?;
        Self::parse_js(&source)
    }

    /// 解析一个完整的条目表，调用时开头的 `[` 已被读取
    fn parse_table(reader: &mut ScriptReader<'_>, start: Position) -> Result<Vec<NavNode>> {
        let mut stack = vec![Frame::table(start)];

        loop {
            let (event, position) = reader.read_event()?;
            let nesting = stack.len();
            let Some(top) = stack.last_mut() else {
                return Err(syntax_error(position, "解析栈为空"));
            };

            match event {
                Event::ArrayStart => {
                    top.begin_value(position)?;
                    if nesting >= MAX_NESTING {
                        return Err(syntax_error(
                            position,
                            format!("数组嵌套超过{}层", MAX_NESTING),
                        ));
                    }
                    let frame = match &top.kind {
                        FrameKind::Table(_) => Frame::entry(position),
                        FrameKind::Entry(fields) if fields.len() == 2 => Frame::table(position),
                        FrameKind::Entry(_) => {
                            return Err(invalid_entry(position, "只有第三个字段可以是子表"));
                        }
                    };
                    stack.push(frame);
                }
                Event::Str(value) => top.push_field(Field::Str(value), position)?,
                Event::Null => top.push_field(Field::Null, position)?,
                Event::Comma => {
                    if !top.expect_comma {
                        return Err(syntax_error(position, "多余的 ','"));
                    }
                    top.expect_comma = false;
                }
                Event::ArrayEnd => {
                    let Some(frame) = stack.pop() else {
                        return Err(syntax_error(position, "多余的 ']'"));
                    };
                    match frame.kind {
                        FrameKind::Table(nodes) => match stack.last_mut() {
                            None => return Ok(nodes),
                            Some(parent) => {
                                let FrameKind::Entry(fields) = &mut parent.kind else {
                                    return Err(invalid_entry(frame.start, "子表必须位于条目中"));
                                };
                                fields.push(Field::Table(nodes));
                                parent.expect_comma = true;
                            }
                        },
                        FrameKind::Entry(fields) => {
                            let node = build_node(fields, frame.start)?;
                            let Some(Frame {
                                kind: FrameKind::Table(nodes),
                                expect_comma,
                                ..
                            }) = stack.last_mut()
                            else {
                                return Err(invalid_entry(frame.start, "条目必须位于索引表中"));
                            };
                            nodes.push(node);
                            *expect_comma = true;
                        }
                    }
                }
                Event::Eof => {
                    return Err(syntax_error(
                        position,
                        format!("第{}行第{}列的 '[' 未闭合", top.start.line, top.start.column),
                    ));
                }
                other => {
                    return Err(syntax_error(position, format!("意外的 {:?}", other)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = include_str!("../../../tests/fixtures/annotated.js");

    #[test]
    fn test_grouping_node_with_single_child() {
        let index = NavIndex::parse_js(
            r#"[["App", null, [["Biodiverse", "classApp_1_1Biodiverse.html", null]]]]"#,
        )
        .unwrap();

        assert_eq!(index.name, None);
        assert_eq!(index.roots().len(), 1);
        let app = &index.roots()[0];
        assert_eq!(app.label, "App");
        assert!(app.is_grouping());
        assert!(!app.is_leaf());
        assert_eq!(app.child_nodes().len(), 1);

        let child = &app.child_nodes()[0];
        assert_eq!(child.label, "Biodiverse");
        assert_eq!(child.link.as_deref(), Some("classApp_1_1Biodiverse.html"));
        assert!(child.children.is_none());
    }

    #[test]
    fn test_parse_fixture() {
        let index = NavIndex::parse_js(FIXTURE).unwrap();
        assert_eq!(index.name.as_deref(), Some("annotated"));
        assert_eq!(index.roots().len(), 3);
        assert_eq!(index.roots()[2].label, "main");
        assert_eq!(index.node_count(), 72);

        let tabs = index.find_by_qualified_name("Biodiverse::GUI::Tabs").unwrap();
        assert_eq!(tabs.child_nodes().len(), 9);

        let spatial = index.find_by_qualified_name("Biodiverse::GUI::Tabs::Spatial").unwrap();
        assert_eq!(
            spatial.deferred_script(),
            Some("classBiodiverse_1_1GUI_1_1Tabs_1_1Spatial")
        );

        let exception = index.find_by_qualified_name("Biodiverse::Exception").unwrap();
        assert!(exception.children.is_none());
    }

    #[test]
    fn test_trailing_commas_are_tolerated() {
        let index = NavIndex::parse_js(r#"var x = [ [ "a", "a.html", null, ], ];"#).unwrap();
        assert_eq!(index.roots().len(), 1);
    }

    #[test]
    fn test_empty_label_is_accepted_by_parser() {
        let index = NavIndex::parse_js(r#"[ [ "", null, null ] ]"#).unwrap();
        assert_eq!(index.roots()[0].label, "");
    }

    #[test]
    fn test_wrong_arity() {
        let err = NavIndex::parse_js(r#"[ [ "a", null ] ]"#).unwrap_err();
        assert!(matches!(err, NavError::InvalidEntry { line: 1, column: 3, .. }));

        let err = NavIndex::parse_js(r#"[ [ "a", null, null, null ] ]"#).unwrap_err();
        assert!(matches!(err, NavError::InvalidEntry { .. }));
    }

    #[test]
    fn test_wrong_field_types() {
        assert!(matches!(
            NavIndex::parse_js(r#"[ [ null, "a.html", null ] ]"#),
            Err(NavError::InvalidEntry { .. })
        ));
        assert!(matches!(
            NavIndex::parse_js(r#"[ [ "a", [], null ] ]"#),
            Err(NavError::InvalidEntry { .. })
        ));
        assert!(matches!(
            NavIndex::parse_js(r#"[ "a", null, null ]"#),
            Err(NavError::InvalidEntry { .. })
        ));
    }

    #[test]
    fn test_missing_comma() {
        let err = NavIndex::parse_js(r#"[ [ "a" null null ] ]"#).unwrap_err();
        assert!(matches!(err, NavError::Syntax { column: 9, .. }));
    }

    #[test]
    fn test_unclosed_table() {
        let err = NavIndex::parse_js("var x = [\n  [ \"a\", null, null ]\n").unwrap_err();
        assert!(matches!(err, NavError::Syntax { line: 3, .. }));
    }

    #[test]
    fn test_trailing_content() {
        let err = NavIndex::parse_js("var x = [];\nvar y = [];").unwrap_err();
        assert!(matches!(err, NavError::Syntax { line: 2, column: 1, .. }));
    }

    /// 生成嵌套 `depth` 层节点的脚本
    fn nested_script(depth: usize) -> String {
        let mut source = String::new();
        for _ in 0..depth {
            source.push_str(r#"[ [ "a", null, "#);
        }
        source.push_str("null");
        for _ in 0..depth {
            source.push_str(" ] ]");
        }
        source
    }

    #[test]
    fn test_nesting_limit() {
        let index = NavIndex::parse_js(&nested_script(MAX_DEPTH)).unwrap();
        assert_eq!(index.depth(), MAX_DEPTH);

        let err = NavIndex::parse_js(&nested_script(MAX_DEPTH + 1)).unwrap_err();
        assert!(matches!(err, NavError::Syntax { line: 1, .. }));

        let err = NavIndex::parse_js(&nested_script(5_000)).unwrap_err();
        assert!(matches!(err, NavError::Syntax { .. }));
    }

    #[test]
    fn test_missing_assignment() {
        assert!(matches!(
            NavIndex::parse_js("var x [];"),
            Err(NavError::Syntax { .. })
        ));
    }
}
