//! 导航脚本的词法读取器
//!
//! 以拉取方式逐个读出脚本中的事件（括号、逗号、字符串、`null` 等），
//! 跳过空白和注释，并记录每个事件的行列位置。

use std::iter::Peekable;
use std::str::Chars;

use crate::navtree::error::{NavError, Result};

/// 源文件中的位置（行列均从1开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Default for Position {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

/// 读取器产生的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// `var` / `let` / `const`
    Keyword(String),
    /// 标识符
    Ident(String),
    /// `=`
    Assign,
    /// `[`
    ArrayStart,
    /// `]`
    ArrayEnd,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// 字符串字面量（已反转义）
    Str(String),
    /// `null`
    Null,
    /// 输入结束
    Eof,
}

/// 构造语法错误
pub(crate) fn syntax_error(position: Position, message: impl Into<String>) -> NavError {
    NavError::Syntax {
        line: position.line,
        column: position.column,
        message: message.into(),
    }
}

/// 导航脚本读取器
pub struct ScriptReader<'a> {
    chars: Peekable<Chars<'a>>,
    position: Position,
}

impl<'a> ScriptReader<'a> {
    /// 从字符串创建读取器，与 `quick_xml::Reader::from_str` 同名
    ///
    /// 读取器借用输入，无法实现 `FromStr`。
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            position: Position::default(),
        }
    }

    /// 当前读取位置
    pub fn position(&self) -> Position {
        self.position
    }

    /// 读取下一个事件及其起始位置
    pub fn read_event(&mut self) -> Result<(Event, Position)> {
        self.skip_trivia()?;
        let start = self.position;

        let Some(ch) = self.bump() else {
            return Ok((Event::Eof, start));
        };

        let event = match ch {
            '[' => Event::ArrayStart,
            ']' => Event::ArrayEnd,
            ',' => Event::Comma,
            ';' => Event::Semicolon,
            '=' => Event::Assign,
            '"' | '\'' => Event::Str(self.read_string(ch, start)?),
            c if is_ident_start(c) => {
                let word = self.read_word(c);
                match word.as_str() {
                    "null" => Event::Null,
                    "var" | "let" | "const" => Event::Keyword(word),
                    _ => Event::Ident(word),
                }
            }
            other => {
                return Err(syntax_error(start, format!("意外的字符 '{}'", other)));
            }
        };

        Ok((event, start))
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.position.line += 1;
            self.position.column = 1;
        } else {
            self.position.column += 1;
        }
        Some(ch)
    }

    /// 跳过空白、BOM 和注释
    fn skip_trivia(&mut self) -> Result<()> {
        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() || ch == '\u{feff}' {
                self.bump();
                continue;
            }
            if ch != '/' {
                break;
            }

            let start = self.position;
            self.bump();
            match self.bump() {
                Some('/') => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                Some('*') => {
                    let mut closed = false;
                    let mut prev = '\0';
                    while let Some(c) = self.bump() {
                        if prev == '*' && c == '/' {
                            closed = true;
                            break;
                        }
                        prev = c;
                    }
                    if !closed {
                        return Err(syntax_error(start, "未闭合的块注释"));
                    }
                }
                _ => return Err(syntax_error(start, "意外的字符 '/'")),
            }
        }
        Ok(())
    }

    fn read_word(&mut self, first: char) -> String {
        let mut word = String::from(first);
        while let Some(&c) = self.chars.peek() {
            if !is_ident_continue(c) {
                break;
            }
            word.push(c);
            self.bump();
        }
        word
    }

    fn read_string(&mut self, quote: char, start: Position) -> Result<String> {
        let mut value = String::new();
        loop {
            let escape_at = self.position;
            match self.bump() {
                None | Some('\n') => return Err(syntax_error(start, "未闭合的字符串")),
                Some(c) if c == quote => return Ok(value),
                Some('\\') => match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('r') => value.push('\r'),
                    Some('t') => value.push('\t'),
                    Some('b') => value.push('\u{0008}'),
                    Some('f') => value.push('\u{000c}'),
                    Some('0') => value.push('\0'),
                    Some('\n') => {}
                    Some('u') => value.push(self.read_unicode_escape(escape_at)?),
                    Some(c) => value.push(c),
                    None => return Err(syntax_error(start, "未闭合的字符串")),
                },
                Some(c) => value.push(c),
            }
        }
    }

    fn read_hex4(&mut self, escape_at: Position) -> Result<u32> {
        let mut code = 0;
        for _ in 0..4 {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| syntax_error(escape_at, "无效的 \\u 转义"))?;
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn read_unicode_escape(&mut self, escape_at: Position) -> Result<char> {
        let high = self.read_hex4(escape_at)?;
        if !(0xD800..0xDC00).contains(&high) {
            return char::from_u32(high).ok_or_else(|| syntax_error(escape_at, "无效的 \\u 转义"));
        }

        // 代理对：后面必须紧跟低位 \uDC00..\uDFFF
        if self.bump() != Some('\\') || self.bump() != Some('u') {
            return Err(syntax_error(escape_at, "缺少低位代理项"));
        }
        let low = self.read_hex4(escape_at)?;
        if !(0xDC00..0xE000).contains(&low) {
            return Err(syntax_error(escape_at, "无效的低位代理项"));
        }
        let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
        char::from_u32(code).ok_or_else(|| syntax_error(escape_at, "无效的 \\u 转义"))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}
