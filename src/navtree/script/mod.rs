//! 导航脚本模块
//!
//! 文档工具为浏览器端的导航树生成一组脚本，每个脚本声明一个嵌套数组变量：
//! `var annotated = [ [ "标签", "链接或null", 子表 ], ... ];`。
//! 此模块负责读取、写出、遍历和显示这些脚本。

pub mod lexer;
pub mod node;
pub mod parser;
pub mod view;
pub mod writer;

pub use lexer::{Event, Position, ScriptReader};
pub use node::{NavChildren, NavEntry, NavIndex, NavNode, Walk, MAX_DEPTH, QUALIFIED_SEPARATOR};
pub use view::{IndexStatistics, TreeStyle, TreeView};
