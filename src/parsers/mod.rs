//! 解析器模块
//!
//! - `markdown`: Markdown 解析边界（外部解析器 → 封闭节点树）
//! - `html`: 内嵌 HTML 的 DOM 工具
//! - `path_rewriter`: 输出的相对路径重写

pub mod html;
pub mod markdown;
pub mod path_rewriter;

pub use markdown::{parse_markdown, Node, NodeKind, Span};
pub use path_rewriter::{rewrite_relative_paths, simplify_relative_path};
