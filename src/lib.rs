//! # markdown-translator
//!
//! 从 Markdown 文档（含内嵌 HTML 与 YAML Front Matter）中抽取可翻译
//! 文本，之后把译文注入回原文档，同时逐字节保留所有不属于可翻译内容
//! 的格式：缩进、换行、原始标记、代码块、表格语法。
//!
//! ## 模块组织
//!
//! - `renderer` - 区间保持的树遍历转换引擎（核心）
//! - `parsers` - Markdown/HTML 解析边界与路径重写
//! - `catalog` - gettext 风格的 .po/.pot 目录读写
//! - `element` - 元素类型与上下文栈
//! - `options` - 渲染器配置
//! - `error` - 错误类型
//!
//! ## 基本用法
//!
//! ```
//! use markdown_translator::{extract_units, RendererOptions};
//!
//! let options = RendererOptions::default();
//! let units = extract_units("# Heading 1", None, &options).unwrap();
//! assert_eq!(units[0].text, "Heading 1");
//! ```

pub mod catalog;
pub mod element;
pub mod error;
pub mod options;
pub mod parsers;
pub mod renderer;

pub use element::ElementType;
pub use error::{RenderError, RenderResult};
pub use options::RendererOptions;
pub use renderer::{LookupFn, TranslationTally, TranslationUnit};

use parsers::markdown::parse_markdown;
use parsers::path_rewriter::rewrite_relative_paths;
use renderer::{TransformRenderer, TransformStrategy};

/// 回显：原样重建文档
///
/// 身份策略下的遍历必须逐字节复现输入，用于校验调度器
/// 没有触碰任何不该触碰的字节。
pub fn echo(markdown: &str, options: &RendererOptions) -> RenderResult<String> {
    let tree = parse_markdown(markdown, options);
    let renderer =
        TransformRenderer::new(markdown, options, TransformStrategy::Echo, None, None, None)?;
    let (output, _) = renderer.render(&tree)?;
    Ok(output)
}

/// 抽取：收集文档中全部翻译单元（文档保持不变）
///
/// 单元按文档顺序返回；原文相同但语境不同的单元不会被合并。
pub fn extract_units(
    markdown: &str,
    file_name: Option<&str>,
    options: &RendererOptions,
) -> RenderResult<Vec<TranslationUnit>> {
    let tree = parse_markdown(markdown, options);
    let renderer = TransformRenderer::new(
        markdown,
        options,
        TransformStrategy::Extract { units: Vec::new() },
        file_name,
        None,
        None,
    )?;
    let (_, strategy) = renderer.render(&tree)?;
    match strategy {
        TransformStrategy::Extract { units } => Ok(units),
        _ => unreachable!("策略在遍历期间不会改变"),
    }
}

/// 翻译：对每个单元调用 `lookup` 注入译文
///
/// `lookup` 返回 `None` 或空串表示缺少译文，对应单元渲染为空并记入
/// 统计的缺失集合；想要回退到原文的调用方在 `lookup` 内自行返回原文。
/// 输出在遍历结束后再做一次相对路径重写。
pub fn translate(
    markdown: &str,
    lookup: &LookupFn,
    file_name: Option<&str>,
    path_to_source: Option<&str>,
    locale: Option<&str>,
    options: &RendererOptions,
) -> RenderResult<(String, TranslationTally)> {
    let tree = parse_markdown(markdown, options);
    let renderer = TransformRenderer::new(
        markdown,
        options,
        TransformStrategy::Substitute {
            lookup,
            tally: TranslationTally::default(),
        },
        file_name,
        path_to_source,
        locale,
    )?;
    let (output, strategy) = renderer.render(&tree)?;
    let output = rewrite_relative_paths(&output, options);
    match strategy {
        TransformStrategy::Substitute { tally, .. } => Ok((output, tally)),
        _ => unreachable!("策略在遍历期间不会改变"),
    }
}
