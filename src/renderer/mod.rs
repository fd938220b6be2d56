//! 区间保持的树遍历转换引擎
//!
//! 渲染器按文档顺序访问解析树，对每个节点判定其渲染文本是否构成
//! 翻译单元：要么记录单元（抽取），要么用外部译文原地替换（翻译），
//! 要么原样回显（校验）。未被触碰的原文字节经由区间游标逐字节流入
//! 输出，保证缩进、换行、原始标记、代码块等全部逐字节保留。
//!
//! 模块组织：
//! - `cursor`: 区间游标（已写出偏移跟踪）
//! - `strategy`: 转换策略与翻译单元/统计类型
//! - `engine`: 块级调度与内联分组策略
//! - `front_matter`: YAML Front Matter 处理
//! - `html`: 内嵌 HTML 子遍历

pub mod cursor;
pub mod strategy;

mod engine;
mod front_matter;
mod html;

use regex::RegexBuilder;

use crate::element::{ContextStack, ElementType};
use crate::error::RenderResult;
use crate::options::RendererOptions;
use crate::parsers::markdown::Node;

use cursor::SpanCursor;
pub use strategy::{LookupFn, TransformStrategy, TranslationTally, TranslationUnit};

/// 一次遍历的渲染器实例
///
/// 原文在遍历生命周期内只读借用；游标与上下文栈由该实例独占，
/// 不跨遍历共享。并发处理多个文档时各自创建实例即可，
/// `RendererOptions` 可以只读共享。
pub struct TransformRenderer<'a> {
    doc: &'a str,
    options: &'a RendererOptions,
    strategy: TransformStrategy<'a>,
    file_name: Option<&'a str>,
    path_to_source: Option<&'a str>,
    locale: Option<&'a str>,
    cursor: SpanCursor,
    output: String,
    context: ContextStack,
    only_patterns: Vec<regex::Regex>,
    ignore_patterns: Vec<regex::Regex>,
    /// 独立处理原始行模式；引用块内强制关闭
    raw_lines_independent: bool,
    /// 译文中的换行强制替换为 `<br />`（表格/标题内启用）
    force_newline_as_html: bool,
}

impl<'a> TransformRenderer<'a> {
    /// 创建渲染器并编译过滤模式
    pub fn new(
        doc: &'a str,
        options: &'a RendererOptions,
        strategy: TransformStrategy<'a>,
        file_name: Option<&'a str>,
        path_to_source: Option<&'a str>,
        locale: Option<&'a str>,
    ) -> RenderResult<Self> {
        let compile = |patterns: &[String]| -> RenderResult<Vec<regex::Regex>> {
            patterns
                .iter()
                .map(|p| {
                    RegexBuilder::new(p)
                        .case_insensitive(true)
                        .dot_matches_new_line(true)
                        .build()
                        .map_err(Into::into)
                })
                .collect()
        };

        Ok(TransformRenderer {
            doc,
            options,
            strategy,
            file_name,
            path_to_source,
            locale,
            cursor: SpanCursor::new(doc.len()),
            output: String::with_capacity(doc.len()),
            context: ContextStack::new(),
            only_patterns: compile(&options.only_patterns)?,
            ignore_patterns: compile(&options.ignore_patterns)?,
            raw_lines_independent: options.process_raw_lines_independent,
            force_newline_as_html: false,
        })
    }

    /// 遍历整棵树，返回输出文本与（携带结果的）策略
    pub fn render(mut self, tree: &Node) -> RenderResult<(String, TransformStrategy<'a>)> {
        self.visit(tree)?;
        debug_assert!(self.context.is_empty(), "context stack must be balanced");
        Ok((self.output, self.strategy))
    }

    // ------------------------------------------------------------------
    // 游标包装：所有输出要么来自原文切片，要么来自译文
    // ------------------------------------------------------------------

    fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    /// 取出游标处接下来的 `length` 字节（拷贝，供转换使用）
    fn take(&mut self, length: usize) -> RenderResult<String> {
        let range = self.cursor.take(length)?;
        Ok(self.doc[range].to_string())
    }

    /// 前进到 `offset`，途经字节逐字节写出
    fn move_to(&mut self, offset: usize) -> RenderResult<()> {
        if let Some(range) = self.cursor.move_to(offset)? {
            self.output.push_str(&self.doc[range]);
        }
        Ok(())
    }

    /// 前进到 `offset`，不产生输出（该区间已被重新合成）
    fn skip_to(&mut self, offset: usize) -> RenderResult<()> {
        self.cursor.skip_to(offset)
    }

    /// 写出文档剩余部分（仅文档根结束时调用一次）
    fn flush(&mut self) -> RenderResult<()> {
        if let Some(range) = self.cursor.flush()? {
            self.output.push_str(&self.doc[range]);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // 上下文与单元构造
    // ------------------------------------------------------------------

    /// 入栈一个元素类型，执行 `f`，并在所有退出路径上出栈
    fn with_context<R>(
        &mut self,
        element: Option<ElementType>,
        f: impl FnOnce(&mut Self) -> RenderResult<R>,
    ) -> RenderResult<R> {
        self.context.push(element);
        let result = f(self);
        self.context.pop();
        result
    }

    /// `offset` 处的 1 起始行号（统计之前的换行数）
    fn line_position(&self, offset: usize) -> usize {
        let end = (offset + 1).min(self.doc.len());
        self.doc.as_bytes()[..end]
            .iter()
            .filter(|&&b| b == b'\n')
            .count()
            + 1
    }

    fn unit(&self, text: &str, offset: usize, is_structural: bool) -> TranslationUnit {
        TranslationUnit {
            text: text.to_string(),
            context: self.context.peek().map(str::to_string),
            reference_file: self.file_name.map(str::to_string),
            reference_line: self.line_position(offset),
            is_structural,
        }
    }

    // ------------------------------------------------------------------
    // 过滤与转换入口
    // ------------------------------------------------------------------

    /// 字符串过滤：纯空白与 `&nbsp;` 跳过；包含模式非空时必须命中
    /// 其一；忽略模式命中则跳过（忽略优先于包含）。
    fn should_transform(&self, s: &str) -> bool {
        if s == "&nbsp;" {
            return false;
        }
        if !self.only_patterns.is_empty() && !self.only_patterns.iter().any(|p| p.is_match(s)) {
            return false;
        }
        if self.ignore_patterns.iter().any(|p| p.is_match(s)) {
            return false;
        }
        true
    }

    /// 过滤后调用策略；被过滤的字符串原样返回
    ///
    /// 返回 `None` 仅出现在替换策略查不到译文时。
    fn check_transform(&mut self, s: &str, offset: usize, is_structural: bool) -> Option<String> {
        if s.trim().is_empty() {
            return Some(s.to_string());
        }
        if !self.should_transform(s) {
            return Some(s.to_string());
        }
        self.transform_direct(s, offset, is_structural)
    }

    /// 绕过字符串过滤直接调用策略（内嵌 HTML 子遍历按整块判定过滤）
    fn transform_direct(&mut self, s: &str, offset: usize, is_structural: bool) -> Option<String> {
        let unit = self.unit(s, offset, is_structural);
        self.strategy.transform(unit, self.options)
    }

    /// 译文中的换行替换为 `<br />`
    fn replace_newlines_as_html(s: &str) -> String {
        s.replace("\r\n", "\n").replace('\r', "\n").replace('\n', "<br />")
    }
}
