//! Markdown 解析边界
//!
//! 外部解析器（pulldown-cmark）在这里被映射为一个封闭的节点树：
//! 每个节点携带指向原文的字节区间和子节点列表。渲染引擎只认识
//! 这个封闭集合，解析器的事件类型不会泄漏到遍历逻辑中。
//!
//! 解析器保证：容器区间包含全部后代区间，兄弟区间互不重叠。
//! 渲染器从不依据节点内容重新排版，所有输出字节都来自原文切片。

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, LinkType, Options, Parser, Tag};

use crate::options::RendererOptions;

/// 原文中的字节区间（end 为开区间）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 封闭的节点类型集合
///
/// 块级与内联节点共用一个枚举；引擎通过 [`NodeKind::is_inline`]
/// 把容器的子节点切分为内联串和块级序列。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// 文档根
    Document,
    /// YAML Front Matter 块
    FrontMatter,
    /// 标题（层级 1–6）
    Heading(u32),
    Paragraph,
    /// 代码块（缩进或围栏），内容逐字节保留
    CodeBlock,
    ThematicBreak,
    BlockQuote,
    List,
    ListItem,
    Table,
    TableHead,
    TableRow,
    TableCell,
    DefinitionList,
    DefinitionListTitle,
    DefinitionListDefinition,
    FootnoteDefinition,
    /// 原始 HTML 块
    HtmlBlock,
    /// 其他容器（脚注等未特化的块）
    Container,

    /// 字面量文本
    Literal,
    /// 软换行或硬换行
    LineBreak,
    /// 内联代码
    CodeInline,
    /// 强调（斜体/粗体/删除线）
    Emphasis,
    /// 内联原始 HTML
    InlineHtml,
    /// 链接或图片
    Link { image: bool },
    /// 自动链接 `<https://…>`
    Autolink,
    /// 任务列表标记 `[ ]` / `[x]`
    TaskMarker,
    /// 脚注引用
    FootnoteReference,
}

impl NodeKind {
    /// 是否属于内联节点
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            NodeKind::Literal
                | NodeKind::LineBreak
                | NodeKind::CodeInline
                | NodeKind::Emphasis
                | NodeKind::InlineHtml
                | NodeKind::Link { .. }
                | NodeKind::Autolink
                | NodeKind::TaskMarker
                | NodeKind::FootnoteReference
        )
    }
}

/// 解析树节点
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub children: Vec<Node>,
}

impl Node {
    fn new(kind: NodeKind, span: Span) -> Self {
        Node {
            kind,
            span,
            children: Vec::new(),
        }
    }

    fn leaf(kind: NodeKind, span: Span) -> Self {
        Node::new(kind, span)
    }
}

/// 根据渲染器配置构造解析器选项
///
/// 同一配置对应的解析管线是确定的；不存在可变的全局解析器状态。
fn parser_options(options: &RendererOptions) -> Options {
    let mut opts = Options::empty();
    if options.enable_pipe_tables {
        opts.insert(Options::ENABLE_TABLES);
    }
    if options.enable_task_lists {
        opts.insert(Options::ENABLE_TASKLISTS);
    }
    if options.enable_front_matter {
        opts.insert(Options::ENABLE_YAML_STYLE_METADATA_BLOCKS);
    }
    if options.enable_custom_attributes {
        opts.insert(Options::ENABLE_HEADING_ATTRIBUTES);
    }
    if options.enable_definition_lists {
        opts.insert(Options::ENABLE_DEFINITION_LIST);
    }
    opts
}

fn heading_level(level: HeadingLevel) -> u32 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn map_tag(tag: &Tag) -> NodeKind {
    match tag {
        Tag::Paragraph => NodeKind::Paragraph,
        Tag::Heading { level, .. } => NodeKind::Heading(heading_level(*level)),
        Tag::BlockQuote(..) => NodeKind::BlockQuote,
        Tag::CodeBlock(CodeBlockKind::Indented | CodeBlockKind::Fenced(_)) => NodeKind::CodeBlock,
        Tag::HtmlBlock => NodeKind::HtmlBlock,
        Tag::List(_) => NodeKind::List,
        Tag::Item => NodeKind::ListItem,
        Tag::FootnoteDefinition(_) => NodeKind::FootnoteDefinition,
        Tag::DefinitionList => NodeKind::DefinitionList,
        Tag::DefinitionListTitle => NodeKind::DefinitionListTitle,
        Tag::DefinitionListDefinition => NodeKind::DefinitionListDefinition,
        Tag::Table(_) => NodeKind::Table,
        Tag::TableHead => NodeKind::TableHead,
        Tag::TableRow => NodeKind::TableRow,
        Tag::TableCell => NodeKind::TableCell,
        Tag::Emphasis | Tag::Strong | Tag::Strikethrough => NodeKind::Emphasis,
        Tag::Link { link_type, .. } => match link_type {
            LinkType::Autolink | LinkType::Email => NodeKind::Autolink,
            _ => NodeKind::Link { image: false },
        },
        Tag::Image { .. } => NodeKind::Link { image: true },
        Tag::MetadataBlock(_) => NodeKind::FrontMatter,
        _ => NodeKind::Container,
    }
}

/// 解析 Markdown 文本为带区间的节点树
///
/// 返回的根节点是 `Document`，区间覆盖整个输入。
pub fn parse_markdown(text: &str, options: &RendererOptions) -> Node {
    let parser = Parser::new_ext(text, parser_options(options));

    let mut stack: Vec<Node> = vec![Node::new(NodeKind::Document, Span::new(0, text.len()))];

    for (event, range) in parser.into_offset_iter() {
        let span = Span::new(range.start, range.end);
        match event {
            Event::Start(tag) => {
                stack.push(Node::new(map_tag(&tag), span));
            }
            Event::End(_) => {
                // 解析器保证 Start/End 配对，栈底的文档根永不弹出
                if stack.len() > 1 {
                    let mut node = stack.pop().expect("balanced parser events");
                    finish_node(&mut node);
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(node);
                    }
                }
            }
            Event::Text(_) => push_leaf(&mut stack, NodeKind::Literal, span),
            Event::Code(_) => push_leaf(&mut stack, NodeKind::CodeInline, span),
            Event::Html(_) => push_leaf(&mut stack, NodeKind::Literal, span),
            Event::InlineHtml(_) => push_leaf(&mut stack, NodeKind::InlineHtml, span),
            Event::SoftBreak | Event::HardBreak => push_leaf(&mut stack, NodeKind::LineBreak, span),
            Event::Rule => push_leaf(&mut stack, NodeKind::ThematicBreak, span),
            Event::TaskListMarker(_) => push_leaf(&mut stack, NodeKind::TaskMarker, span),
            Event::FootnoteReference(_) => push_leaf(&mut stack, NodeKind::FootnoteReference, span),
            _ => push_leaf(&mut stack, NodeKind::InlineHtml, span),
        }
    }

    let mut document = stack.swap_remove(0);
    finish_node(&mut document);
    document
}

fn push_leaf(stack: &mut [Node], kind: NodeKind, span: Span) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::leaf(kind, span));
    }
}

/// 收尾：HTML 块与代码块按原始字节整体处理，丢弃内部子节点；
/// HTML 块的区间以其内容块的并集为准（比容器事件的区间更精确）。
fn finish_node(node: &mut Node) {
    match node.kind {
        NodeKind::HtmlBlock => {
            if let (Some(first), Some(last)) = (node.children.first(), node.children.last()) {
                node.span = Span::new(first.span.start, last.span.end);
            }
            node.children.clear();
        }
        NodeKind::CodeBlock | NodeKind::FrontMatter | NodeKind::Autolink => {
            node.children.clear();
        }
        _ => {}
    }
}
