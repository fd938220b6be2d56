//! 元素类型与上下文栈
//!
//! 每个翻译单元都携带一个语义标签（标题层级、图片替代文本、Front Matter
//! 键名等），用于在目录中区分原文相同但语境不同的字符串。
//! 上下文栈在遍历期间跟踪当前所处的元素类型。

use std::fmt;

/// 翻译单元的语义标签（封闭枚举）
///
/// 标签文本与生成的目录中的 msgctxt 一致；`FrontMatterKey`
/// 会把键名代入标签模板。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementType {
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Heading5,
    Heading6,
    /// 图片替代文本
    ImageAlt,
    /// 超链接标签
    LinkLabel,
    /// Front Matter 属性值（键名未知时）
    FrontMatter,
    /// Front Matter 属性值，携带键名
    FrontMatterKey(String),
    /// 原始 HTML
    RawHtml,
    /// 普通文本
    Text,
    /// HTML 注释
    HtmlComment,
    /// 源代码
    Code,
    /// HTML div 容器
    HtmlDiv,
    /// HTML 表格单元格
    HtmlCell,
    /// 定义列表的术语
    DefinitionTerm,
    /// 主题分隔线
    ThematicBreak,
}

impl ElementType {
    /// 由标题层级构造对应的元素类型
    pub fn heading(level: u32) -> ElementType {
        match level {
            1 => ElementType::Heading1,
            2 => ElementType::Heading2,
            3 => ElementType::Heading3,
            4 => ElementType::Heading4,
            5 => ElementType::Heading5,
            _ => ElementType::Heading6,
        }
    }

    /// 人类可读的标签，用作目录的消息上下文
    pub fn label(&self) -> String {
        match self {
            ElementType::Heading1 => "Heading (level 1)".to_string(),
            ElementType::Heading2 => "Heading (level 2)".to_string(),
            ElementType::Heading3 => "Heading (level 3)".to_string(),
            ElementType::Heading4 => "Heading (level 4)".to_string(),
            ElementType::Heading5 => "Heading (level 5)".to_string(),
            ElementType::Heading6 => "Heading (level 6)".to_string(),
            ElementType::ImageAlt => "Image alternative text".to_string(),
            ElementType::LinkLabel => "Hyperlink label".to_string(),
            ElementType::FrontMatter => "Front Matter property value".to_string(),
            ElementType::FrontMatterKey(key) => {
                format!("Front Matter property '{key}'")
            }
            ElementType::RawHtml => "Raw HTML".to_string(),
            ElementType::Text => "Text".to_string(),
            ElementType::HtmlComment => "HTML Comment".to_string(),
            ElementType::Code => "Source Code".to_string(),
            ElementType::HtmlDiv => "HTML div container.".to_string(),
            ElementType::HtmlCell => "HTML cell.".to_string(),
            ElementType::DefinitionTerm => "Definition term".to_string(),
            ElementType::ThematicBreak => "Thematic Break".to_string(),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// 元素类型上下文栈
///
/// 只用于给翻译单元打标签。每个节点处理器进入时 push、离开时 pop，
/// 包括提前返回的路径；不平衡的栈属于编程缺陷而非运行时错误。
#[derive(Debug, Default)]
pub struct ContextStack {
    entries: Vec<Option<String>>,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// 入栈；`None` 表示无法分类的节点（标签为空）
    pub fn push(&mut self, element: Option<ElementType>) {
        self.entries.push(element.map(|e| e.label()));
    }

    pub fn pop(&mut self) -> Option<Option<String>> {
        self.entries.pop()
    }

    /// 栈顶标签，未入栈或栈顶为未分类节点时为 `None`
    pub fn peek(&self) -> Option<&str> {
        self.entries.last().and_then(|e| e.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
