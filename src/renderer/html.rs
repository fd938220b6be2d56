//! 内嵌 HTML 子遍历
//!
//! 原始 HTML 块被交给 HTML 解析器做第二次、嵌套的遍历，
//! 对每个节点应用同样的翻译单元策略后重新序列化。
//! 两种模式：独立模式下每个叶子 DOM 节点各自成为翻译单元；
//! keep-tags-together 模式下，后代标签全部落在允许集合内的子树
//! 整体作为一个结构单元（内部标记原样通过转换）。
//! 如果没有抽取到任何单元，写回原始 HTML 字符串，防止解析器
//! 不完全往返造成的序列化漂移。

use markup5ever_rcdom::{Handle, Node as DomNode, NodeData};
use tracing::warn;

use crate::element::ElementType;
use crate::error::{excerpt, RenderResult};
use crate::parsers::html::{
    descendant_tags, fragment_to_dom, get_body, get_node_attr, serialize_inner, set_inner_html,
    set_node_attr,
};
use crate::parsers::markdown::Node;
use crate::parsers::path_rewriter::{combine_relative, is_rewritable_target};

use super::TransformRenderer;

impl TransformRenderer<'_> {
    /// 渲染原始 HTML 块
    pub(super) fn render_html_block(&mut self, node: &Node) -> RenderResult<()> {
        if node.span.is_empty() {
            return Ok(());
        }
        self.with_context(Some(ElementType::RawHtml), |r| {
            r.move_to(node.span.start)?;
            let html = r.take(node.span.len())?;

            if !r.should_transform(&html) {
                r.write(&html);
                return Ok(());
            }
            if !r.options.parse_html {
                // 不解析 HTML 时整块作为一个翻译单元
                return r.write_raw(&html, node.span.start);
            }
            r.render_html_parsed(&html, node.span.start)
        })
    }

    /// 解析后的子遍历
    fn render_html_parsed(&mut self, html: &str, offset: usize) -> RenderResult<()> {
        let dom = fragment_to_dom(html);
        let Some(body) = get_body(&dom) else {
            self.write(html);
            return Ok(());
        };
        // 编辑前的序列化结果，用于往返一致性诊断
        let parsed_body = serialize_inner(&body);

        // 图片 src 重写独立于翻译单元计数
        let mut rewritten_sources = 0usize;
        if let Some(prefix) = self.options.image_relative_path.clone() {
            rewrite_image_sources(&body, &prefix, &mut rewritten_sources);
        }

        let mut extracted = 0usize;
        if self.options.keep_html_tags_together.is_empty() {
            self.walk_independent(&body, html, offset, &mut extracted)?;
        } else {
            self.walk_keep_together(&body, html, offset, &mut extracted)?;
        }

        if extracted > 0 || rewritten_sources > 0 {
            if normalize_line_endings(html) != parsed_body {
                // 解析器对畸形输入可能有轻微损耗，仅作诊断
                warn!("HTML 未能完全往返: {}", excerpt(html));
            }
            let output = serialize_inner(&body);
            self.write(&output);
        } else {
            self.write(html);
        }
        Ok(())
    }

    /// 独立模式：每个叶子节点（文本、注释）各自成为翻译单元
    fn walk_independent(
        &mut self,
        parent: &Handle,
        block_html: &str,
        offset: usize,
        extracted: &mut usize,
    ) -> RenderResult<()> {
        let children: Vec<Handle> = parent.children.borrow().iter().cloned().collect();
        for child in children {
            match &child.data {
                NodeData::Text { contents } => {
                    let text = contents.borrow().to_string();
                    if let Some(new_text) =
                        self.transform_html_text(&text, parent_element(parent), block_html, offset)?
                    {
                        let mut contents = contents.borrow_mut();
                        contents.clear();
                        contents.push_slice(&new_text);
                        *extracted += 1;
                    }
                }
                NodeData::Comment { contents } => {
                    let text = contents.to_string();
                    if let Some(new_text) = self.transform_html_text(
                        &text,
                        Some(ElementType::HtmlComment),
                        block_html,
                        offset,
                    )? {
                        replace_comment(parent, &child, &new_text);
                        *extracted += 1;
                    }
                }
                NodeData::Element { name, .. } => {
                    if child.children.borrow().is_empty() {
                        // 无子节点的元素没有文本内容；未知标签只记日志
                        if element_for_tag(name.local.as_ref()).is_none() {
                            warn!("无法分类的 HTML 元素: <{}>", name.local.as_ref());
                        }
                    } else {
                        self.walk_independent(&child, block_html, offset, extracted)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// keep-tags-together 模式：允许集合覆盖的子树整体作为结构单元
    fn walk_keep_together(
        &mut self,
        parent: &Handle,
        block_html: &str,
        offset: usize,
        extracted: &mut usize,
    ) -> RenderResult<()> {
        let children: Vec<Handle> = parent.children.borrow().iter().cloned().collect();
        for child in children {
            match &child.data {
                NodeData::Text { contents } => {
                    let text = contents.borrow().to_string();
                    if let Some(new_text) =
                        self.transform_html_text(&text, parent_element(parent), block_html, offset)?
                    {
                        let mut contents = contents.borrow_mut();
                        contents.clear();
                        contents.push_slice(&new_text);
                        *extracted += 1;
                    }
                }
                NodeData::Comment { contents } => {
                    let text = contents.to_string();
                    if let Some(new_text) = self.transform_html_text(
                        &text,
                        Some(ElementType::HtmlComment),
                        block_html,
                        offset,
                    )? {
                        replace_comment(parent, &child, &new_text);
                        *extracted += 1;
                    }
                }
                NodeData::Element { name, .. } => {
                    let has_children = !child.children.borrow().is_empty();
                    if has_children && self.subtree_within_allowlist(&child) {
                        let tag = name.local.as_ref().to_string();
                        if self.transform_html_subtree(&child, &tag, block_html, offset)? {
                            *extracted += 1;
                        }
                    } else if has_children {
                        self.walk_keep_together(&child, block_html, offset, extracted)?;
                    } else if element_for_tag(name.local.as_ref()).is_none() {
                        warn!("无法分类的 HTML 元素: <{}>", name.local.as_ref());
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// 文本叶子的单元转换；返回 `Some(替换文本)` 表示发生了转换
    ///
    /// 过滤模式按整个 HTML 块判定（块级命中后其内部叶子不再逐个
    /// 过滤），首尾空白在节点内原样保留。
    fn transform_html_text(
        &mut self,
        text: &str,
        element: Option<ElementType>,
        block_html: &str,
        offset: usize,
    ) -> RenderResult<Option<String>> {
        let trimmed = text.trim();
        if trimmed.is_empty() || !self.should_transform(block_html) {
            return Ok(None);
        }
        let lead = &text[..text.len() - text.trim_start().len()];
        let trail = &text[text.trim_end().len()..];
        let transformed = self.with_context(element, |r| {
            Ok(r.transform_direct(trimmed, offset, false).unwrap_or_default())
        })?;
        Ok(Some(format!("{lead}{transformed}{trail}")))
    }

    /// 允许集合覆盖的子树：内部 HTML 作为一个结构单元整体转换
    fn transform_html_subtree(
        &mut self,
        node: &Handle,
        tag: &str,
        block_html: &str,
        offset: usize,
    ) -> RenderResult<bool> {
        let inner = serialize_inner(node);
        let trimmed = inner.trim();
        if trimmed.is_empty() || !self.should_transform(block_html) {
            return Ok(false);
        }
        let lead = &inner[..inner.len() - inner.trim_start().len()];
        let trail = &inner[inner.trim_end().len()..];
        let element = container_element_for_tag(tag);
        let transformed = self.with_context(element, |r| {
            Ok(r.transform_direct(trimmed, offset, true).unwrap_or_default())
        })?;
        set_inner_html(node, &format!("{lead}{transformed}{trail}"));
        Ok(true)
    }

    fn subtree_within_allowlist(&self, node: &Handle) -> bool {
        let mut tags = Vec::new();
        descendant_tags(node, &mut tags);
        tags.iter()
            .all(|t| self.options.keep_html_tags_together.iter().any(|a| a == t))
    }
}

/// 按父元素标签分类文本叶子
fn parent_element(parent: &Handle) -> Option<ElementType> {
    match &parent.data {
        NodeData::Element { name, .. } => element_for_tag(name.local.as_ref()),
        _ => Some(ElementType::Text),
    }
}

/// 标签到元素类型的映射（文本叶子语境）
fn element_for_tag(tag: &str) -> Option<ElementType> {
    match tag {
        "h1" => Some(ElementType::Heading1),
        "h2" => Some(ElementType::Heading2),
        "h3" => Some(ElementType::Heading3),
        "h4" => Some(ElementType::Heading4),
        "h5" => Some(ElementType::Heading5),
        "h6" => Some(ElementType::Heading6),
        "p" | "li" | "body" | "div" => Some(ElementType::Text),
        "a" => Some(ElementType::LinkLabel),
        "code" | "pre" | "kbd" | "samp" | "tt" => Some(ElementType::Code),
        "td" | "th" => Some(ElementType::HtmlCell),
        "table" | "thead" | "tbody" | "tr" | "span" | "br" | "hr" | "img" | "b" | "i" | "em"
        | "strong" | "u" | "sup" | "sub" | "ul" | "ol" | "blockquote" => {
            Some(ElementType::RawHtml)
        }
        _ => None,
    }
}

/// 标签到元素类型的映射（keep-tags-together 子树语境）
fn container_element_for_tag(tag: &str) -> Option<ElementType> {
    match tag {
        "div" => Some(ElementType::HtmlDiv),
        _ => element_for_tag(tag),
    }
}

/// 重写所有 `<img src>` 为相对于给定前缀的路径
fn rewrite_image_sources(node: &Handle, prefix: &str, count: &mut usize) {
    if let NodeData::Element { name, .. } = &node.data {
        if name.local.as_ref() == "img" {
            if let Some(src) = get_node_attr(node, "src") {
                if is_rewritable_target(&src) {
                    set_node_attr(node, "src", Some(combine_relative(prefix, &src)));
                    *count += 1;
                }
            }
        }
    }
    let children: Vec<Handle> = node.children.borrow().iter().cloned().collect();
    for child in children {
        rewrite_image_sources(&child, prefix, count);
    }
}

/// 用新内容替换注释节点（rcdom 的注释内容不可变，只能整体换节点）
fn replace_comment(parent: &Handle, child: &Handle, new_text: &str) {
    use html5ever::tendril::StrTendril;

    let replacement = DomNode::new(NodeData::Comment {
        contents: StrTendril::from_slice(new_text),
    });
    replacement
        .parent
        .set(Some(std::rc::Rc::downgrade(parent)));
    let mut children = parent.children.borrow_mut();
    if let Some(position) = children.iter().position(|c| std::rc::Rc::ptr_eq(c, child)) {
        children[position] = replacement;
    }
}

fn normalize_line_endings(s: &str) -> String {
    s.replace("\r\n", "\n")
}
