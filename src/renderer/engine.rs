//! 块级调度与内联分组策略
//!
//! 按节点类型一次分发：容器先序递归（进入时入栈上下文、离开时出栈），
//! 叶子按叶序处理。内联子节点的连续串交给分组策略决定合并或拆分。

use tracing::warn;

use crate::element::ElementType;
use crate::error::{excerpt, RenderError, RenderResult};
use crate::parsers::markdown::{Node, NodeKind};

use super::TransformRenderer;

impl TransformRenderer<'_> {
    /// 分发一个节点
    pub(super) fn visit(&mut self, node: &Node) -> RenderResult<()> {
        match node.kind {
            NodeKind::Document => {
                self.visit_children(node)?;
                // 仅文档根结束时刷新，接住末尾未匹配的原文（如结尾空行）
                self.flush()
            }
            NodeKind::FrontMatter => self.render_front_matter(node),
            NodeKind::Heading(level) => {
                let saved = self.force_newline_as_html;
                if self.options.replace_newline_inside_heading {
                    self.force_newline_as_html = true;
                }
                let result = self.with_context(Some(ElementType::heading(level)), |r| {
                    r.visit_children(node)
                });
                self.force_newline_as_html = saved;
                result
            }
            NodeKind::Paragraph => {
                self.with_context(Some(ElementType::Text), |r| r.visit_children(node))
            }
            NodeKind::CodeBlock => {
                // 代码永不翻译，字节经游标原样流出
                self.with_context(Some(ElementType::Code), |_| Ok(()))
            }
            NodeKind::ThematicBreak => {
                self.with_context(Some(ElementType::ThematicBreak), |_| Ok(()))
            }
            NodeKind::BlockQuote => {
                // 引用块内按整体流动文本处理，而不是逐行独立处理
                let saved = self.raw_lines_independent;
                self.raw_lines_independent = false;
                let result = self.visit_children(node);
                self.raw_lines_independent = saved;
                result
            }
            NodeKind::Table => {
                let saved = self.force_newline_as_html;
                if self.options.enable_pipe_tables && self.options.replace_newline_inside_table {
                    self.force_newline_as_html = true;
                }
                let result = self.visit_children(node);
                self.force_newline_as_html = saved;
                result
            }
            NodeKind::TableCell => {
                self.with_context(Some(ElementType::Text), |r| r.visit_children(node))
            }
            NodeKind::DefinitionListTitle => {
                self.with_context(Some(ElementType::DefinitionTerm), |r| r.visit_children(node))
            }
            NodeKind::HtmlBlock => self.render_html_block(node),
            NodeKind::List
            | NodeKind::ListItem
            | NodeKind::TableHead
            | NodeKind::TableRow
            | NodeKind::DefinitionList
            | NodeKind::DefinitionListDefinition
            | NodeKind::FootnoteDefinition => self.visit_children(node),
            NodeKind::Container => {
                // 未特化的块类型：记录日志，按无类型上下文继续遍历
                warn!("无法分类的节点类型，按无类型处理");
                self.with_context(None, |r| r.visit_children(node))
            }
            // 出现在块位置的孤立内联节点（防御性处理）
            _ => self.render_inline_run(&[node]),
        }
    }

    /// 遍历容器子节点：连续的内联子节点构成一个串，交给分组策略
    pub(super) fn visit_children(&mut self, node: &Node) -> RenderResult<()> {
        let mut run: Vec<&Node> = Vec::new();
        for child in &node.children {
            if child.kind.is_inline() {
                run.push(child);
            } else {
                if !run.is_empty() {
                    let taken = std::mem::take(&mut run);
                    self.render_inline_run(&taken)?;
                }
                self.visit(child)?;
            }
        }
        if !run.is_empty() {
            self.render_inline_run(&run)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // 内联分组策略
    // ------------------------------------------------------------------

    fn node_text(&self, node: &Node) -> &str {
        &self.doc[node.span.start..node.span.end]
    }

    fn is_blank_literal(&self, node: &Node) -> bool {
        node.kind == NodeKind::Literal && self.node_text(node).trim().is_empty()
    }

    /// 整串全部由这些节点构成时，整串原样保留
    fn run_skippable(&self, node: &Node) -> bool {
        matches!(node.kind, NodeKind::Autolink | NodeKind::TaskMarker) || self.is_blank_literal(node)
    }

    /// 拆分模式下从串两端修剪的节点
    fn skip_child(&self, node: &Node) -> bool {
        matches!(
            node.kind,
            NodeKind::TaskMarker | NodeKind::Link { .. } | NodeKind::LineBreak | NodeKind::Autolink
        ) || self.is_blank_literal(node)
    }

    /// 合并模式下从串两端修剪的节点（图片也修剪，自动链接保留在单元内）
    fn skip_child_together(&self, node: &Node) -> bool {
        matches!(node.kind, NodeKind::LineBreak | NodeKind::Link { image: true })
            || self.is_blank_literal(node)
    }

    fn literal_or_break(&self, node: &Node) -> bool {
        matches!(node.kind, NodeKind::Literal | NodeKind::LineBreak)
    }

    /// 处理一串内联子节点
    pub(super) fn render_inline_run(&mut self, children: &[&Node]) -> RenderResult<()> {
        if children.is_empty() {
            return Ok(());
        }

        // 单个图片/链接：单独渲染其标签文本，串的其余部分不再贡献
        if children.len() == 1 {
            if let NodeKind::Link { image } = children[0].kind {
                let link = children[0];
                if image && !self.options.skip_image_alt {
                    return self
                        .with_context(Some(ElementType::ImageAlt), |r| r.render_link(link));
                } else if !image {
                    return self
                        .with_context(Some(ElementType::LinkLabel), |r| r.render_link(link));
                }
                return Ok(());
            }
            // 单个内联代码：代码永不翻译
            if children[0].kind == NodeKind::CodeInline {
                return self.move_to(children[0].span.end);
            }
        }

        // 全部可跳过（自动链接/任务标记/空白字面量）时整串原样保留
        if children.iter().all(|c| self.run_skippable(c)) {
            return Ok(());
        }

        self.move_to(children[0].span.start)?;

        if self.options.keep_literals_together {
            self.process_children_together(children)?;
        } else {
            self.process_children_separate(children)?;
        }

        self.extract_link_labels(children)
    }

    /// 渲染链接/图片节点：进入其标签子串
    fn render_link(&mut self, link: &Node) -> RenderResult<()> {
        let label: Vec<&Node> = link.children.iter().collect();
        self.render_inline_run(&label)
    }

    /// 处理被修剪到串两端的子节点：链接/图片的标签原地渲染后
    /// 游标跳到节点末尾；其他类型的字节经游标自然流出。
    fn process_child(&mut self, child: &Node) -> RenderResult<()> {
        if let NodeKind::Link { image } = child.kind {
            if image && !self.options.skip_image_alt {
                self.with_context(Some(ElementType::ImageAlt), |r| r.render_link(child))?;
            } else if !image {
                self.with_context(Some(ElementType::LinkLabel), |r| r.render_link(child))?;
            }
            self.move_to(child.span.end)?;
        }
        Ok(())
    }

    /// 拆分模式（默认）
    fn process_children_separate(&mut self, children: &[&Node]) -> RenderResult<()> {
        let mut start = 0;
        while start < children.len() && self.skip_child(children[start]) {
            self.process_child(children[start])?;
            start += 1;
        }
        if start == children.len() {
            return Ok(());
        }

        let mut end = children.len();
        while end > start && self.skip_child(children[end - 1]) {
            end -= 1;
        }
        let tail = &children[end..];

        let mut middle: Vec<&Node> = children[start..end].to_vec();
        if middle.len() == 1 {
            match middle[0].kind {
                // 只剩一个强调节点时下降到它的子节点
                NodeKind::Emphasis => middle = middle[0].children.iter().collect(),
                // 只剩内联代码或自动链接时丢弃
                NodeKind::CodeInline | NodeKind::Autolink => middle.clear(),
                _ => {}
            }
        }

        if !middle.is_empty() {
            let all_literal = middle.len() > 1 && middle.iter().all(|c| self.literal_or_break(c));
            if self.raw_lines_independent || all_literal {
                self.write_multiple(&middle)?;
            } else {
                // 原始区间整体作为一个结构单元，内部的强调标记原样保留
                self.move_to(middle[0].span.start)?;
                let length = middle[middle.len() - 1].span.end - middle[0].span.start;
                let raw = self.take(length)?;
                self.write_raw(&raw, middle[0].span.start)?;
            }
        }

        for child in tail {
            self.process_child(child)?;
        }
        Ok(())
    }

    /// 合并模式（keep_literals_together）
    fn process_children_together(&mut self, children: &[&Node]) -> RenderResult<()> {
        let mut start = 0;
        while start < children.len() && self.skip_child_together(children[start]) {
            self.process_child(children[start])?;
            start += 1;
        }
        if start == children.len() {
            return Ok(());
        }

        let mut end = children.len();
        while end > start && self.skip_child_together(children[end - 1]) {
            end -= 1;
        }
        let tail = &children[end..];

        let mut middle: Vec<&Node> = children[start..end].to_vec();
        if middle.len() == 1 {
            if self.skip_child(middle[0]) {
                self.process_child(middle[0])?;
                middle.clear();
            } else {
                match middle[0].kind {
                    NodeKind::Emphasis => middle = middle[0].children.iter().collect(),
                    NodeKind::CodeInline | NodeKind::Autolink => middle.clear(),
                    _ => {}
                }
            }
        }

        if !middle.is_empty() {
            self.write_multiple_together(&middle)?;
        }

        for child in tail {
            self.process_child(child)?;
        }
        Ok(())
    }

    /// 串内所有链接/图片的标签文本各自作为独立单元抽取，
    /// 与外围文本的分组方式无关。
    fn extract_link_labels(&mut self, children: &[&Node]) -> RenderResult<()> {
        for child in children {
            if let NodeKind::Link { image } = child.kind {
                if child.children.is_empty() {
                    continue;
                }
                let start = child.children[0].span.start;
                let end = child.children[child.children.len() - 1].span.end;
                let label = self.doc[start..end].to_string();
                if image && !self.options.skip_image_alt {
                    self.with_context(Some(ElementType::ImageAlt), |r| {
                        let _ = r.check_transform(&label, start, true);
                        Ok(())
                    })?;
                } else if !image {
                    self.with_context(Some(ElementType::LinkLabel), |r| {
                        let _ = r.check_transform(&label, start, true);
                        Ok(())
                    })?;
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // 写出器
    // ------------------------------------------------------------------

    /// 原始片段写出：首尾空白原样保留，中间作为结构单元转换
    pub(super) fn write_raw(&mut self, raw: &str, index: usize) -> RenderResult<()> {
        let lead_len = raw.len() - raw.trim_start().len();
        self.write(&raw[..lead_len]);

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            // 全部是空白时前导部分已覆盖整个片段
            return Ok(());
        }

        if let Some(transformed) = self.check_transform(trimmed, index + lead_len, true) {
            let transformed = if self.force_newline_as_html {
                Self::replace_newlines_as_html(&transformed)
            } else {
                transformed
            };
            self.write(&transformed);
        }

        let trail_start = raw.trim_end().len();
        self.write(&raw[trail_start..]);
        Ok(())
    }

    /// 合并写出器：子节点按源文本行分组，每行捕获其精确的前导/尾随
    /// 片段，修剪后的行文本以换行连接成一个单元，译文按行拆回原有
    /// 行结构。译文行数与原文行数不一致时为致命协议错误。
    fn write_multiple(&mut self, children: &[&Node]) -> RenderResult<()> {
        struct LineGroup {
            lead_from: usize,
            first_start: usize,
            last_end: usize,
        }

        let doc = self.doc;
        let index = self.cursor.position();

        let mut groups: Vec<LineGroup> = Vec::new();
        let mut prev_end = index;
        for child in children {
            if child.kind == NodeKind::LineBreak {
                continue;
            }
            let text = self.node_text(child);
            if text.trim().is_empty() {
                // 空白字面量并入下一组的前导片段
                continue;
            }
            let starts_new_line =
                groups.is_empty() || doc[prev_end..child.span.start].contains('\n');
            if starts_new_line {
                groups.push(LineGroup {
                    lead_from: prev_end,
                    first_start: child.span.start,
                    last_end: child.span.end,
                });
            } else if let Some(group) = groups.last_mut() {
                group.last_end = child.span.end;
            }
            prev_end = child.span.end;
        }
        if groups.is_empty() {
            return Ok(());
        }

        let unit_text = groups
            .iter()
            .map(|g| doc[g.first_start..g.last_end].trim())
            .collect::<Vec<_>>()
            .join("\n");

        let transformed = self.check_transform(&unit_text, index, true).ok_or_else(|| {
            RenderError::MissingTranslation {
                excerpt: excerpt(&unit_text),
            }
        })?;

        let normalized = transformed.replace("\r\n", "\n").replace('\r', "\n");
        let lines: Vec<&str> = normalized.split('\n').collect();
        if lines.len() != groups.len() && !self.raw_lines_independent {
            return Err(RenderError::LineCountMismatch {
                expected: groups.len(),
                actual: lines.len(),
                excerpt: excerpt(&unit_text),
            });
        }

        for (i, group) in groups.iter().enumerate() {
            self.write(&doc[group.lead_from..group.first_start]);
            let slice = &doc[group.first_start..group.last_end];
            let lead_ws = slice.len() - slice.trim_start().len();
            self.write(&slice[..lead_ws]);
            if let Some(line) = lines.get(i) {
                self.write(line);
            }
            self.write(&slice[slice.trim_end().len()..]);
        }
        // 独立行模式下多余的译文行追加在末尾
        for line in lines.iter().skip(groups.len()) {
            self.write(line);
        }

        self.skip_to(children[children.len() - 1].span.end)
    }

    /// 合并写出器（整体模式）：覆盖整个子节点范围的连续原始区间
    /// 修剪后作为一个单元转换，再包回原有的首尾空白。
    fn write_multiple_together(&mut self, children: &[&Node]) -> RenderResult<()> {
        let doc = self.doc;
        let index = self.cursor.position();
        let start = children[0].span.start;
        let end = children[children.len() - 1].span.end;
        let raw = &doc[start..end];

        let lead_len = raw.len() - raw.trim_start().len();
        let trail_start = raw.trim_end().len();
        let trimmed = raw.trim();

        // 合并单元必须解析出结果（即便是空串），缺失译文是致命错误
        let transformed = self.check_transform(trimmed, index, true).ok_or_else(|| {
            RenderError::MissingTranslation {
                excerpt: excerpt(trimmed),
            }
        })?;
        let transformed = if self.force_newline_as_html {
            Self::replace_newlines_as_html(&transformed)
        } else {
            transformed
        };

        self.move_to(start)?;
        self.write(&raw[..lead_len]);
        self.write(&transformed);
        self.write(&raw[trail_start..]);
        self.skip_to(end)
    }
}
