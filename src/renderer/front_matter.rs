//! YAML Front Matter 处理
//!
//! Front Matter 块被整体反序列化，所有字符串叶子转换为以键名标注的
//! 翻译单元，再重新序列化写出。原块的字节被游标跳过（输出已重新合成）。
//! 反序列化/序列化失败对当前文档是致命的：Front Matter 假定是
//! 良构输入。

use serde_yaml::{Mapping, Value};

use crate::element::ElementType;
use crate::error::{RenderError, RenderResult};
use crate::parsers::markdown::Node;

use super::TransformRenderer;

impl TransformRenderer<'_> {
    /// 渲染 Front Matter 块
    pub(super) fn render_front_matter(&mut self, node: &Node) -> RenderResult<()> {
        self.with_context(Some(ElementType::FrontMatter), |r| {
            let doc = r.doc;
            let block = &doc[node.span.start..node.span.end];

            let Some((content_range, tail_start)) = split_front_matter(block) else {
                return Err(RenderError::FrontMatter(
                    "未找到 Front Matter 结束分隔符".to_string(),
                ));
            };
            let content = &block[content_range.clone()];
            let tail = block[tail_start..].to_string();

            if content.trim().is_empty() {
                // 空块原样写出
                return r.move_to(node.span.end);
            }

            let value: Value = serde_yaml::from_str(content)?;
            let mut converted = r.convert_yaml(None, value)?;

            r.apply_front_matter_mutations(&mut converted);

            let yaml_text = serde_yaml::to_string(&converted)?;

            r.write("---\n");
            r.write(&yaml_text);
            r.write("---");
            r.write(&tail);
            r.skip_to(node.span.end)
        })
    }

    /// 递归地把每个字符串叶子变成以键名标注的翻译单元
    ///
    /// 排除列表中的键保持原值；序列元素继承父级键名；
    /// 非字符串标量原样通过。
    fn convert_yaml(&mut self, key: Option<&str>, value: Value) -> RenderResult<Value> {
        match value {
            Value::String(s) => {
                let element = match key {
                    Some(k) => ElementType::FrontMatterKey(k.to_string()),
                    None => ElementType::FrontMatter,
                };
                let offset = self.cursor_position();
                let converted = self.with_context(Some(element), |r| {
                    Ok(r.check_transform(&s, offset, false).unwrap_or_default())
                })?;
                Ok(Value::String(converted))
            }
            Value::Sequence(items) => {
                let mut converted = Vec::with_capacity(items.len());
                for item in items {
                    converted.push(self.convert_yaml(key, item)?);
                }
                Ok(Value::Sequence(converted))
            }
            Value::Mapping(map) => {
                let mut converted = Mapping::new();
                for (map_key, map_value) in map {
                    let key_name = map_key.as_str().map(str::to_string);
                    let excluded = key_name
                        .as_deref()
                        .is_some_and(|k| self.options.front_matter_exclude.iter().any(|e| e == k));
                    let new_value = if excluded {
                        map_value
                    } else {
                        self.convert_yaml(key_name.as_deref(), map_value)?
                    };
                    converted.insert(map_key, new_value);
                }
                Ok(Value::Mapping(converted))
            }
            other => Ok(other),
        }
    }

    /// 翻译时的 Front Matter 变更：写入源路径键、更新 locale、
    /// 注入额外键值对
    fn apply_front_matter_mutations(&mut self, value: &mut Value) {
        let Value::Mapping(map) = value else {
            return;
        };
        if let (Some(key), Some(path)) = (&self.options.front_matter_source_key, self.path_to_source)
        {
            map.insert(
                Value::String(key.clone()),
                Value::String(path.to_string()),
            );
        }
        if self.options.update_front_matter_locale {
            if let Some(locale) = self.locale {
                map.insert(
                    Value::String("locale".to_string()),
                    Value::String(locale.to_string()),
                );
            }
        }
        for (key, val) in &self.options.extra_front_matter_keys {
            map.insert(Value::String(key.clone()), Value::String(val.clone()));
        }
    }

    fn cursor_position(&self) -> usize {
        self.cursor.position()
    }
}

/// 把 Front Matter 块切为内容区间与结束分隔符之后的尾部起点
///
/// 块形如 `---\n<content>---<tail>`；尾部通常只是一个换行。
fn split_front_matter(block: &str) -> Option<(std::ops::Range<usize>, usize)> {
    let rest = block.strip_prefix("---")?;
    let first_line_end = rest.find('\n')?;
    let content_start = 3 + first_line_end + 1;

    let mut pos = content_start;
    while pos < block.len() {
        let line_end = block[pos..]
            .find('\n')
            .map(|i| pos + i + 1)
            .unwrap_or(block.len());
        let line = &block[pos..line_end];
        let fence = line.trim_end();
        if fence == "---" || fence == "..." {
            return Some((content_start..pos, pos + fence.len()));
        }
        pos = line_end;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_finds_closing_fence() {
        let block = "---\ntitle: Hi\n---\n";
        let (content, tail_start) = split_front_matter(block).unwrap();
        assert_eq!(&block[content], "title: Hi\n");
        assert_eq!(&block[tail_start..], "\n");
    }

    #[test]
    fn split_without_trailing_newline() {
        let block = "---\ntitle: Hi\n---";
        let (content, tail_start) = split_front_matter(block).unwrap();
        assert_eq!(&block[content], "title: Hi\n");
        assert_eq!(&block[tail_start..], "");
    }

    #[test]
    fn split_rejects_unterminated_block() {
        assert!(split_front_matter("---\ntitle: Hi\n").is_none());
    }
}
