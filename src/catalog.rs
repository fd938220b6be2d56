//! gettext 风格目录
//!
//! 把抽取出的翻译单元写成 .pot 目录（msgctxt = 上下文标签，
//! `#:` 引用来自文件/行号），或按已加载的 .po 目录翻译文档。
//! 核心引擎不感知目录格式，这里只是把目录查询包装成
//! `lookup` 契约的一个实现。

use std::collections::HashMap;
use std::path::Path;

use polib::catalog::Catalog;
use polib::message::{Message, MessageView};
use polib::metadata::CatalogMetadata;

use crate::error::{RenderError, RenderResult};
use crate::options::RendererOptions;
use crate::renderer::{TranslationTally, TranslationUnit};

/// msgid 统一使用 `\n` 换行
fn normalize_line_breaks(s: &str) -> String {
    s.replace("\r\n", "\n")
}

/// 读取 .po/.pot 文件
pub fn load(path: &Path) -> RenderResult<Catalog> {
    polib::po_file::parse(path).map_err(|e| RenderError::Catalog(e.to_string()))
}

/// 写出目录
pub fn save(catalog: &Catalog, path: &Path) -> RenderResult<()> {
    polib::po_file::write(catalog, path).map_err(|e| RenderError::Catalog(e.to_string()))
}

/// 空目录，带生成器元数据
pub fn new_catalog() -> Catalog {
    let mut metadata = CatalogMetadata::new();
    metadata.project_id_version = "markdown-translator".to_string();
    metadata.language = "en_US".to_string();
    Catalog::new(metadata)
}

/// 把翻译单元追加进目录
///
/// 相同 (msgid, msgctxt) 的单元合并为一个条目，引用去重后以空格
/// 连接；目录中已有的条目保持不变。`extra_comments` 只附加到
/// 携带 Markdown 语法的结构单元上（供译者参考）。
pub fn append_units(catalog: &mut Catalog, units: &[TranslationUnit], extra_comments: &[String]) {
    type Key = (String, Option<String>);
    let mut order: Vec<Key> = Vec::new();
    let mut references: HashMap<Key, Vec<String>> = HashMap::new();
    let mut structural: HashMap<Key, bool> = HashMap::new();

    for unit in units {
        let key: Key = (normalize_line_breaks(&unit.text), unit.context.clone());
        if !references.contains_key(&key) {
            order.push(key.clone());
        }
        let refs = references.entry(key.clone()).or_default();
        if let Some(file) = &unit.reference_file {
            if unit.reference_line > 0 {
                let reference = format!("{file}:{}", unit.reference_line);
                if !refs.contains(&reference) {
                    refs.push(reference);
                }
            }
        }
        *structural.entry(key).or_insert(false) |= unit.is_structural;
    }

    for key in order {
        let (msgid, context) = &key;
        if catalog
            .find_message(context.as_deref(), msgid, None)
            .is_some()
        {
            continue;
        }

        let mut builder = Message::build_singular();
        builder.with_msgid(msgid.clone());
        if let Some(context) = context {
            builder.with_msgctxt(context.clone());
        }
        let refs = &references[&key];
        if !refs.is_empty() {
            builder.with_source(refs.join(" "));
        }
        if structural[&key] && !extra_comments.is_empty() {
            builder.with_comments(extra_comments.join("\n"));
        }
        catalog.append_or_update(builder.done());
    }
}

/// 从单元列表直接生成一个新目录
pub fn generate_pot(units: &[TranslationUnit], extra_comments: &[String]) -> Catalog {
    let mut catalog = new_catalog();
    append_units(&mut catalog, units, extra_comments);
    catalog
}

/// 按目录翻译一个文档
///
/// 查询键为 (规范化的原文, 上下文标签)；译文写回前裁剪首尾空白。
/// `keep_source` 为真时，查不到译文的单元回退为原文（在 lookup 内
/// 重新注入，核心引擎仍按"有译文"处理）。
pub fn translate_with_catalog(
    markdown: &str,
    catalog: &Catalog,
    file_name: Option<&str>,
    path_to_source: Option<&str>,
    keep_source: bool,
    options: &RendererOptions,
) -> RenderResult<(String, TranslationTally)> {
    let lookup = move |unit: &TranslationUnit| -> Option<String> {
        let msgid = normalize_line_breaks(&unit.text);
        let translation = catalog
            .find_message(unit.context.as_deref(), &msgid, None)
            .and_then(|m| m.msgstr().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if translation.is_none() && keep_source {
            return Some(unit.text.clone());
        }
        translation
    };

    let locale = catalog.metadata.language.clone();
    let locale = (!locale.is_empty()).then_some(locale);

    crate::translate(
        markdown,
        &lookup,
        file_name,
        path_to_source,
        locale.as_deref(),
        options,
    )
}

#[cfg(test)]
mod tests {
    use polib::message::MessageMutView;

    use super::*;

    fn unit(text: &str, context: Option<&str>, line: usize) -> TranslationUnit {
        TranslationUnit {
            text: text.to_string(),
            context: context.map(str::to_string),
            reference_file: Some("./file.md".to_string()),
            reference_line: line,
            is_structural: true,
        }
    }

    #[test]
    fn append_units_deduplicates_entries() {
        let mut catalog = new_catalog();
        append_units(
            &mut catalog,
            &[
                unit("Heading", Some("Heading (level 1)"), 1),
                unit("Heading", Some("Heading (level 1)"), 1),
                unit("Heading", Some("Heading (level 2)"), 3),
            ],
            &[],
        );
        // 相同 msgid 不同 msgctxt 的条目各自保留
        assert!(catalog
            .find_message(Some("Heading (level 1)"), "Heading", None)
            .is_some());
        assert!(catalog
            .find_message(Some("Heading (level 2)"), "Heading", None)
            .is_some());
        assert_eq!(catalog.messages().count(), 2);
    }

    #[test]
    fn append_preserves_existing_entries() {
        let mut catalog = new_catalog();
        append_units(&mut catalog, &[unit("Heading", None, 1)], &[]);
        append_units(
            &mut catalog,
            &[unit("Heading", None, 5), unit("Third Heading", None, 9)],
            &[],
        );
        assert_eq!(catalog.messages().count(), 2);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages.pot");

        let mut catalog = new_catalog();
        append_units(
            &mut catalog,
            &[unit("Heading", Some("Heading (level 1)"), 1)],
            &["do not translate code spans".to_string()],
        );
        save(&catalog, &path).unwrap();

        let loaded = load(&path).unwrap();
        assert!(loaded
            .find_message(Some("Heading (level 1)"), "Heading", None)
            .is_some());
    }

    #[test]
    fn catalog_lookup_translates_document() {
        let mut catalog = new_catalog();
        append_units(&mut catalog, &[unit("Heading", Some("Heading (level 1)"), 1)], &[]);
        for mut message in catalog.messages_mut() {
            let _ = message.set_msgstr("Título".to_string());
        }

        let options = RendererOptions::default();
        let (output, tally) =
            translate_with_catalog("# Heading", &catalog, None, None, false, &options).unwrap();
        assert_eq!(output, "# Título");
        assert_eq!(tally.total_units, 1);
        assert_eq!(tally.translated_units, 1);
    }

    #[test]
    fn keep_source_falls_back_to_original() {
        let catalog = new_catalog();
        let options = RendererOptions::default();
        let (output, tally) =
            translate_with_catalog("# Heading", &catalog, None, None, true, &options).unwrap();
        assert_eq!(output, "# Heading");
        // 回退的原文依旧算作已翻译（lookup 返回了非空结果）
        assert_eq!(tally.translated_units, 1);
    }
}
