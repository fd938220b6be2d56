//! 译文注入测试
//!
//! 替换策略：每个单元经 lookup 查询译文并原地替换，查不到的单元
//! 渲染为空并进入缺失集合；其余字节逐字节保留。

use std::collections::HashMap;

use markdown_translator::{translate, RenderError, RendererOptions, TranslationUnit};

/// 以固定词表查询译文
fn lookup_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn translate_with(
    markdown: &str,
    map: &HashMap<String, String>,
    keep_source: bool,
    options: &RendererOptions,
) -> (String, markdown_translator::TranslationTally) {
    let lookup = move |unit: &TranslationUnit| -> Option<String> {
        match map.get(&unit.text) {
            Some(t) => Some(t.clone()),
            None if keep_source => Some(unit.text.clone()),
            None => None,
        }
    };
    translate(markdown, &lookup, None, None, None, options).expect("translate should succeed")
}

fn pt_map() -> HashMap<String, String> {
    lookup_map(&[
        ("Heading", "Título"),
        ("Another Heading", "Outro Título"),
        ("Hello", "Olá"),
        ("World", "Mundo"),
        ("Hello\nWorld", "Olá\nMundo"),
    ])
}

#[test]
fn heading_simple() {
    let (output, tally) =
        translate_with("# Heading", &pt_map(), false, &RendererOptions::default());
    assert_eq!(output, "# Título");
    assert_eq!(tally.total_units, 1);
    assert_eq!(tally.translated_units, 1);
    assert!(tally.missing.is_empty());
}

#[test]
fn heading_pair() {
    let (output, tally) = translate_with(
        "# Heading\n\n## Another Heading",
        &pt_map(),
        false,
        &RendererOptions::default(),
    );
    assert_eq!(output, "# Título\n\n## Outro Título");
    assert_eq!(tally.total_units, 2);
    assert_eq!(tally.translated_units, 2);
}

#[test]
fn missing_translation_renders_empty() {
    let (output, tally) = translate_with(
        "# Heading\n\n## New Heading",
        &pt_map(),
        false,
        &RendererOptions::default(),
    );
    assert_eq!(output, "# Título\n\n## ");
    assert_eq!(tally.total_units, 2);
    assert_eq!(tally.translated_units, 1);
    assert_eq!(
        tally.missing.iter().cloned().collect::<Vec<_>>(),
        ["New Heading"]
    );
}

#[test]
fn front_matter_value_translates() {
    let options = RendererOptions {
        enable_front_matter: true,
        ..Default::default()
    };
    let mut map = pt_map();
    map.insert("Hello".to_string(), "Olá".to_string());
    let (output, tally) = translate_with(
        "---\ntag: Hello\n---\n\n# Heading\n\n## New Heading",
        &map,
        false,
        &options,
    );
    assert_eq!(output, "---\ntag: Olá\n---\n\n# Título\n\n## ");
    assert_eq!(tally.total_units, 3);
    assert_eq!(tally.translated_units, 2);
}

#[test]
fn keep_source_fallback() {
    // "##New Heading" 缺少空格，是普通段落而不是标题
    let (output, tally) = translate_with(
        "# Heading\n\n##New Heading",
        &pt_map(),
        true,
        &RendererOptions::default(),
    );
    assert_eq!(output, "# Título\n\n##New Heading");
    assert_eq!(tally.total_units, 2);
    assert_eq!(tally.translated_units, 2);
}

#[test]
fn quote_keeps_marker_layout() {
    let (output, tally) = translate_with(
        "- Heading\n\n    > Hello\n    World\n",
        &pt_map(),
        true,
        &RendererOptions::default(),
    );
    assert_eq!(output, "- Título\n\n    > Olá\n    Mundo\n");
    assert_eq!(tally.total_units, 2);
    assert_eq!(tally.translated_units, 2);
}

#[test]
fn quote_with_markers_on_both_lines() {
    let (output, _) = translate_with(
        "- Heading\n\n    > Hello\n    > World\n",
        &pt_map(),
        true,
        &RendererOptions::default(),
    );
    assert_eq!(output, "- Título\n\n    > Olá\n    > Mundo\n");
}

#[test]
fn list_with_indented_text() {
    let (output, tally) = translate_with(
        "1. Heading\n\n    ![Hello](./image.png)\n\n    ![Hello](./image2.png)\n\n    Hello\n    World\n\n1. Heading\n",
        &pt_map(),
        true,
        &RendererOptions::default(),
    );
    assert_eq!(
        output,
        "1. Título\n\n    ![Olá](./image.png)\n\n    ![Olá](./image2.png)\n\n    Olá\n    Mundo\n\n1. Título\n"
    );
    assert_eq!(tally.total_units, 5);
    assert_eq!(tally.translated_units, 5);
}

#[test]
fn single_image_alt_together_mode() {
    let options = RendererOptions {
        keep_literals_together: true,
        ..Default::default()
    };
    let (output, tally) = translate_with("![Hello](image.png)", &pt_map(), true, &options);
    assert_eq!(output, "![Olá](image.png)");
    assert_eq!(tally.total_units, 1);
    assert_eq!(tally.translated_units, 1);
}

#[test]
fn identity_substitution_matches_echo() {
    let markdown = "# Title\n\nSome *styled* paragraph with [a link](https://example.com).\n\n\
                    - item one\n- item two\n\n```rust\nlet x = 1;\n```\n\n> quoted\n";
    let lookup = |unit: &TranslationUnit| Some(unit.text.clone());
    let options = RendererOptions::default();
    let (output, _) = translate(markdown, &lookup, None, None, None, &options).unwrap();
    assert_eq!(output, markdown);
}

#[test]
fn merged_unit_line_count_mismatch_is_fatal() {
    let map = lookup_map(&[("Hello\nWorld", "Single line")]);
    let lookup = move |unit: &TranslationUnit| map.get(&unit.text).cloned();
    let options = RendererOptions::default();
    let result = translate("> Hello\nWorld", &lookup, None, None, None, &options);
    assert!(matches!(
        result,
        Err(RenderError::LineCountMismatch {
            expected: 2,
            actual: 1,
            ..
        })
    ));
}

#[test]
fn merged_unit_missing_translation_is_fatal() {
    let lookup = |_: &TranslationUnit| None;
    let options = RendererOptions::default();
    let result = translate("> Hello\nWorld", &lookup, None, None, None, &options);
    assert!(matches!(result, Err(RenderError::MissingTranslation { .. })));
}

#[test]
fn tally_counts_distinct_missing_once() {
    let lookup = |_: &TranslationUnit| None;
    let options = RendererOptions::default();
    let (output, tally) =
        translate("# Hello\n\nHello", &lookup, None, None, None, &options).unwrap();
    assert_eq!(output, "# \n\n");
    assert_eq!(tally.total_units, 2);
    assert_eq!(tally.translated_units, 0);
    assert_eq!(tally.missing.len(), 1);
    assert!(tally.missing.contains("Hello"));
    assert!(tally.translated_units <= tally.total_units);
}

#[test]
fn html_div_text_translates() {
    let options = RendererOptions {
        parse_html: true,
        ..Default::default()
    };
    let (output, tally) = translate_with(
        "<div class=\"awesome\">\nHeading\n</div>",
        &pt_map(),
        false,
        &options,
    );
    assert_eq!(output, "<div class=\"awesome\">\nTítulo\n</div>");
    assert_eq!(tally.total_units, 1);
    assert_eq!(tally.translated_units, 1);
}

#[test]
fn html_div_with_markdown_inside() {
    let options = RendererOptions {
        parse_html: true,
        ..Default::default()
    };
    let (output, tally) = translate_with(
        "<div class=\"awesome\">\n\nHeading\n\n</div>",
        &pt_map(),
        false,
        &options,
    );
    assert_eq!(output, "<div class=\"awesome\">\n\nTítulo\n\n</div>");
    assert_eq!(tally.total_units, 1);
    assert_eq!(tally.translated_units, 1);
}

#[test]
fn keep_html_tags_together() {
    let options = RendererOptions {
        keep_literals_together: true,
        parse_html: true,
        keep_html_tags_together: ["br", "b", "i", "sup", "code", "strong", "em", "a"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        ..Default::default()
    };
    let markdown = "# Heading\n\nHello\n\n<p style=\"font-size:12px\" markdown=\"1\">\n\nHello\nWorld\n\n</p>";
    let (output, tally) = translate_with(markdown, &pt_map(), true, &options);
    assert_eq!(
        output,
        "# Título\n\nOlá\n\n<p style=\"font-size:12px\" markdown=\"1\">\n\nOlá\nMundo\n\n</p>"
    );
    assert_eq!(tally.total_units, 3);
    assert_eq!(tally.translated_units, 3);
}

#[test]
fn whitespace_after_html_block_survives() {
    let options = RendererOptions {
        keep_literals_together: true,
        parse_html: true,
        keep_html_tags_together: vec!["br".to_string(), "b".to_string()],
        ..Default::default()
    };
    let markdown = "# Heading\n\n<div class=\"info\" markdown=\"1\">\n\nHello\n\n</div> \n\nHello";
    let (output, tally) = translate_with(markdown, &pt_map(), true, &options);
    assert_eq!(
        output,
        "# Título\n\n<div class=\"info\" markdown=\"1\">\n\nOlá\n\n</div> \n\nOlá"
    );
    assert_eq!(tally.total_units, 3);
    assert_eq!(tally.translated_units, 3);
}

#[test]
fn html_table_keep_tags_together() {
    let options = RendererOptions {
        keep_literals_together: true,
        parse_html: true,
        keep_html_tags_together: ["br", "b", "i", "code", "strong", "em", "a"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        ..Default::default()
    };
    let markdown = "<table>\n<tbody>\n<tr>\n<td>\nText 1\n</td>\n<td>\nText 2\n</td></tr>\n\
                    <tr>\n<td>\nText 3\n</td>\n<td>\n</td></tr>\n</tbody>\n</table>";
    let (output, tally) = translate_with(markdown, &HashMap::new(), true, &options);
    assert_eq!(output, markdown);
    assert_eq!(tally.total_units, 3);
    assert_eq!(tally.translated_units, 3);
}

#[test]
fn html_image_src_rewritten() {
    let options = RendererOptions {
        parse_html: true,
        image_relative_path: Some("../../".to_string()),
        ..Default::default()
    };
    let (output, tally) = translate_with("<img src=\"images/img.png\">", &HashMap::new(), true, &options);
    assert_eq!(output, "<img src=\"../../images/img.png\">");
    assert_eq!(tally.total_units, 0);
    assert_eq!(tally.translated_units, 0);
}

#[test]
fn entity_unescape_in_translations() {
    let options = RendererOptions {
        trim_translations: true,
        unescape_entities: vec!["&quot;".to_string()],
        ..Default::default()
    };
    let map = lookup_map(&[("Hello \"Hey!\"", "Hello &quot;Hey!&quot;")]);
    let (output, tally) = translate_with("Hello \"Hey!\"", &map, false, &options);
    assert_eq!(output, "Hello \"Hey!\"");
    assert_eq!(tally.translated_units, 1);
}

#[test]
fn links_relative_path() {
    let options = RendererOptions {
        link_relative_path: Some("../".to_string()),
        ..Default::default()
    };
    let markdown = "\n![](./image.png)\n\n[url](./file.md)\n\n[\\[url\\]](./file.md)\n\n[http url](https://www.github.com)";
    let (output, _) = translate_with(markdown, &HashMap::new(), true, &options);
    assert_eq!(
        output,
        "\n![](../image.png)\n\n[url](../file.md)\n\n[\\[url\\]](../file.md)\n\n[http url](https://www.github.com)"
    );
}

#[test]
fn images_relative_path() {
    let options = RendererOptions {
        image_relative_path: Some("../images".to_string()),
        ..Default::default()
    };
    let markdown = "\n![](./image.png)\n\n[url](./file.md)\n\n[http url](https://www.github.com)";
    let (output, _) = translate_with(markdown, &HashMap::new(), true, &options);
    assert_eq!(
        output,
        "\n![](../images/image.png)\n\n[url](./file.md)\n\n[http url](https://www.github.com)"
    );
}

#[test]
fn both_relative_paths_compose() {
    let options = RendererOptions {
        link_relative_path: Some("../".to_string()),
        image_relative_path: Some("../images/".to_string()),
        ..Default::default()
    };
    let markdown = "\n![](./image.png)\n\n[url](./file.md)";
    let (output, _) = translate_with(markdown, &HashMap::new(), true, &options);
    assert_eq!(output, "\n![](../image.png)\n\n[url](../file.md)");
}

#[test]
fn anchor_links_never_rewritten() {
    let options = RendererOptions {
        link_relative_path: Some("../".to_string()),
        ..Default::default()
    };
    let (output, _) = translate_with("[url](#anchor)", &HashMap::new(), true, &options);
    assert_eq!(output, "[url](#anchor)");
}

#[test]
fn image_alt_translated_and_path_rewritten() {
    let options = RendererOptions {
        image_relative_path: Some("../../../original-doc-path/".to_string()),
        ..Default::default()
    };
    let map = lookup_map(&[("abc", "cba")]);
    let (output, _) = translate_with("![abc](./images/some-image.png)", &map, true, &options);
    assert_eq!(
        output,
        "![cba](../../../original-doc-path/images/some-image.png)"
    );
}

#[test]
fn trailing_image_alt_rendered_in_place() {
    let options = RendererOptions {
        image_relative_path: Some("../../../original-doc-path/".to_string()),
        ..Default::default()
    };
    let map = lookup_map(&[("abc", "cba"), ("The image", "egami ehT")]);
    let (output, _) = translate_with("The image ![abc](./images/some-image.png)", &map, true, &options);
    assert_eq!(
        output,
        "egami ehT ![cba](../../../original-doc-path/images/some-image.png)"
    );
}

#[test]
fn table_newline_replaced_with_br() {
    let options = RendererOptions {
        enable_pipe_tables: true,
        replace_newline_inside_table: true,
        ..Default::default()
    };
    let map = lookup_map(&[
        ("A", "A"),
        ("B", "B"),
        ("x<br/>y", "x\ny"),
        ("z", "z"),
    ]);
    let (output, _) = translate_with("A | B\n---|---\nx<br/>y | z", &map, true, &options);
    assert_eq!(output, "A | B\n---|---\nx<br />y | z");
}

#[test]
fn heading_newline_replaced_with_br() {
    let options = RendererOptions {
        replace_newline_inside_heading: true,
        ..Default::default()
    };
    let map = lookup_map(&[("Line<br>Second", "Linha\nSegunda")]);
    let (output, _) = translate_with("## Line<br>Second", &map, true, &options);
    assert_eq!(output, "## Linha<br />Segunda");
}

#[test]
fn front_matter_mutations() {
    let options = RendererOptions {
        enable_front_matter: true,
        front_matter_source_key: Some("source".to_string()),
        update_front_matter_locale: true,
        extra_front_matter_keys: vec![("generator".to_string(), "markdown-translator".to_string())],
        ..Default::default()
    };
    let map = pt_map();
    let lookup = move |unit: &TranslationUnit| {
        map.get(&unit.text)
            .cloned()
            .or_else(|| Some(unit.text.clone()))
    };
    let (output, _) = translate(
        "---\ntag: Hello\n---\n\n# Heading",
        &lookup,
        Some("docs/pt/guide.md"),
        Some("docs/en/guide.md"),
        Some("pt-PT"),
        &options,
    )
    .unwrap();
    assert_eq!(
        output,
        "---\ntag: Olá\nsource: docs/en/guide.md\nlocale: pt-PT\ngenerator: markdown-translator\n---\n\n# Título"
    );
}

#[test]
fn invalid_filter_pattern_is_reported() {
    let options = RendererOptions {
        ignore_patterns: vec!["(unclosed".to_string()],
        ..Default::default()
    };
    let lookup = |_: &TranslationUnit| None;
    let result = translate("# Heading", &lookup, None, None, None, &options);
    assert!(matches!(result, Err(RenderError::Pattern(_))));
}
