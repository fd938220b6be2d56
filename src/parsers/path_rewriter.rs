//! 相对路径重写模块
//!
//! 翻译输出写到与源文档不同的目录时，文档里的相对图片/链接目标
//! 需要指回原始位置。本模块在整个文档转换完成后做一次正则后处理：
//! 链接模式先行，图片模式随后，绝对 URL 和纯锚点目标保持原样。

use std::sync::OnceLock;

use regex::Regex;

use crate::options::RendererOptions;

/// 匹配链接语法 `[label](target "title")`
///
/// 有意不排除图片：图片语法内层的 `[alt](target)` 同样被链接遍
/// 重写，随后图片遍在其结果上再合并图片前缀（两个前缀叠加抵消）。
fn link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\[((?:[^\[\]\\]|\\.)*)\]\(([^()\s]+)((?:\s+"[^"]*")?)\)"#)
            .expect("link pattern is valid")
    })
}

/// 匹配图片语法 `![alt](target "title")`
fn image_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"!\[((?:[^\[\]\\]|\\.)*)\]\(([^()\s]+)((?:\s+"[^"]*")?)\)"#)
            .expect("image pattern is valid")
    })
}

/// 目标是否可重写
///
/// 锚点目标（`#fragment`）必须保持原样；带 scheme 前缀的绝对 URL
/// （`https:`、`mailto:` 等）同样不动。
pub fn is_rewritable_target(target: &str) -> bool {
    if target.is_empty() || target.starts_with('#') {
        return false;
    }
    static SCHEME: OnceLock<Regex> = OnceLock::new();
    let scheme = SCHEME.get_or_init(|| {
        Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*:").expect("scheme pattern is valid")
    });
    !scheme.is_match(target)
}

/// 把前缀与相对目标合并并化简 `.`/`..` 片段
pub fn combine_relative(prefix: &str, target: &str) -> String {
    let joined = if prefix.is_empty() || prefix.ends_with('/') {
        format!("{prefix}{target}")
    } else {
        format!("{prefix}/{target}")
    };
    simplify_relative_path(&joined)
}

/// 化简相对路径中的 `.` 与 `..` 片段
///
/// 开头的 `.` 保留（`./x` 语义不变），`..` 只有在栈顶不是 `..`
/// 的情况下才抵消上一段。
pub fn simplify_relative_path(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    let mut items: Vec<&str> = Vec::new();
    for part in normalized.split('/') {
        if part == "." && !items.is_empty() {
            continue;
        }
        if part == ".." && !items.is_empty() && *items.last().expect("non-empty") != ".." {
            items.pop();
            continue;
        }
        items.push(part);
    }
    items.join("/")
}

/// 对最终输出做一次路径重写
///
/// 先重写链接目标，再重写图片目标；两遍的先后顺序保证图片
/// 先被链接遍产生的中间结果再与图片前缀合并化简。
pub fn rewrite_relative_paths(output: &str, options: &RendererOptions) -> String {
    let mut result = output.to_string();

    if let Some(prefix) = &options.link_relative_path {
        result = link_regex()
            .replace_all(&result, |caps: &regex::Captures| {
                let label = &caps[1];
                let target = &caps[2];
                let title = &caps[3];
                if !is_rewritable_target(target) {
                    return caps[0].to_string();
                }
                format!("[{label}]({}{title})", combine_relative(prefix, target))
            })
            .into_owned();
    }

    if let Some(prefix) = &options.image_relative_path {
        result = image_regex()
            .replace_all(&result, |caps: &regex::Captures| {
                let alt = &caps[1];
                let target = &caps[2];
                let title = &caps[3];
                if !is_rewritable_target(target) {
                    return caps[0].to_string();
                }
                format!("![{alt}]({}{title})", combine_relative(prefix, target))
            })
            .into_owned();
    }

    result
}
