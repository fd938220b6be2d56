//! 转换策略
//!
//! 每次遍历激活且仅激活一个策略：Echo（原样回显，用于校验调度器
//! 能逐字节复现原文）、Extract（抽取翻译单元）、Substitute（注入译文
//! 并统计）。策略只在 `should_transform` 通过后被调用。

use std::collections::BTreeSet;

use crate::options::RendererOptions;

/// 一个翻译单元：一段可替换的原文及其语境
///
/// 遍历期间临时创建，不可变；核心不负责持久化（由调用方序列化到
/// 目录等）。`is_structural` 区分携带 Markdown 语法的单元（可附加
/// 译者注释）与纯叶子文本（如 HTML 文本节点）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationUnit {
    pub text: String,
    /// 上下文标签（元素类型，未分类节点为 None）
    pub context: Option<String>,
    pub reference_file: Option<String>,
    /// 1 起始的行号
    pub reference_line: usize,
    pub is_structural: bool,
}

/// 替换策略的统计结果
#[derive(Debug, Clone, Default)]
pub struct TranslationTally {
    pub total_units: usize,
    pub translated_units: usize,
    /// 缺失译文的原文集合（去重）
    pub missing: BTreeSet<String>,
}

impl TranslationTally {
    /// 翻译完成率（0–100）；没有任何单元时视为完整
    pub fn ratio(&self) -> f64 {
        if self.total_units == 0 {
            100.0
        } else {
            self.translated_units as f64 / self.total_units as f64 * 100.0
        }
    }
}

/// 译文查询函数：`None` 或空串表示没有可用译文
pub type LookupFn<'a> = dyn Fn(&TranslationUnit) -> Option<String> + 'a;

/// 封闭的策略集合
pub enum TransformStrategy<'a> {
    /// 原样返回输入（定点校验）
    Echo,
    /// 记录翻译单元并原样返回输入
    Extract { units: Vec<TranslationUnit> },
    /// 通过外部查询注入译文并统计
    Substitute {
        lookup: &'a LookupFn<'a>,
        tally: TranslationTally,
    },
}

impl TransformStrategy<'_> {
    /// 对一个单元应用当前策略
    ///
    /// 返回 `None` 表示没有可用替换（仅替换策略），由调用方决定
    /// 写空还是报错；回显与抽取永远返回原文。
    pub fn transform(&mut self, unit: TranslationUnit, options: &RendererOptions) -> Option<String> {
        match self {
            TransformStrategy::Echo => Some(unit.text),
            TransformStrategy::Extract { units } => {
                let text = unit.text.clone();
                units.push(unit);
                Some(text)
            }
            TransformStrategy::Substitute { lookup, tally } => {
                tally.total_units += 1;
                let translated = lookup(&unit)
                    .map(|t| clean_translation(t, options))
                    .filter(|t| !t.is_empty());
                match translated {
                    Some(t) => {
                        tally.translated_units += 1;
                        Some(t)
                    }
                    None => {
                        tally.missing.insert(unit.text);
                        None
                    }
                }
            }
        }
    }
}

/// 入站译文清理：按配置裁剪空白并反转义 HTML 实体
fn clean_translation(mut translated: String, options: &RendererOptions) -> String {
    if options.trim_translations {
        translated = translated.trim().to_string();
    }
    for entity in &options.unescape_entities {
        if let Some(replacement) = entity_replacement(entity) {
            if translated.contains(entity.as_str()) {
                translated = translated.replace(entity.as_str(), replacement);
            }
        }
    }
    translated
}

fn entity_replacement(entity: &str) -> Option<&'static str> {
    match entity {
        "&quot;" => Some("\""),
        "&amp;" => Some("&"),
        "&lt;" => Some("<"),
        "&gt;" => Some(">"),
        "&apos;" | "&#39;" => Some("'"),
        "&nbsp;" => Some("\u{a0}"),
        _ => None,
    }
}
