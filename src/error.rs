//! 渲染错误类型
//!
//! 提供结构化错误类型，区分输入形状错误、协议不变量错误和配置错误

use thiserror::Error;

/// 渲染/转换过程中的错误类型
///
/// 协议类错误（游标回退、合并行数不匹配）表示内部不变量被破坏，
/// 永远是致命的；输入形状错误（Front Matter 格式错误）对单个文档致命；
/// 无法识别的节点类型不会产生错误，只记录日志。
#[derive(Error, Debug)]
pub enum RenderError {
    /// 游标请求了零长度的读取
    #[error("无效长度: take(0) 不被允许 (偏移 {offset})")]
    InvalidLength { offset: usize },

    /// 游标试图向后移动
    #[error("无效偏移: 目标 {target} 小于当前偏移 {current}")]
    InvalidOffset { target: usize, current: usize },

    /// 合并单元的译文行数与原文行结构不一致
    #[error("译文行数不匹配: 期望 {expected} 行，实际 {actual} 行: {excerpt:?}")]
    LineCountMismatch {
        expected: usize,
        actual: usize,
        excerpt: String,
    },

    /// 合并单元缺少译文（合并单元必须解析出结果）
    #[error("合并单元缺少译文: {excerpt:?}")]
    MissingTranslation { excerpt: String },

    /// Front Matter 解析或序列化失败
    #[error("Front Matter 错误: {0}")]
    FrontMatter(String),

    /// 过滤器正则表达式无效
    #[error("过滤模式无效: {0}")]
    Pattern(#[from] regex::Error),

    /// 目录文件读写或解析失败
    #[error("翻译目录错误: {0}")]
    Catalog(String),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_yaml::Error> for RenderError {
    fn from(error: serde_yaml::Error) -> Self {
        RenderError::FrontMatter(error.to_string())
    }
}

/// 渲染结果类型别名
pub type RenderResult<T> = Result<T, RenderError>;

/// 截取用于错误消息的原文片段
pub(crate) fn excerpt(s: &str) -> String {
    const MAX: usize = 80;
    if s.chars().count() <= MAX {
        s.to_string()
    } else {
        let cut: String = s.chars().take(MAX).collect();
        format!("{cut}…")
    }
}
