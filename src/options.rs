//! 渲染器配置
//!
//! 一次遍历的不可变配置快照。配置通过构造函数显式传入每次遍历，
//! 不存在进程级的全局解析器状态；同一配置可以在并发遍历之间只读共享。

use serde::Deserialize;

/// 渲染器配置选项
///
/// 功能开关直接映射到 Markdown 解析器的扩展选项；
/// 字符串过滤器是按顺序应用的正则列表，忽略模式优先于包含模式。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RendererOptions {
    /// 启用 YAML Front Matter
    pub enable_front_matter: bool,

    /// 启用 GitHub 风格任务列表
    pub enable_task_lists: bool,

    /// 启用 GitHub 风格管道表格
    pub enable_pipe_tables: bool,

    /// 启用自定义属性（映射到解析器的标题属性扩展）
    pub enable_custom_attributes: bool,

    /// 启用定义列表
    pub enable_definition_lists: bool,

    /// 解析 Markdown 中内嵌的 HTML 块
    pub parse_html: bool,

    /// 跳过图片替代文本
    pub skip_image_alt: bool,

    /// Front Matter 中不参与翻译的键
    pub front_matter_exclude: Vec<String>,

    /// 匹配任一忽略模式的字符串不会成为翻译单元（优先于包含模式）
    pub ignore_patterns: Vec<String>,

    /// 非空时，只有匹配任一包含模式的字符串才会成为翻译单元
    pub only_patterns: Vec<String>,

    /// 相邻的内联字面量合并为一个翻译单元
    pub keep_literals_together: bool,

    /// 内嵌 HTML 中，后代标签全部属于该集合的子树作为一个翻译单元保留
    pub keep_html_tags_together: Vec<String>,

    /// 表格内的译文换行替换为 `<br />`
    pub replace_newline_inside_table: bool,

    /// 标题内的译文换行替换为 `<br />`
    pub replace_newline_inside_heading: bool,

    /// 图片相对路径前缀，翻译输出中的相对图片目标会与其合并
    pub image_relative_path: Option<String>,

    /// 链接相对路径前缀，翻译输出中的相对链接目标会与其合并
    pub link_relative_path: Option<String>,

    /// 译文写回前先裁剪首尾空白
    pub trim_translations: bool,

    /// 译文写回前反转义的 HTML 实体列表（如 `&quot;`）
    pub unescape_entities: Vec<String>,

    /// Front Matter 中写入源文档路径的键名
    pub front_matter_source_key: Option<String>,

    /// 翻译时把 Front Matter 的 `locale` 键更新为目标语言
    pub update_front_matter_locale: bool,

    /// 翻译时注入 Front Matter 的额外键值对
    pub extra_front_matter_keys: Vec<(String, String)>,

    /// 独立处理原始行：合并单元逐行拆分写回，而不是按一个整体处理。
    /// 引用块内总是临时关闭。
    pub process_raw_lines_independent: bool,
}

impl RendererOptions {
    /// 带目标语言常用默认值的配置
    pub fn for_translation() -> Self {
        RendererOptions {
            enable_front_matter: true,
            enable_pipe_tables: true,
            enable_task_lists: true,
            trim_translations: true,
            ..Default::default()
        }
    }
}
