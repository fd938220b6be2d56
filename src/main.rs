//! 命令行入口
//!
//! 两个动作：`generate-pot` 从 Markdown 抽取字符串生成/追加 .pot 目录；
//! `translate` 按 .po 目录翻译 Markdown。输入可以是单个文件或目录
//! （递归处理全部 `*.md`）。单个文件的致命错误只跳过该文件，
//! 不中断整个批次。

use std::fs;
use std::path::{Component, Path, PathBuf};

use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};

use markdown_translator::{catalog, extract_units, RendererOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Action {
    /// 抽取字符串并生成/追加 .pot 目录
    GeneratePot,
    /// 按 .po 目录翻译文档
    Translate,
}

#[derive(Parser, Debug)]
#[command(
    name = "markdown-translator",
    version,
    about = "Extract translatable strings from Markdown and re-inject translations"
)]
struct Cli {
    /// 要执行的动作
    #[arg(short, long, value_enum)]
    action: Action,

    /// 输入文件或目录
    #[arg(short, long)]
    input: PathBuf,

    /// 输出文件或目录
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// .po/.pot 目录文件
    #[arg(long = "po-file")]
    po_file: Option<PathBuf>,

    /// 启用 GitHub 风格任务列表
    #[arg(long = "gfm-task-lists")]
    gfm_task_lists: bool,

    /// 启用 GitHub 风格表格
    #[arg(long = "gfm-tables")]
    gfm_tables: bool,

    /// 启用 YAML Front Matter
    #[arg(long = "gfm-front-matter")]
    gfm_front_matter: bool,

    /// Front Matter 中不参与翻译的键
    #[arg(long = "gfm-front-matter-exclude")]
    front_matter_exclude: Vec<String>,

    /// 忽略图片替代文本
    #[arg(long = "ignore-image-alt")]
    ignore_image_alt: bool,

    /// 启用自定义属性（如 {.css-class}）
    #[arg(long = "custom-attributes")]
    custom_attributes: bool,

    /// 匹配该正则的字符串不参与翻译（可重复）
    #[arg(long = "ignore-pattern")]
    ignore_patterns: Vec<String>,

    /// 只有匹配该正则的字符串才参与翻译（可重复）
    #[arg(long = "include-only-pattern")]
    only_patterns: Vec<String>,

    /// 解析 Markdown 中内嵌的 HTML
    #[arg(long = "parse-html")]
    parse_html: bool,

    /// 相邻内联字面量合并为一个翻译单元
    #[arg(long = "keep-literals-together")]
    keep_literals_together: bool,

    /// 后代标签全部属于该集合的 HTML 子树整体作为一个单元（可重复）
    #[arg(long = "keep-html-tag-together")]
    keep_html_tags_together: Vec<String>,

    /// 表格内的译文换行替换为 <br />
    #[arg(long = "replace-newline-inside-table")]
    replace_newline_inside_table: bool,

    /// 低于该翻译率（0-100）时不写出译文
    #[arg(long = "min-ratio", default_value_t = 0)]
    min_ratio: u8,

    /// 附加到 .pot 条目的译者注释（可重复）
    #[arg(long = "markdown-translator-comment")]
    translator_comments: Vec<String>,

    /// 查不到译文时回退为原文
    #[arg(long = "keep-source-strings")]
    keep_source_strings: bool,

    /// 更新图片相对路径使其指回原始文件
    #[arg(long = "update-image-relative-paths")]
    update_image_relative_paths: bool,

    /// 更新链接相对路径使其指回原始文件
    #[arg(long = "update-links-relative-paths")]
    update_links_relative_paths: bool,
}

impl Cli {
    fn renderer_options(&self) -> RendererOptions {
        let relative_to_source = self
            .output
            .as_ref()
            .filter(|o| !o.as_os_str().is_empty())
            .map(|output| relative_path_between(output, &self.input));

        RendererOptions {
            enable_task_lists: self.gfm_task_lists,
            enable_pipe_tables: self.gfm_tables,
            enable_front_matter: self.gfm_front_matter,
            front_matter_exclude: self.front_matter_exclude.clone(),
            skip_image_alt: self.ignore_image_alt,
            enable_custom_attributes: self.custom_attributes,
            ignore_patterns: self.ignore_patterns.clone(),
            only_patterns: self.only_patterns.clone(),
            parse_html: self.parse_html,
            keep_literals_together: self.keep_literals_together,
            keep_html_tags_together: self.keep_html_tags_together.clone(),
            replace_newline_inside_table: self.replace_newline_inside_table,
            image_relative_path: self
                .update_image_relative_paths
                .then(|| relative_to_source.clone())
                .flatten(),
            link_relative_path: self
                .update_links_relative_paths
                .then(|| relative_to_source.clone())
                .flatten(),
            trim_translations: true,
            ..Default::default()
        }
    }
}

/// 从 `from` 目录指回 `to` 目录的相对路径
fn relative_path_between(from: &Path, to: &Path) -> String {
    let from: Vec<Component> = from.components().collect();
    let to: Vec<Component> = to.components().collect();
    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let mut parts: Vec<String> = from[common..].iter().map(|_| "..".to_string()).collect();
    parts.extend(
        to[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = cli.renderer_options();

    let failures = if cli.input.is_dir() {
        run_directory(&cli, &options)
    } else {
        run_file(&cli, &options, &cli.input, cli.output.as_deref())
    };

    if failures > 0 {
        error!("{failures} 个文件处理失败");
        std::process::exit(1);
    }
}

/// 递归处理目录中的全部 `*.md` 文件
fn run_directory(cli: &Cli, options: &RendererOptions) -> usize {
    let mut failures = 0;
    for entry in walkdir::WalkDir::new(&cli.input)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(&cli.input)
            .unwrap_or(entry.path());
        let output = cli.output.as_ref().map(|o| o.join(relative));
        failures += run_file(cli, options, entry.path(), output.as_deref());
    }
    failures
}

/// 处理单个文件；失败时记录错误并返回 1（调用方继续批次）
fn run_file(cli: &Cli, options: &RendererOptions, input: &Path, output: Option<&Path>) -> usize {
    let result = match cli.action {
        Action::GeneratePot => generate_pot(cli, options, input),
        Action::Translate => translate_file(cli, options, input, output),
    };
    match result {
        Ok(()) => 0,
        Err(e) => {
            error!("{} 处理失败: {e}", input.display());
            1
        }
    }
}

fn generate_pot(
    cli: &Cli,
    options: &RendererOptions,
    input: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let pot_path = cli
        .po_file
        .as_ref()
        .ok_or("generate-pot 需要 --po-file 参数")?;

    let markdown = fs::read_to_string(input)?;
    let units = extract_units(&markdown, input.to_str(), options)?;
    info!("{}: 找到 {} 个字符串", input.display(), units.len());

    let mut pot = if pot_path.exists() {
        catalog::load(pot_path)?
    } else {
        catalog::new_catalog()
    };
    catalog::append_units(&mut pot, &units, &cli.translator_comments);
    if let Some(parent) = pot_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    catalog::save(&pot, pot_path)?;
    Ok(())
}

fn translate_file(
    cli: &Cli,
    options: &RendererOptions,
    input: &Path,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let po_path = cli
        .po_file
        .as_ref()
        .ok_or("translate 需要 --po-file 参数")?;
    let po = catalog::load(po_path)?;

    let markdown = fs::read_to_string(input)?;
    let (translated, tally) = catalog::translate_with_catalog(
        &markdown,
        &po,
        input.to_str(),
        None,
        cli.keep_source_strings,
        options,
    )?;

    info!(
        "{}: 翻译了 {}/{} 个字符串",
        input.display(),
        tally.translated_units,
        tally.total_units
    );

    let ratio = tally.ratio() as u8;
    if ratio < cli.min_ratio {
        warn!(
            "跳过写出 {}: 翻译率 {ratio}% 低于目标 {}%",
            input.display(),
            cli.min_ratio
        );
    } else {
        match output {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        fs::create_dir_all(parent)?;
                    }
                }
                fs::write(path, &translated)?;
            }
            None => print!("{translated}"),
        }
    }

    if !tally.missing.is_empty() {
        warn!("缺少译文:");
        for missing in &tally.missing {
            warn!("  {missing}");
        }
    }
    Ok(())
}
