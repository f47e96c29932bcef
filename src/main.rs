use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use navforge::navtree::DEFAULT_CONFIG_PATH;
use navforge::{DocSite, ExportFormat, NavConfig, NavIndex, Result, TreeStyle, Validator};
use tracing_subscriber::EnvFilter;

/// 🧭 navforge - 文档导航索引工具
#[derive(Parser)]
#[command(name = "navforge")]
#[command(about = "读取、校验和导出文档工具生成的导航索引脚本")]
#[command(version)]
struct Args {
    /// 导航脚本、文档目录或zip压缩包
    #[arg(required_unless_present = "init_config", help = "导航脚本(.js)、文档输出目录或其zip压缩包")]
    path: Option<String>,

    /// 详细输出模式
    #[arg(short, long, help = "显示详细信息并输出调试日志")]
    verbose: bool,

    /// 显示统计信息
    #[arg(short, long, help = "显示索引统计信息")]
    stats: bool,

    /// 显示导航树
    #[arg(short, long, help = "显示导航树结构")]
    tree: bool,

    /// 列出所有链接
    #[arg(short, long, help = "按先序列出所有限定名和链接")]
    links: bool,

    /// 校验索引结构
    #[arg(long, help = "校验索引结构，发现错误时以非零状态退出")]
    validate: bool,

    /// 检查链接
    #[arg(long, help = "检查链接指向的页面和锚点是否存在")]
    check_links: bool,

    /// 展开延迟子表
    #[arg(long, help = "加载并展开延迟子表脚本")]
    resolve: bool,

    /// 索引脚本名
    #[arg(long, help = "站点中的索引脚本名（不含.js），默认取配置")]
    script: Option<String>,

    /// 按限定名查找节点
    #[arg(long, help = "按限定名查找节点，例如 Biodiverse::GUI::Tabs::Spatial")]
    find: Option<String>,

    /// 导航树显示样式
    #[arg(long, value_enum, help = "导航树的显示样式")]
    style: Option<StyleArg>,

    /// 导航树最大显示深度
    #[arg(long, help = "导航树最大显示深度")]
    max_depth: Option<usize>,

    /// 导出格式
    #[arg(long, value_enum, help = "导出格式")]
    export: Option<FormatArg>,

    /// 导出文件路径
    #[arg(short, long, help = "导出文件路径（默认输出到标准输出）")]
    output: Option<PathBuf>,

    /// 配置文件路径
    #[arg(long, help = "配置文件路径（默认读取当前目录下的 navforge.yaml）")]
    config: Option<PathBuf>,

    /// 生成默认配置文件
    #[arg(long, help = "生成默认配置文件后退出")]
    init_config: bool,
}

/// 导航树显示样式
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum StyleArg {
    /// 树状符号
    Tree,
    /// 缩进列表
    Indented,
}

impl From<StyleArg> for TreeStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Tree => TreeStyle::TreeSymbols,
            StyleArg::Indented => TreeStyle::Indented,
        }
    }
}

/// 导出格式
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Js,
    Json,
    Yaml,
    Xml,
}

impl From<FormatArg> for ExportFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Js => ExportFormat::Js,
            FormatArg::Json => ExportFormat::Json,
            FormatArg::Yaml => ExportFormat::Yaml,
            FormatArg::Xml => ExportFormat::Xml,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.init_config {
        let path = args.config.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        return match NavConfig::generate_default_config(&path) {
            Ok(()) => {
                println!("📝 已生成默认配置文件: {}", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ 错误: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    // 导出到标准输出时只输出导出内容
    let quiet = args.export.is_some() && args.output.is_none();
    if !quiet {
        println!("🧭 navforge - 文档导航索引工具");
    }

    match process(&args, quiet, &mut io::stdout(), &mut io::stderr()) {
        Ok(true) => {
            if !quiet {
                println!("🎉 处理完成！");
            }
            ExitCode::SUCCESS
        }
        Ok(false) => {
            eprintln!("⚠️  检查未通过");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("❌ 错误: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// 读取配置并应用命令行覆盖
fn load_config(args: &Args) -> Result<NavConfig> {
    let mut config = match &args.config {
        Some(path) => NavConfig::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).is_file() => NavConfig::from_file(DEFAULT_CONFIG_PATH)?,
        None => NavConfig::default_config(),
    };

    if let Some(script) = &args.script {
        config.index_script = script.clone();
    }
    if args.resolve {
        config.resolve_deferred = true;
    }
    if let Some(style) = args.style {
        config.display.style = style.into();
    }
    if args.max_depth.is_some() {
        config.display.max_depth = args.max_depth;
    }
    Ok(config)
}

/// 打开站点并读取索引
///
/// 路径是 `.js` 文件时，以其所在目录作为站点根目录、文件名作为脚本名。
fn open_index(path: &str, config: &mut NavConfig) -> Result<(DocSite, NavIndex)> {
    let path = Path::new(path);
    let mut site = if path.is_file() && path.extension().is_some_and(|ext| ext == "js") {
        if let Some(stem) = path.file_stem() {
            config.index_script = stem.to_string_lossy().into_owned();
        }
        DocSite::from_dir(path.parent().unwrap_or(Path::new(".")))
    } else {
        DocSite::open(path)?
    };

    let index = site.open_index(config)?;
    Ok((site, index))
}

/// 执行命令；导出到标准输出时，其余各部分写到 `stderr`
fn process(args: &Args, quiet: bool, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<bool> {
    let mut config = load_config(args)?;
    let Some(path) = args.path.as_deref() else {
        return Ok(true);
    };

    let (mut site, index) = open_index(path, &mut config)?;
    let mut passed = true;

    let out: &mut dyn Write = if quiet { &mut *stderr } else { &mut *stdout };

    if !quiet {
        writeln!(out, "\n📄 索引脚本: {}.js", config.index_script)?;
        if let Some(name) = &index.name {
            writeln!(out, "  变量名: {}", name)?;
        }
        writeln!(out, "  根节点: {} 个, 节点总数: {} 个", index.roots().len(), index.node_count())?;
        let deferred = index.deferred_scripts();
        if !deferred.is_empty() {
            writeln!(out, "  未展开的子表: {} 个（使用 --resolve 展开）", deferred.len())?;
        }
    }

    if args.stats {
        writeln!(out, "\n📊 {}", index.statistics())?;
    }

    if args.tree {
        display_tree(out, &index, &config, args.verbose)?;
    }

    if args.links {
        display_links(out, &index)?;
    }

    if let Some(name) = &args.find {
        display_found(out, &mut site, &index, name, args.verbose)?;
    }

    if args.validate && !display_validation(out, &index, &config)? {
        passed = false;
    }

    if args.check_links && !display_link_check(out, &mut site, &index, args.verbose)? {
        passed = false;
    }

    if let Some(format) = args.export {
        let content = index.export(format.into())?;
        match &args.output {
            Some(output) => {
                fs::write(output, content)?;
                writeln!(out, "\n💾 已导出到: {}", output.display())?;
            }
            None => writeln!(stdout, "{}", content)?,
        }
    }

    Ok(passed)
}

/// 显示导航树
fn display_tree(out: &mut dyn Write, index: &NavIndex, config: &NavConfig, verbose: bool) -> Result<()> {
    writeln!(out, "\n🌳 导航树:")?;
    let stats = index.statistics();
    writeln!(out, "  📊 {}", stats)?;

    let view = index
        .view()
        .with_style(config.display.style)
        .with_show_links(verbose || config.display.show_links)
        .with_max_depth(config.display.max_depth);
    writeln!(out, "\n{}", view)?;
    Ok(())
}

/// 列出所有链接
fn display_links(out: &mut dyn Write, index: &NavIndex) -> Result<()> {
    writeln!(out, "\n🔗 链接列表:")?;
    for (i, (name, node)) in index.qualified_names().iter().enumerate() {
        match &node.link {
            Some(link) => writeln!(out, "  {}. {} -> {}", i + 1, name, link)?,
            None => writeln!(out, "  {}. {} (分组)", i + 1, name)?,
        }
    }
    Ok(())
}

/// 按限定名查找并显示节点
fn display_found(
    out: &mut dyn Write,
    site: &mut DocSite,
    index: &NavIndex,
    name: &str,
    verbose: bool,
) -> Result<()> {
    writeln!(out, "\n🔍 查找: {}", name)?;
    let Some(node) = index.find_by_qualified_name(name) else {
        writeln!(out, "  ❌ 未找到节点")?;
        return Ok(());
    };

    writeln!(out, "  标签: {}", node.label)?;
    match &node.link {
        Some(link) => writeln!(out, "  链接: {}", link)?,
        None => writeln!(out, "  链接: 无（分组节点）")?,
    }
    if let Some(script) = node.deferred_script() {
        writeln!(out, "  延迟子表: {}.js", script)?;
    }
    writeln!(out, "  子节点: {} 个", node.child_nodes().len())?;

    if verbose {
        for child in node.child_nodes() {
            writeln!(out, "    • {}", child.label)?;
        }
    }

    if let Some(page) = node.page() {
        match site.page_summary(page) {
            Ok(summary) => {
                if let Some(title) = summary.title {
                    writeln!(out, "  页面标题: {}", title)?;
                }
                writeln!(out, "  页面锚点: {} 个", summary.anchors.len())?;
            }
            Err(e) => writeln!(out, "  ⚠️  无法读取页面: {}", e)?,
        }
    }
    Ok(())
}

/// 显示校验结果，返回是否通过
fn display_validation(out: &mut dyn Write, index: &NavIndex, config: &NavConfig) -> Result<bool> {
    writeln!(out, "\n✅ 结构校验:")?;
    let report = Validator::new(config.validation.clone()).validate(index);
    writeln!(
        out,
        "  检查节点: {} 个, 错误: {} 个, 警告: {} 个",
        report.checked_nodes,
        report.errors().count(),
        report.warnings().count()
    )?;
    for issue in &report.issues {
        writeln!(out, "  {}", issue)?;
    }
    Ok(report.is_valid())
}

/// 显示链接检查结果，返回是否全部有效
fn display_link_check(out: &mut dyn Write, site: &mut DocSite, index: &NavIndex, verbose: bool) -> Result<bool> {
    writeln!(out, "\n🔗 链接检查:")?;
    let report = site.check_links(index)?;
    writeln!(
        out,
        "  检查链接: {} 个, 跳过外部链接: {} 个",
        report.checked, report.skipped
    )?;
    writeln!(
        out,
        "  缺失页面: {} 个, 缺失锚点: {} 个, 无法读取: {} 个",
        report.missing_pages.len(),
        report.missing_anchors.len(),
        report.unreadable_pages.len()
    )?;

    if verbose || !report.is_clean() {
        for broken in &report.missing_pages {
            writeln!(out, "    ❌ {} -> {} (页面不存在)", broken.qualified_name, broken.link)?;
        }
        for broken in &report.missing_anchors {
            writeln!(out, "    ⚠️  {} -> {} (锚点不存在)", broken.qualified_name, broken.link)?;
        }
        for broken in &report.unreadable_pages {
            writeln!(out, "    ⚠️  {} -> {} (页面无法读取)", broken.qualified_name, broken.link)?;
        }
    }

    Ok(report.is_clean())
}
