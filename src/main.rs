// ==========================================
// CO2 计费工具 - 命令行入口
// ==========================================
// 职责: 解析命令行参数，驱动会话完成导入/处理/导出
// 子命令: process / preview / factors / config
// ==========================================

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use co2_billing::app::render_table;
use co2_billing::config::{AppConfig, ConfigManager};
use co2_billing::domain::{LoadReport, ProcessSummary};
use co2_billing::engine::OutOfPeriodInfo;
use co2_billing::i18n::{self, t, t_with_args};
use co2_billing::{logging, PreviewView, Session, APP_NAME, VERSION};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Parser)]
#[command(name = "co2-billing", version)]
#[command(about = "Import billing files, map CO2 emission factors and export the result", long_about = None)]
struct Cli {
    /// 配置文件路径（默认使用系统配置目录）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 输出详细日志
    #[arg(short, long, global = true)]
    verbose: bool,

    /// 界面语言（zh-CN / en / fr）
    #[arg(long, global = true)]
    lang: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load billing files and factors, compute emissions and export.
    Process(ProcessArgs),

    /// Load billing files and print the first rows.
    Preview {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(long, default_value_t = 20)]
        rows: usize,
    },

    /// Validate an emission factor file.
    Factors { file: PathBuf },

    /// Inspect or create the configuration file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args)]
struct ProcessArgs {
    /// 账单文件（.csv / .xlsx）
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// 排放因子表
    #[arg(long)]
    factors: PathBuf,

    /// 只保留该年份的发票
    #[arg(long, conflicts_with_all = ["from", "to"])]
    year: Option<i32>,

    /// 期间起始日期（YYYY-MM-DD，含）
    #[arg(long)]
    from: Option<NaiveDate>,

    /// 期间结束日期（YYYY-MM-DD，含）
    #[arg(long)]
    to: Option<NaiveDate>,

    /// 结果输出文件（.csv / .xlsx）
    #[arg(short = 'o', long)]
    out: Option<PathBuf>,

    /// 期间外账单输出文件
    #[arg(long)]
    out_of_period: Option<PathBuf>,

    /// JSON 处理报告
    #[arg(long)]
    report: Option<PathBuf>,

    /// 在终端预览结果前 N 行
    #[arg(long)]
    preview: Option<usize>,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration.
    Show,
    /// Write the default configuration file.
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Print the configuration file path.
    Path,
}

/// JSON 报告内容
#[derive(Serialize)]
struct ProcessReport<'a> {
    load: Option<&'a LoadReport>,
    summary: Option<&'a ProcessSummary>,
    out_of_period: Option<OutOfPeriodInfo>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let manager = match &cli.config {
        Some(path) => ConfigManager::new(path),
        None => ConfigManager::with_default_path()?,
    };
    let config = manager
        .load()
        .with_context(|| format!("无法加载配置 {}", manager.path().display()))?;

    logging::init(cli.verbose || config.show_detailed_logs, config.log_json);
    i18n::set_locale(cli.lang.as_deref().unwrap_or(&config.locale));
    debug!(app = APP_NAME, version = VERSION, config = %manager.path().display(), "配置已加载");

    match cli.cmd {
        Commands::Process(args) => run_process(config, args),
        Commands::Preview { files, rows } => run_preview(config, &files, rows),
        Commands::Factors { file } => run_factors(config, &file),
        Commands::Config { action } => run_config(&manager, config, action),
    }
}

fn run_process(config: AppConfig, args: ProcessArgs) -> Result<()> {
    let mut session = Session::new(config);

    if let Some(year) = args.year {
        session.set_period(
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(year, 12, 31),
        )?;
    } else if args.from.is_some() || args.to.is_some() {
        session.set_period(args.from, args.to)?;
    }

    add_billing_files(&mut session, &args.files)?;

    let factors = session.load_factors(&args.factors)?;
    print_factor_status(factors.len(), factors.violations.len());

    let summary = session.process()?;
    println!(
        "{}",
        t_with_args(
            "process.done",
            &[
                ("matched", &summary.matched_rows.to_string()),
                ("total", &summary.merged_rows.to_string()),
                ("unmatched", &summary.unmatched_rows.to_string()),
            ],
        )
    );
    println!(
        "{}",
        t_with_args(
            "process.total_emission",
            &[("total", &summary.total_emission_co2.to_string())]
        )
    );
    if !summary.unmatched_articles.is_empty() {
        let articles: Vec<&str> = summary.unmatched_articles.iter().map(String::as_str).collect();
        println!(
            "{}",
            t_with_args("process.unmatched_articles", &[("articles", &articles.join(", "))])
        );
    }

    if let Some(rows) = args.preview {
        if let Some(table) = session.preview(PreviewView::Result, rows) {
            println!("{}", render_table(&table));
        }
    }

    if let Some(out) = &args.out {
        session.export_result(out)?;
        print_path("export.done", out);
    }

    if let Some(out) = &args.out_of_period {
        if session.out_of_period_info().is_some() {
            session.export_out_of_period(out)?;
            print_path("export.done", out);
        } else {
            print_path("export.no_out_of_period", out);
        }
    }

    if let Some(path) = &args.report {
        let report = ProcessReport {
            load: session.load_report(),
            summary: session.summary(),
            out_of_period: session.out_of_period_info(),
        };
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json).with_context(|| format!("无法写入报告 {}", path.display()))?;
        print_path("export.report_written", path);
    }

    Ok(())
}

fn run_preview(config: AppConfig, files: &[PathBuf], rows: usize) -> Result<()> {
    let mut session = Session::new(config);
    add_billing_files(&mut session, files)?;

    if let Some(table) = session.preview(PreviewView::Billing, rows) {
        println!("{}", render_table(&table));
    }
    Ok(())
}

fn run_factors(config: AppConfig, file: &Path) -> Result<()> {
    let mut session = Session::new(config);
    let factors = session.load_factors(file)?;
    print_factor_status(factors.len(), factors.violations.len());

    for violation in &factors.violations {
        println!(
            "  [{}] {}:{} {}",
            violation.level, violation.source, violation.row_number, violation.message
        );
    }
    Ok(())
}

fn run_config(manager: &ConfigManager, config: AppConfig, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Init { force } => {
            if manager.init_default(force)? {
                print_path("config.saved", manager.path());
            } else {
                print_path("config.exists", manager.path());
            }
        }
        ConfigAction::Path => {
            println!("{}", manager.path().display());
        }
    }
    Ok(())
}

/// 添加账单文件并打印加载情况
fn add_billing_files(session: &mut Session, files: &[PathBuf]) -> Result<()> {
    for file in files.iter().filter(|f| !f.is_file()) {
        eprintln!("{}", t_with_args("import.file_not_found", &[("path", &file.display().to_string())]));
    }

    let added = session.add_files(files)?;
    if added == 0 {
        bail!(t("import.no_files"));
    }
    println!("{}", t_with_args("import.files_added", &[("count", &added.to_string())]));

    if let Some(report) = session.load_report() {
        print_load_report(report);
    }
    if let Some(info) = session.out_of_period_info() {
        println!(
            "{}",
            t_with_args(
                "period.out_of_period",
                &[("rows", &info.rows.to_string()), ("files", &info.files.to_string())],
            )
        );
    }
    Ok(())
}

fn print_load_report(report: &LoadReport) {
    println!(
        "{}",
        t_with_args(
            "import.billing_loaded",
            &[
                ("rows", &report.loaded_rows.to_string()),
                ("files", &report.included_count().to_string()),
            ],
        )
    );
    for excluded in &report.excluded_files {
        eprintln!(
            "{}",
            t_with_args(
                "import.file_excluded",
                &[("path", &excluded.path), ("reason", &excluded.reason)],
            )
        );
    }
    if report.dropped_rows() > 0 {
        eprintln!(
            "{}",
            t_with_args("import.rows_dropped", &[("count", &report.dropped_rows().to_string())])
        );
    }
}

fn print_factor_status(loaded: usize, skipped: usize) {
    println!("{}", t_with_args("import.factors_loaded", &[("count", &loaded.to_string())]));
    if skipped > 0 {
        eprintln!("{}", t_with_args("import.factors_skipped", &[("count", &skipped.to_string())]));
    }
}

fn print_path(key: &str, path: &Path) {
    println!("{}", t_with_args(key, &[("path", &path.display().to_string())]));
}
