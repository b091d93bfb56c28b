// ==========================================
// CO2 计费工具 - 会话状态
// ==========================================
// 职责: 保存一次处理会话的全部状态
// 流程: 选择账单文件 → 加载因子表 → 处理 → 预览/导出
// ==========================================

use crate::app::error::{AppError, AppResult};
use crate::config::AppConfig;
use crate::domain::billing::{BillingTable, LoadReport};
use crate::domain::emission::{EmissionFactorTable, EnrichedTable, ProcessSummary};
use crate::domain::table::Table;
use crate::engine::co2_processor::Co2Processor;
use crate::engine::period_filter::{filter_by_date_range, OutOfPeriodInfo};
use crate::exporter::{export_table, ExportFormat};
use crate::importer::billing_loader::BillingImporter;
use crate::importer::factor_loader::FactorImporter;
use crate::importer::file_parser::is_supported_file;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// 预览数据来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewView {
    Billing,
    OutOfPeriod,
    Result,
}

// ==========================================
// Session - 处理会话
// ==========================================
#[derive(Debug, Default)]
pub struct Session {
    config: AppConfig,
    selected_files: Vec<PathBuf>,
    billing: Option<BillingTable>,
    out_of_period: Option<BillingTable>,
    load_report: Option<LoadReport>,
    factors: Option<EmissionFactorTable>,
    result: Option<EnrichedTable>,
    summary: Option<ProcessSummary>,
}

impl Session {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    // ==========================================
    // 只读访问
    // ==========================================

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn selected_files(&self) -> &[PathBuf] {
        &self.selected_files
    }

    pub fn billing(&self) -> Option<&BillingTable> {
        self.billing.as_ref()
    }

    pub fn out_of_period(&self) -> Option<&BillingTable> {
        self.out_of_period.as_ref()
    }

    pub fn load_report(&self) -> Option<&LoadReport> {
        self.load_report.as_ref()
    }

    pub fn factors(&self) -> Option<&EmissionFactorTable> {
        self.factors.as_ref()
    }

    pub fn result(&self) -> Option<&EnrichedTable> {
        self.result.as_ref()
    }

    pub fn summary(&self) -> Option<&ProcessSummary> {
        self.summary.as_ref()
    }

    // ==========================================
    // 账单文件
    // ==========================================

    /// 添加账单文件
    ///
    /// 仅接受存在且扩展名受支持的文件，重复路径忽略；
    /// 列表非空时重新加载账单
    ///
    /// # 返回
    /// - Ok(usize): 新增文件数
    pub fn add_files<I, P>(&mut self, paths: I) -> AppResult<usize>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut added = 0;
        for path in paths {
            let path = path.as_ref();
            if !path.is_file() {
                warn!(file = %path.display(), "文件不存在，忽略");
                continue;
            }
            if !is_supported_file(path) {
                warn!(file = %path.display(), "文件类型不支持，忽略");
                continue;
            }
            if self.selected_files.iter().any(|p| p == path) {
                continue;
            }
            self.selected_files.push(path.to_path_buf());
            added += 1;
        }

        if !self.selected_files.is_empty() {
            self.load_billing()?;
        }
        Ok(added)
    }

    /// 清空文件列表及账单状态
    pub fn clear_files(&mut self) {
        self.selected_files.clear();
        self.reset_billing();
    }

    fn reset_billing(&mut self) {
        self.billing = None;
        self.out_of_period = None;
        self.load_report = None;
        self.reset_result();
    }

    fn reset_result(&mut self) {
        self.result = None;
        self.summary = None;
    }

    /// 加载已选账单文件并执行期间过滤
    ///
    /// 失败时账单状态清空
    #[instrument(skip(self), fields(files = self.selected_files.len()))]
    pub fn load_billing(&mut self) -> AppResult<&LoadReport> {
        self.reset_billing();

        let importer = BillingImporter::from_config(&self.config);
        let (table, report) = importer.load(&self.selected_files)?;

        let period = &self.config.period;
        if !period.is_enabled() {
            debug!("未设置期间，跳过期间过滤");
            self.billing = Some(table);
            return Ok(self.load_report.insert(report));
        }

        let split = filter_by_date_range(table, period.start, period.end, &period.date_column);
        if let Some(out) = &split.out_of_period {
            if !out.is_empty() {
                let info = OutOfPeriodInfo::from_table(out);
                info!(rows = info.rows, files = info.files, "检测到期间外账单");
            }
        }

        self.billing = Some(split.in_period);
        self.out_of_period = split.out_of_period;
        Ok(self.load_report.insert(report))
    }

    /// 修改期间并在已有文件时重新加载
    pub fn set_period(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> AppResult<()> {
        let mut config = self.config.clone();
        config.period.start = start;
        config.period.end = end;
        config.validate()?;
        self.config = config;

        if !self.selected_files.is_empty() {
            self.load_billing()?;
        }
        Ok(())
    }

    // ==========================================
    // 排放因子表
    // ==========================================

    /// 加载排放因子表，失败时因子状态清空
    pub fn load_factors(&mut self, path: &Path) -> AppResult<&EmissionFactorTable> {
        self.factors = None;
        self.reset_result();

        let table = FactorImporter::from_config(&self.config).load(path)?;
        Ok(self.factors.insert(table))
    }

    // ==========================================
    // 处理与导出
    // ==========================================

    pub fn can_process(&self) -> bool {
        self.billing.is_some() && self.factors.is_some()
    }

    pub fn can_export(&self) -> bool {
        self.result.as_ref().map_or(false, |r| !r.is_empty())
    }

    /// 执行因子连接与排放计算
    pub fn process(&mut self) -> AppResult<&ProcessSummary> {
        let billing = self.billing.as_ref().ok_or(AppError::NoBillingLoaded)?;
        let factors = self.factors.as_ref().ok_or(AppError::NoFactorsLoaded)?;

        let (result, summary) = Co2Processor::new().process(billing, factors);
        self.result = Some(result);
        Ok(self.summary.insert(summary))
    }

    /// 导出处理结果（按扩展名选择 CSV / Excel）
    pub fn export_result(&self, path: &Path) -> AppResult<ExportFormat> {
        let result = self
            .result
            .as_ref()
            .filter(|r| !r.is_empty())
            .ok_or(AppError::NothingToExport)?;
        Ok(export_table(&result.to_table(), path, self.config.delimiter_byte())?)
    }

    /// 期间外账单汇总（无或为空时返回 None）
    pub fn out_of_period_info(&self) -> Option<OutOfPeriodInfo> {
        self.out_of_period
            .as_ref()
            .filter(|t| !t.is_empty())
            .map(OutOfPeriodInfo::from_table)
    }

    /// 导出期间外账单
    pub fn export_out_of_period(&self, path: &Path) -> AppResult<ExportFormat> {
        let table = self
            .out_of_period
            .as_ref()
            .filter(|t| !t.is_empty())
            .ok_or(AppError::NoOutOfPeriodData)?;
        Ok(export_table(&table.to_table(), path, self.config.delimiter_byte())?)
    }

    /// 预览前 limit 行
    pub fn preview(&self, view: PreviewView, limit: usize) -> Option<Table> {
        let table = match view {
            PreviewView::Billing => self.billing.as_ref().map(|t| t.to_table()),
            PreviewView::OutOfPeriod => self.out_of_period.as_ref().map(|t| t.to_table()),
            PreviewView::Result => self.result.as_ref().map(|t| t.to_table()),
        }?;
        Some(table.head(limit))
    }
}
