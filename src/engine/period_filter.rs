// ==========================================
// CO2 计费工具 - 发票期间过滤引擎
// ==========================================
// 职责: 按发票日期拆分账单为期间内 / 期间外
// 规则:
// - 起止日期均未设置 → 不过滤
// - 日期列缺失 → 不过滤
// - 边界含端点，缺失一端视为开区间
// - 日期为空或无法解析 → 期间外
// ==========================================

use crate::domain::billing::BillingTable;
use crate::importer::data_cleaner::parse_date;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, instrument, warn};

// ==========================================
// PeriodSplit - 拆分结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSplit {
    pub in_period: BillingTable,
    /// None 表示未执行过滤
    pub out_of_period: Option<BillingTable>,
}

// ==========================================
// OutOfPeriodInfo - 期间外汇总
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutOfPeriodInfo {
    pub rows: usize,  // 期间外行数
    pub files: usize, // 涉及文件数
}

impl OutOfPeriodInfo {
    pub fn from_table(table: &BillingTable) -> Self {
        Self {
            rows: table.len(),
            files: table.source_files().len(),
        }
    }
}

/// 按日期范围拆分账单
///
/// # 参数
/// - table: 账单表
/// - start / end: 起止日期（含），None 为不限
/// - date_column: 发票日期列名
#[instrument(skip(table), fields(rows = table.len()))]
pub fn filter_by_date_range(
    table: BillingTable,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    date_column: &str,
) -> PeriodSplit {
    if start.is_none() && end.is_none() {
        return PeriodSplit {
            in_period: table,
            out_of_period: None,
        };
    }

    if !table.has_column(date_column) {
        warn!(date_column, "日期列不存在，跳过期间过滤");
        return PeriodSplit {
            in_period: table,
            out_of_period: None,
        };
    }

    let before = table.len();
    let (in_period, out_of_period) = table.partition(|line| {
        match line.value(date_column).and_then(parse_date) {
            Some(date) => {
                start.map_or(true, |s| date >= s) && end.map_or(true, |e| date <= e)
            }
            None => false,
        }
    });

    info!(
        before,
        in_period = in_period.len(),
        out_of_period = out_of_period.len(),
        "期间过滤完成"
    );
    PeriodSplit {
        in_period,
        out_of_period: Some(out_of_period),
    }
}

/// 按整年拆分账单
pub fn filter_by_year(table: BillingTable, year: i32, date_column: &str) -> PeriodSplit {
    filter_by_date_range(
        table,
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
        date_column,
    )
}
