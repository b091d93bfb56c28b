// ==========================================
// CO2 计费工具 - 碳排放领域模型
// ==========================================
// 职责: 排放因子表、富化结果、处理汇总
// ==========================================

use crate::domain::billing::BillingLine;
use crate::domain::table::{unique_column_name, Cell, Table};
use crate::domain::types::{DqViolation, COL_EMISSION, COL_FACTOR};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

/// 因子附加列与账单列或保留列重名时追加的后缀
pub const FACTOR_COLUMN_SUFFIX: &str = "_facteur";
/// 账单列与保留列重名时追加的后缀
pub const BILLING_COLUMN_SUFFIX: &str = "_facture";

/// 结果表末尾的保留列
const RESERVED_COLUMNS: [&str; 2] = [COL_FACTOR, COL_EMISSION];

// ==========================================
// EmissionFactor - 单条排放因子
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmissionFactor {
    pub article_number: String,          // 物料号（已清洗）
    pub factor: f64,                     // 排放因子（>= 0）
    pub extras: HashMap<String, String>, // 附加列（如 CM、Nom_Cat）
    pub row_number: usize,               // 配置文件行号
}

// ==========================================
// EmissionFactorTable - 排放因子表
// ==========================================
// 物料号唯一；重复项在加载阶段已剔除
#[derive(Debug, Clone, Default, Serialize)]
pub struct EmissionFactorTable {
    pub source: String,
    pub extra_columns: Vec<String>,
    pub entries: Vec<EmissionFactor>,
    pub violations: Vec<DqViolation>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl EmissionFactorTable {
    pub fn new(
        source: impl Into<String>,
        extra_columns: Vec<String>,
        entries: Vec<EmissionFactor>,
        violations: Vec<DqViolation>,
    ) -> Self {
        let mut index = HashMap::with_capacity(entries.len());
        for (pos, entry) in entries.iter().enumerate() {
            index.entry(entry.article_number.clone()).or_insert(pos);
        }
        Self {
            source: source.into(),
            extra_columns,
            entries,
            violations,
            index,
        }
    }

    pub fn lookup(&self, article_number: &str) -> Option<&EmissionFactor> {
        self.index.get(article_number).map(|&pos| &self.entries[pos])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ==========================================
// EnrichedLine - 带排放量的账单行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedLine {
    pub line: BillingLine,
    pub factor: f64,
    pub factor_extras: HashMap<String, String>,
    pub emission_co2: f64,
}

// ==========================================
// EnrichedTable - 连接结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnrichedTable {
    pub billing_columns: Vec<String>,
    pub factor_columns: Vec<String>,
    pub lines: Vec<EnrichedLine>,
}

impl EnrichedTable {
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total_emission_co2(&self) -> f64 {
        self.lines.iter().map(|l| l.emission_co2).sum()
    }

    /// 输出列名：账单列 + 因子附加列 + 因子 + 排放量
    ///
    /// 保留列名只出现在末尾；重名的账单列追加 `_facture`，
    /// 重名的因子附加列追加 `_facteur`，仍冲突时再编号
    pub fn output_columns(&self) -> Vec<String> {
        let mut taken: HashSet<String> = RESERVED_COLUMNS.iter().map(|c| c.to_string()).collect();
        let mut columns = Vec::with_capacity(self.billing_columns.len() + self.factor_columns.len() + 2);

        for column in &self.billing_columns {
            let base = if taken.contains(column) {
                format!("{}{}", column, BILLING_COLUMN_SUFFIX)
            } else {
                column.clone()
            };
            let name = unique_column_name(&base, &taken);
            taken.insert(name.clone());
            columns.push(name);
        }

        for extra in &self.factor_columns {
            let base = if taken.contains(extra) {
                format!("{}{}", extra, FACTOR_COLUMN_SUFFIX)
            } else {
                extra.clone()
            };
            let name = unique_column_name(&base, &taken);
            taken.insert(name.clone());
            columns.push(name);
        }

        columns.extend(RESERVED_COLUMNS.iter().map(|c| c.to_string()));
        columns
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new(self.output_columns());
        for enriched in &self.lines {
            let mut row: Vec<Cell> = self
                .billing_columns
                .iter()
                .map(|c| enriched.line.cell(c))
                .collect();
            for extra in &self.factor_columns {
                row.push(
                    enriched
                        .factor_extras
                        .get(extra)
                        .map(|v| Cell::text(v))
                        .unwrap_or(Cell::Empty),
                );
            }
            row.push(Cell::Number(enriched.factor));
            row.push(Cell::Number(enriched.emission_co2));
            table.push_row(row);
        }
        table
    }
}

// ==========================================
// ProcessSummary - 连接处理汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessSummary {
    pub merged_rows: usize,                  // 连接前行数
    pub matched_rows: usize,                 // 找到因子的行数
    pub unmatched_rows: usize,               // 无因子被过滤的行数
    pub unmatched_articles: BTreeSet<String>, // 无因子的物料号（去重）
    pub total_emission_co2: f64,             // 排放总量
}
