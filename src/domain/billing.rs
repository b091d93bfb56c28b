// ==========================================
// CO2 计费工具 - 账单领域模型
// ==========================================
// 职责: 账单行、账单表、加载报告
// 生命周期: 加载 → 期间过滤 → 因子连接
// ==========================================

use crate::domain::table::{Cell, Table};
use crate::domain::types::{DqViolation, COL_ARTICLE, COL_PRICE, COL_QUANTITY, COL_SOURCE_FILE};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

// ==========================================
// BillingLine - 账单行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingLine {
    pub source_file: String,             // 来源文件
    pub row_number: usize,               // 原始文件行号
    pub article_number: String,          // 物料号（已清洗）
    pub quantity: f64,                   // 数量（已解析）
    pub price: f64,                      // 净金额（已解析）
    pub values: HashMap<String, String>, // 全部列（映射后列名 → 原始文本）
}

impl BillingLine {
    /// 按列名取值，标准列返回清洗后的值
    pub fn cell(&self, column: &str) -> Cell {
        match column {
            COL_ARTICLE => Cell::text(&self.article_number),
            COL_QUANTITY => Cell::Number(self.quantity),
            COL_PRICE => Cell::Number(self.price),
            COL_SOURCE_FILE => Cell::text(&self.source_file),
            _ => self
                .values
                .get(column)
                .map(|v| Cell::text(v))
                .unwrap_or(Cell::Empty),
        }
    }

    pub fn value(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(|v| v.as_str())
    }
}

// ==========================================
// BillingTable - 合并后的账单表
// ==========================================
// 列 = 所有文件列的并集（首次出现顺序）+ SOURCE_FILE
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillingTable {
    pub columns: Vec<String>,
    pub lines: Vec<BillingLine>,
}

impl BillingTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            lines: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// 追加列（已存在则忽略）
    pub fn add_column(&mut self, column: &str) {
        if !self.has_column(column) {
            self.columns.push(column.to_string());
        }
    }

    /// 去重后的来源文件
    pub fn source_files(&self) -> BTreeSet<&str> {
        self.lines.iter().map(|l| l.source_file.as_str()).collect()
    }

    /// 同列结构的空表
    pub fn empty_like(&self) -> Self {
        Self::new(self.columns.clone())
    }

    /// 按谓词拆分为 (满足, 不满足)，保持行序
    pub fn partition<F>(self, mut predicate: F) -> (BillingTable, BillingTable)
    where
        F: FnMut(&BillingLine) -> bool,
    {
        let mut matched = self.empty_like();
        let mut rest = self.empty_like();
        for line in self.lines {
            if predicate(&line) {
                matched.lines.push(line);
            } else {
                rest.lines.push(line);
            }
        }
        (matched, rest)
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new(self.columns.clone());
        for line in &self.lines {
            table.push_row(self.columns.iter().map(|c| line.cell(c)).collect());
        }
        table
    }
}

// ==========================================
// LoadReport - 账单加载报告
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
    pub batch_id: String,                   // 批次 ID（UUID）
    pub included_files: Vec<IncludedFile>,  // 已加载文件
    pub excluded_files: Vec<ExcludedFile>,  // 被排除文件
    pub violations: Vec<DqViolation>,       // 行级违规明细
    pub total_rows: usize,                  // 已加载文件的总行数
    pub loaded_rows: usize,                 // 有效行数
}

impl LoadReport {
    pub fn included_count(&self) -> usize {
        self.included_files.len()
    }

    pub fn excluded_count(&self) -> usize {
        self.excluded_files.len()
    }

    pub fn dropped_rows(&self) -> usize {
        self.total_rows.saturating_sub(self.loaded_rows)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncludedFile {
    pub path: String,
    pub rows_loaded: usize,
    pub rows_dropped: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedFile {
    pub path: String,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(source: &str, article: &str, quantity: f64) -> BillingLine {
        let mut values = HashMap::new();
        values.insert("DATE_INVOICE".to_string(), "2024-01-05".to_string());
        BillingLine {
            source_file: source.to_string(),
            row_number: 2,
            article_number: article.to_string(),
            quantity,
            price: 10.0,
            values,
        }
    }

    #[test]
    fn test_to_table_uses_parsed_numbers() {
        let mut table = BillingTable::new(vec![
            COL_ARTICLE.to_string(),
            COL_QUANTITY.to_string(),
            "DATE_INVOICE".to_string(),
            "MISSING".to_string(),
            COL_SOURCE_FILE.to_string(),
        ]);
        table.lines.push(line("a.csv", "42", 1.5));

        let out = table.to_table();
        assert_eq!(
            out.rows[0],
            vec![
                Cell::Text("42".to_string()),
                Cell::Number(1.5),
                Cell::Text("2024-01-05".to_string()),
                Cell::Empty,
                Cell::Text("a.csv".to_string()),
            ]
        );
    }

    #[test]
    fn test_partition_keeps_order() {
        let mut table = BillingTable::new(vec![COL_ARTICLE.to_string()]);
        for (i, article) in ["1", "2", "3", "4"].iter().enumerate() {
            table.lines.push(line("a.csv", article, i as f64));
        }

        let (even, odd) = table.partition(|l| l.quantity as usize % 2 == 0);
        let even_ids: Vec<_> = even.lines.iter().map(|l| l.article_number.as_str()).collect();
        assert_eq!(even_ids, vec!["1", "3"]);
        assert_eq!(odd.len(), 2);
        assert_eq!(odd.columns, vec![COL_ARTICLE.to_string()]);
    }

    #[test]
    fn test_source_files_distinct() {
        let mut table = BillingTable::default();
        table.lines.push(line("a.csv", "1", 1.0));
        table.lines.push(line("a.csv", "2", 1.0));
        table.lines.push(line("b.csv", "3", 1.0));
        assert_eq!(table.source_files().len(), 2);
    }
}
