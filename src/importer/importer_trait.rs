// ==========================================
// CO2 计费工具 - 导入组件 Trait 定义
// ==========================================
// 职责: 文件解析 / 数据清洗的可替换接口
// ==========================================

use crate::importer::error::ImportResult;
use std::collections::HashMap;
use std::path::Path;

// ==========================================
// RawSheet - 解析后的原始表
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    pub source: String,          // 来源文件路径
    pub headers: Vec<String>,    // 表头（已 trim，忽略空表头）
    pub records: Vec<RawRecord>, // 数据行（已跳过全空行）
    pub encoding: Option<String>, // 文本编码（仅 CSV）
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub row_number: usize,               // 源文件行号（表头为第 1 行）
    pub values: HashMap<String, String>, // 表头 → 单元格文本（已 trim）
}

impl RawRecord {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(|v| v.as_str())
    }
}

// ==========================================
// FileParser Trait
// ==========================================
pub trait FileParser: Send + Sync {
    /// 解析文件为原始表
    fn parse(&self, file_path: &Path) -> ImportResult<RawSheet>;
}

// ==========================================
// DataCleaner Trait
// ==========================================
pub trait DataCleaner: Send + Sync {
    /// 宽松数值解析（千分位/小数逗号/货币符号）
    fn parse_float(&self, value: &str) -> Option<f64>;

    /// 物料号标准化
    fn clean_article_number(&self, value: &str) -> String;
}
