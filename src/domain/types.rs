// ==========================================
// CO2 计费工具 - 领域类型定义
// ==========================================
// 职责: 内部标准列名、数据质量级别
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 内部标准列名
// ==========================================
// 源文件列经映射后统一为以下名称，导出时保持不变

/// 物料/商品编号（连接键）
pub const COL_ARTICLE: &str = "numero_article";
/// 数量
pub const COL_QUANTITY: &str = "quantite";
/// 净金额
pub const COL_PRICE: &str = "prix";
/// 来源文件（加载时追加）
pub const COL_SOURCE_FILE: &str = "SOURCE_FILE";
/// 碳排放因子
pub const COL_FACTOR: &str = "facteur_emission_co2";
/// 碳排放量（数量 × 因子）
pub const COL_EMISSION: &str = "emission_co2";

/// 文件级违规的字段名
pub const FILE_FIELD: &str = "file";

// ==========================================
// 数据质量级别 (DQ Level)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DqLevel {
    Error,   // 错误（整文件被排除）
    Warning, // 警告（该行被丢弃）
    Info,    // 提示（仅记录）
}

impl fmt::Display for DqLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DqLevel::Error => write!(f, "ERROR"),
            DqLevel::Warning => write!(f, "WARNING"),
            DqLevel::Info => write!(f, "INFO"),
        }
    }
}

// ==========================================
// DqViolation - 数据质量违规记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DqViolation {
    pub source: String,                 // 来源文件
    pub row_number: usize,              // 原始文件行号（含表头，从 2 开始）
    pub article_number: Option<String>, // 物料号（如果可解析）
    pub level: DqLevel,                 // 违规级别
    pub field: String,                  // 违规字段
    pub message: String,                // 违规描述
}

impl DqViolation {
    pub fn warning(
        source: impl Into<String>,
        row_number: usize,
        article_number: Option<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            row_number,
            article_number,
            level: DqLevel::Warning,
            field: field.into(),
            message: message.into(),
        }
    }

    /// 整文件被排除（行号记为 0）
    pub fn file_error(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            row_number: 0,
            article_number: None,
            level: DqLevel::Error,
            field: FILE_FIELD.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dq_level_serde_format() {
        let json = serde_json::to_string(&DqLevel::Warning).unwrap();
        assert_eq!(json, "\"WARNING\"");
        assert_eq!(DqLevel::Error.to_string(), "ERROR");

        let violation = DqViolation::file_error("a.csv", "必需列缺失");
        assert_eq!(violation.level, DqLevel::Error);
        assert_eq!(violation.row_number, 0);
        assert_eq!(violation.field, FILE_FIELD);
    }
}
