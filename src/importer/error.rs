// ==========================================
// CO2 计费工具 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .csv/.xlsx/.xls/.xlsm/.ods）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("文件无表头: {0}")]
    MissingHeader(String),

    // ===== 列映射错误 =====
    #[error("必需列缺失 ({file}): {columns:?}")]
    MissingColumns { file: String, columns: Vec<String> },

    #[error("因子文件表头不匹配，期望 {expected}，实际 {found:?}")]
    FactorHeaderMismatch { expected: String, found: Vec<String> },

    // ===== 结果为空 =====
    #[error("没有可用的账单文件（已排除 {excluded} 个）: {reasons}")]
    NoValidBillingFiles { excluded: usize, reasons: String },

    #[error("未提供账单文件")]
    NoInputFiles,

    #[error("因子文件无有效条目: {0}")]
    NoValidFactors(String),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
