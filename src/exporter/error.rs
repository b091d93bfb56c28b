// ==========================================
// CO2 计费工具 - 导出模块错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("导出格式不支持: '{0}'（请选择 .csv 或 .xlsx）")]
    UnsupportedFormat(String),

    #[error("输出目录不存在: {0}")]
    DirectoryNotFound(String),

    #[error("行数超出 Excel 上限: {0}")]
    TooManyRows(usize),

    #[error("列数超出 Excel 上限: {0}")]
    TooManyColumns(usize),

    #[error("文件写入失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV 写入失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("Excel 写入失败: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

pub type ExportResult<T> = Result<T, ExportError>;
