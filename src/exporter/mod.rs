// ==========================================
// CO2 计费工具 - 导出层
// ==========================================
// 职责: 表格导出为 CSV / Excel
// ==========================================

pub mod csv_exporter;
pub mod error;
pub mod excel_exporter;

pub use csv_exporter::export_to_csv;
pub use error::{ExportError, ExportResult};
pub use excel_exporter::{export_to_excel, DEFAULT_SHEET_NAME};

use crate::domain::table::Table;
use std::path::Path;

// ==========================================
// ExportFormat - 导出格式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    /// 按扩展名识别（忽略大小写）
    pub fn from_path(path: &Path) -> ExportResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" => Ok(ExportFormat::Xlsx),
            _ => Err(ExportError::UnsupportedFormat(ext)),
        }
    }
}

/// 按扩展名导出
pub fn export_table(table: &Table, output_path: &Path, delimiter: u8) -> ExportResult<ExportFormat> {
    let format = ExportFormat::from_path(output_path)?;
    match format {
        ExportFormat::Csv => export_to_csv(table, output_path, delimiter)?,
        ExportFormat::Xlsx => export_to_excel(table, output_path, DEFAULT_SHEET_NAME)?,
    }
    Ok(format)
}

/// 父目录必须存在
pub(crate) fn ensure_parent_dir(path: &Path) -> ExportResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            Err(ExportError::DirectoryNotFound(parent.display().to_string()))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_format_from_path() {
        assert_eq!(ExportFormat::from_path(Path::new("a.csv")).unwrap(), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_path(Path::new("a.XLSX")).unwrap(), ExportFormat::Xlsx);
        assert!(matches!(
            ExportFormat::from_path(Path::new("a.pdf")),
            Err(ExportError::UnsupportedFormat(ext)) if ext == "pdf"
        ));
        assert!(ExportFormat::from_path(Path::new("noext")).is_err());
    }
}
