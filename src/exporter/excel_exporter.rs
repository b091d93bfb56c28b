// ==========================================
// CO2 计费工具 - Excel 导出
// ==========================================
// 格式: .xlsx，表头加粗并冻结，数值写为数值单元格
// ==========================================

use crate::domain::table::{Cell, Table};
use crate::exporter::ensure_parent_dir;
use crate::exporter::error::{ExportError, ExportResult};
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;
use tracing::{error, info};

/// Excel 单表最大行数（含表头）
pub const MAX_ROWS: usize = 1_048_576;
/// Excel 单表最大列数
pub const MAX_COLUMNS: usize = 16_384;
/// 默认工作表名
pub const DEFAULT_SHEET_NAME: &str = "CO2";

/// 导出为 Excel
pub fn export_to_excel(table: &Table, output_path: &Path, sheet_name: &str) -> ExportResult<()> {
    write_workbook(table, output_path, sheet_name)
        .map(|_| info!(path = %output_path.display(), rows = table.len(), "Excel 导出成功"))
        .map_err(|e| {
            error!(path = %output_path.display(), error = %e, "Excel 导出失败");
            e
        })
}

fn write_workbook(table: &Table, output_path: &Path, sheet_name: &str) -> ExportResult<()> {
    if table.len() + 1 > MAX_ROWS {
        return Err(ExportError::TooManyRows(table.len()));
    }
    if table.columns.len() > MAX_COLUMNS {
        return Err(ExportError::TooManyColumns(table.columns.len()));
    }
    ensure_parent_dir(output_path)?;

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (col, name) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, &header_format)?;
    }

    for (idx, row) in table.rows.iter().enumerate() {
        let row_num = (idx + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Number(n) => {
                    worksheet.write_number(row_num, col, *n)?;
                }
                Cell::Text(s) => {
                    worksheet.write_string(row_num, col, s)?;
                }
                Cell::Empty => {}
            }
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    worksheet.autofit();
    workbook.save(output_path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook, Data, Reader, Xlsx};
    use tempfile::TempDir;

    #[test]
    fn test_export_to_excel_numeric_cells() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.xlsx");
        let mut table = Table::new(vec!["numero_article".to_string(), "emission_co2".to_string()]);
        table.push_row(vec![Cell::text("100"), Cell::Number(2.5)]);
        table.push_row(vec![Cell::text("200"), Cell::Empty]);

        export_to_excel(&table, &path, DEFAULT_SHEET_NAME).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        let range = workbook.worksheet_range(DEFAULT_SHEET_NAME).unwrap();
        assert_eq!(
            range.get_value((0, 1)),
            Some(&Data::String("emission_co2".to_string()))
        );
        assert_eq!(range.get_value((1, 1)), Some(&Data::Float(2.5)));
        assert_eq!(range.get_value((2, 0)), Some(&Data::String("200".to_string())));
    }

    #[test]
    fn test_invalid_sheet_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.xlsx");
        let table = Table::new(vec!["a".to_string()]);

        let result = export_to_excel(&table, &path, "bad/name");
        assert!(matches!(result, Err(ExportError::Xlsx(_))));
    }
}
