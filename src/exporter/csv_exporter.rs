// ==========================================
// CO2 计费工具 - CSV 导出
// ==========================================
// 格式: UTF-8，表头一行，默认分号分隔
// ==========================================

use crate::domain::table::Table;
use crate::exporter::error::ExportResult;
use crate::exporter::ensure_parent_dir;
use csv::WriterBuilder;
use std::path::Path;
use tracing::{error, info};

/// 导出为 CSV
pub fn export_to_csv(table: &Table, output_path: &Path, delimiter: u8) -> ExportResult<()> {
    write_csv(table, output_path, delimiter)
        .map(|_| info!(path = %output_path.display(), rows = table.len(), "CSV 导出成功"))
        .map_err(|e| {
            error!(path = %output_path.display(), error = %e, "CSV 导出失败");
            e
        })
}

fn write_csv(table: &Table, output_path: &Path, delimiter: u8) -> ExportResult<()> {
    ensure_parent_dir(output_path)?;

    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(output_path)?;

    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}
