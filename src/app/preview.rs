// ==========================================
// CO2 计费工具 - 表格预览
// ==========================================
// 职责: 将 Table 渲染为等宽文本表格（终端预览）
// ==========================================

use crate::domain::table::Table;

/// 单列最大显示宽度（字符）
pub const MAX_CELL_WIDTH: usize = 32;

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let mut s: String = value.chars().take(width.saturating_sub(1)).collect();
        s.push('…');
        s
    }
}

fn pad(value: &str, width: usize) -> String {
    let len = value.chars().count();
    format!("{}{}", value, " ".repeat(width.saturating_sub(len)))
}

/// 渲染文本表格
pub fn render_table(table: &Table) -> String {
    if table.columns.is_empty() {
        return String::new();
    }

    let header: Vec<String> = table
        .columns
        .iter()
        .map(|c| truncate(c, MAX_CELL_WIDTH))
        .collect();
    let body: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| truncate(&cell.to_string(), MAX_CELL_WIDTH))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|i| {
            body.iter()
                .filter_map(|r| r.get(i))
                .chain(std::iter::once(&header[i]))
                .map(|s| s.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_row = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| pad(c, *w))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = format_row(&header);
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in &body {
        out.push('\n');
        out.push_str(&format_row(row));
    }
    out
}
