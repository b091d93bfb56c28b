// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 生成临时账单文件、因子表，读取导出结果
// ==========================================

#![allow(dead_code)]

use calamine::{open_workbook, Data, Reader, Xlsx};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// 2024 年账单（含一行无法转换的数量）
pub const BILLING_2024: &str = "\
ID_MATERIAL;QUANTITY;AMOUNT_NET;DATE_INVOICE;SUPPLIER
000123;10;100,50;2024-01-15;ACME
456;2,5;20;15/06/2024;ACME
789;abc;5;2024-03-01;OTHER
999;4;8;2024-12-31;OTHER
";

/// 跨年账单（两行属于 2023 年）
pub const BILLING_MIXED: &str = "\
ID_MATERIAL;QUANTITY;AMOUNT_NET;DATE_INVOICE;SUPPLIER
123;1;10;2023-12-31;ACME
456;3;30;2024-02-01;ACME
123;2;20;;ACME
";

/// 缺少必需列的账单
pub const BILLING_MISSING_COLUMN: &str = "\
ID_MATERIAL;AMOUNT_NET
123;10
";

/// 排放因子表（Num_art / FE 表头，含附加列）
pub const FACTORS: &str = "\
Num_art;FE;Nom_Cat
123;0.5;Acier
456;2;Aluminium
";

/// 创建临时目录
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("无法创建临时目录")
}

/// 写入测试文件
pub fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("无法写入测试文件");
    path
}

/// 读取 CSV 导出结果（按行、按分隔符切分）
pub fn read_csv_rows(path: &Path) -> Vec<Vec<String>> {
    fs::read_to_string(path)
        .expect("无法读取 CSV")
        .lines()
        .map(|line| line.split(';').map(str::to_string).collect())
        .collect()
}

/// 读取 Excel 导出结果的第一个工作表
pub fn read_xlsx_rows(path: &Path) -> Vec<Vec<Data>> {
    let mut workbook: Xlsx<_> = open_workbook(path).expect("无法打开 Excel");
    let sheet = workbook.sheet_names()[0].clone();
    let range = workbook.worksheet_range(&sheet).expect("无法读取工作表");
    range.rows().map(|row| row.to_vec()).collect()
}
