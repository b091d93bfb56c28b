// ==========================================
// CO2 计费工具 - 文件解析器实现
// ==========================================
// 阶段 0: 文件读取与解析
// 支持: CSV (.csv) / Excel (.xlsx/.xls/.xlsm/.ods)
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::{FileParser, RawRecord, RawSheet};
use crate::domain::table::unique_column_name;
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{NaiveDate, TimeDelta};
use csv::ReaderBuilder;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Excel 支持的扩展名
pub const EXCEL_EXTENSIONS: [&str; 4] = ["xlsx", "xls", "xlsm", "ods"];

/// 小写扩展名
pub fn file_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// 是否为可导入的文件类型
pub fn is_supported_file(path: &Path) -> bool {
    let ext = file_extension(path);
    ext == "csv" || EXCEL_EXTENSIONS.contains(&ext.as_str())
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.is_file() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

/// 按表头位置组装行；空表头列忽略，全空行返回 None
fn build_record(
    headers: &[(usize, String)],
    cells: &[String],
    row_number: usize,
) -> Option<RawRecord> {
    let mut values = HashMap::with_capacity(headers.len());
    for (col_idx, header) in headers {
        let value = cells.get(*col_idx).map(|v| v.trim()).unwrap_or("");
        values.insert(header.clone(), value.to_string());
    }

    // 跳过完全空白的行
    if values.values().all(|v| v.is_empty()) {
        return None;
    }
    Some(RawRecord { row_number, values })
}

/// 表头 trim 并去 BOM，忽略空表头；重复表头追加 `_2`、`_3` …
fn index_headers<I: IntoIterator<Item = String>>(raw: I, path: &Path) -> Vec<(usize, String)> {
    let mut taken = HashSet::new();
    let mut headers = Vec::new();
    for (idx, header) in raw.into_iter().enumerate() {
        let header = header.trim().trim_start_matches('\u{feff}').to_string();
        if header.is_empty() {
            continue;
        }
        let name = unique_column_name(&header, &taken);
        if name != header {
            warn!(file = %path.display(), column = %header, renamed = %name, "重复表头，已改名");
        }
        taken.insert(name.clone());
        headers.push((idx, name));
    }
    headers
}

// ==========================================
// 文本解码（UTF-8 优先，失败回退 Latin-1）
// ==========================================
pub fn decode_text(bytes: Vec<u8>) -> (String, &'static str) {
    match String::from_utf8(bytes) {
        Ok(text) => (text, "utf-8"),
        // Latin-1 字节与 U+0000..U+00FF 一一对应
        Err(err) => (err.into_bytes().iter().map(|&b| b as char).collect(), "latin1"),
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser {
    delimiter: u8,
}

impl CsvParser {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new(b';')
    }
}

impl FileParser for CsvParser {
    fn parse(&self, file_path: &Path) -> ImportResult<RawSheet> {
        let path = file_path;
        ensure_exists(path)?;

        let ext = file_extension(path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let (text, encoding) = decode_text(fs::read(path)?);
        if encoding != "utf-8" {
            warn!(file = %path.display(), encoding, "UTF-8 解码失败，已回退 Latin-1");
        }

        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(text.as_bytes());

        let headers = index_headers(reader.headers()?.iter().map(|h| h.to_string()), path);
        if headers.is_empty() {
            return Err(ImportError::MissingHeader(path.display().to_string()));
        }

        let mut records = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let row_number = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(idx + 2);
            let cells: Vec<String> = record.iter().map(|v| v.to_string()).collect();
            if let Some(raw) = build_record(&headers, &cells, row_number) {
                records.push(raw);
            }
        }

        debug!(file = %path.display(), rows = records.len(), encoding, "CSV 解析完成");
        Ok(RawSheet {
            source: path.display().to_string(),
            headers: headers.into_iter().map(|(_, h)| h).collect(),
            records,
            encoding: Some(encoding.to_string()),
        })
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

/// Excel 序列日期 → ISO 日期（1900 日期系统）
fn excel_serial_to_iso(serial: f64) -> String {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .zip(TimeDelta::try_days(serial.floor() as i64))
        .and_then(|(base, days)| base.checked_add_signed(days))
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| serial.to_string())
}

/// 整数值浮点不带小数部分
fn format_excel_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => format_excel_number(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => excel_serial_to_iso(dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        other => other.to_string(),
    }
}

impl FileParser for ExcelParser {
    fn parse(&self, file_path: &Path) -> ImportResult<RawSheet> {
        let path = file_path;
        ensure_exists(path)?;

        let ext = file_extension(path);
        if !EXCEL_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(path)?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        // 提取表头（第一行）
        let mut rows = range.rows();
        let header_row = rows
            .next()
            .ok_or_else(|| ImportError::MissingHeader(path.display().to_string()))?;
        let headers = index_headers(header_row.iter().map(cell_to_string), path);
        if headers.is_empty() {
            return Err(ImportError::MissingHeader(path.display().to_string()));
        }

        // 行号相对于工作表起点
        let first_row = range.start().map(|(r, _)| r as usize).unwrap_or(0);
        let mut records = Vec::new();
        for (idx, data_row) in rows.enumerate() {
            let cells: Vec<String> = data_row.iter().map(cell_to_string).collect();
            if let Some(raw) = build_record(&headers, &cells, first_row + idx + 2) {
                records.push(raw);
            }
        }

        debug!(file = %path.display(), sheet = %sheet_name, rows = records.len(), "Excel 解析完成");
        Ok(RawSheet {
            source: path.display().to_string(),
            headers: headers.into_iter().map(|(_, h)| h).collect(),
            records,
            encoding: None,
        })
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser {
    csv: CsvParser,
}

impl UniversalFileParser {
    pub fn new(delimiter: u8) -> Self {
        Self {
            csv: CsvParser::new(delimiter),
        }
    }
}

impl Default for UniversalFileParser {
    fn default() -> Self {
        Self::new(b';')
    }
}

impl FileParser for UniversalFileParser {
    fn parse(&self, file_path: &Path) -> ImportResult<RawSheet> {
        let ext = file_extension(file_path);
        match ext.as_str() {
            "csv" => self.csv.parse(file_path),
            e if EXCEL_EXTENSIONS.contains(&e) => ExcelParser.parse(file_path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn csv_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(temp_file, "{}", line).unwrap();
        }
        temp_file
    }

    #[test]
    fn test_csv_parser_semicolon() {
        let temp_file = csv_file(&[
            "ID_MATERIAL;QUANTITY;AMOUNT_NET",
            "100;2,5;10",
            "200;3;20",
        ]);

        let sheet = CsvParser::default().parse(temp_file.path()).unwrap();

        assert_eq!(sheet.headers, vec!["ID_MATERIAL", "QUANTITY", "AMOUNT_NET"]);
        assert_eq!(sheet.records.len(), 2);
        assert_eq!(sheet.records[0].get("QUANTITY"), Some("2,5"));
        assert_eq!(sheet.records[0].row_number, 2);
        assert_eq!(sheet.records[1].row_number, 3);
        assert_eq!(sheet.encoding.as_deref(), Some("utf-8"));
    }

    #[test]
    fn test_csv_parser_latin1_fallback() {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        // "Désignation" 以 Latin-1 编码
        temp_file
            .write_all(b"ID_MATERIAL;D\xe9signation\n100;Caf\xe9\n")
            .unwrap();

        let sheet = CsvParser::default().parse(temp_file.path()).unwrap();

        assert_eq!(sheet.headers[1], "Désignation");
        assert_eq!(sheet.records[0].get("Désignation"), Some("Café"));
        assert_eq!(sheet.encoding.as_deref(), Some("latin1"));
    }

    #[test]
    fn test_csv_parser_strips_bom_and_blank_header() {
        let temp_file = csv_file(&["\u{feff}A;B;", "1;2;", "3;4;x"]);

        let sheet = CsvParser::default().parse(temp_file.path()).unwrap();

        assert_eq!(sheet.headers, vec!["A", "B"]);
        assert_eq!(sheet.records[1].values.len(), 2);
    }

    #[test]
    fn test_csv_parser_skip_empty_rows() {
        let temp_file = csv_file(&["A;B", "1;2", ";", "3;4"]);

        let sheet = CsvParser::default().parse(temp_file.path()).unwrap();

        assert_eq!(sheet.records.len(), 2);
        assert_eq!(sheet.records[1].row_number, 4);
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser::default().parse(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_universal_parser_rejects_unknown_extension() {
        let temp_file = Builder::new().suffix(".txt").tempfile().unwrap();
        let result = UniversalFileParser::default().parse(temp_file.path());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(ext)) if ext == "txt"));
    }

    #[test]
    fn test_supported_file() {
        assert!(is_supported_file(Path::new("a.CSV")));
        assert!(is_supported_file(Path::new("a.xlsx")));
        assert!(!is_supported_file(Path::new("a.pdf")));
    }

    #[test]
    fn test_excel_helpers() {
        assert_eq!(format_excel_number(1234.0), "1234");
        assert_eq!(format_excel_number(12.5), "12.5");
        assert_eq!(excel_serial_to_iso(45306.0), "2024-01-15");
    }

    #[test]
    fn test_excel_serial_out_of_range_does_not_panic() {
        assert_eq!(excel_serial_to_iso(1e300), 1e300.to_string());
        assert_eq!(excel_serial_to_iso(-1e18), (-1e18).to_string());
    }

    #[test]
    fn test_csv_parser_duplicate_headers_are_suffixed() {
        let temp_file = csv_file(&["A;B;A", "1;2;3"]);

        let sheet = CsvParser::default().parse(temp_file.path()).unwrap();

        assert_eq!(sheet.headers, vec!["A", "B", "A_2"]);
        assert_eq!(sheet.records[0].get("A"), Some("1"));
        assert_eq!(sheet.records[0].get("A_2"), Some("3"));
    }

    #[test]
    fn test_excel_parser_dates_and_numbers() {
        use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("factures.xlsx");
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "ID_MATERIAL").unwrap();
        sheet.write_string(0, 1, "DATE_INVOICE").unwrap();
        sheet.write_number(1, 0, 123.0).unwrap();
        let date = ExcelDateTime::from_ymd(2024, 3, 1).unwrap();
        sheet.write_datetime_with_format(1, 1, &date, &date_format).unwrap();
        sheet.write_number(2, 0, 456.0).unwrap();
        sheet.write_number_with_format(2, 1, 1e300, &date_format).unwrap();
        workbook.save(&path).unwrap();

        let sheet = ExcelParser.parse(&path).unwrap();

        assert_eq!(sheet.headers, vec!["ID_MATERIAL", "DATE_INVOICE"]);
        assert_eq!(sheet.records[0].get("ID_MATERIAL"), Some("123"));
        assert_eq!(sheet.records[0].get("DATE_INVOICE"), Some("2024-03-01"));
        assert_eq!(sheet.records[0].row_number, 2);
        // 超出日期范围的序列值按数值文本保留
        assert_eq!(sheet.records[1].get("ID_MATERIAL"), Some("456"));
        assert_ne!(sheet.records[1].get("DATE_INVOICE"), Some(""));
    }
}
