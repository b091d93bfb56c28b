// ==========================================
// CO2 计费工具 - 账单批量加载器
// ==========================================
// 流程: 解析 → 列映射 → 清洗 → 行级校验 → 合并
// 策略: 文件级失败排除该文件；行级失败丢弃该行
// ==========================================

use crate::config::AppConfig;
use crate::domain::billing::{BillingLine, BillingTable, ExcludedFile, IncludedFile, LoadReport};
use crate::domain::types::{DqViolation, COL_ARTICLE, COL_PRICE, COL_QUANTITY, COL_SOURCE_FILE};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::importer_trait::{DataCleaner as DataCleanerTrait, FileParser};
use std::path::Path;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// FileLoad - 单文件加载结果
// ==========================================
struct FileLoad {
    columns: Vec<String>,
    lines: Vec<BillingLine>,
    violations: Vec<DqViolation>,
    total_rows: usize,
}

// ==========================================
// BillingImporter - 账单导入器
// ==========================================
pub struct BillingImporter {
    file_parser: Box<dyn FileParser>,
    data_cleaner: Box<dyn DataCleanerTrait>,
    field_mapper: FieldMapper,
}

impl BillingImporter {
    pub fn new(
        file_parser: Box<dyn FileParser>,
        data_cleaner: Box<dyn DataCleanerTrait>,
        field_mapper: FieldMapper,
    ) -> Self {
        Self {
            file_parser,
            data_cleaner,
            field_mapper,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Box::new(UniversalFileParser::new(config.delimiter_byte())),
            Box::new(DataCleaner::new(config.strip_article_leading_zeros)),
            FieldMapper::from_config(config),
        )
    }

    /// 批量加载账单文件
    ///
    /// # 返回
    /// - Ok((BillingTable, LoadReport)): 至少一个文件被加载
    /// - Err(NoInputFiles): 未提供文件
    /// - Err(NoValidBillingFiles): 全部文件被排除
    #[instrument(skip_all, fields(files = paths.len()))]
    pub fn load<P: AsRef<Path>>(&self, paths: &[P]) -> ImportResult<(BillingTable, LoadReport)> {
        if paths.is_empty() {
            return Err(ImportError::NoInputFiles);
        }

        let mut table = BillingTable::default();
        let mut report = LoadReport {
            batch_id: Uuid::new_v4().to_string(),
            ..LoadReport::default()
        };
        info!(batch_id = %report.batch_id, "开始加载账单文件");

        for path in paths {
            let path = path.as_ref();
            let path_str = path.display().to_string();

            match self.load_file(path) {
                Ok(loaded) => {
                    for column in &loaded.columns {
                        table.add_column(column);
                    }
                    let rows_loaded = loaded.lines.len();
                    let rows_dropped = loaded.total_rows - rows_loaded;
                    if rows_dropped > 0 {
                        warn!(file = %path_str, dropped = rows_dropped, "存在无法转换的行，已剔除");
                    }
                    info!(file = %path_str, rows = rows_loaded, "文件加载并映射完成");

                    report.total_rows += loaded.total_rows;
                    report.loaded_rows += rows_loaded;
                    report.violations.extend(loaded.violations);
                    report.included_files.push(IncludedFile {
                        path: path_str,
                        rows_loaded,
                        rows_dropped,
                    });
                    table.lines.extend(loaded.lines);
                }
                Err(e) => {
                    warn!(file = %path_str, reason = %e, "文件被排除");
                    report
                        .violations
                        .push(DqViolation::file_error(&path_str, e.to_string()));
                    report.excluded_files.push(ExcludedFile {
                        path: path_str,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if report.included_files.is_empty() {
            return Err(ImportError::NoValidBillingFiles {
                excluded: report.excluded_files.len(),
                reasons: report
                    .excluded_files
                    .iter()
                    .map(|f| format!("{}: {}", f.path, f.reason))
                    .collect::<Vec<_>>()
                    .join("; "),
            });
        }

        table.add_column(COL_SOURCE_FILE);
        info!(
            included = report.included_count(),
            excluded = report.excluded_count(),
            rows = report.loaded_rows,
            dropped = report.dropped_rows(),
            "账单加载完成"
        );
        Ok((table, report))
    }

    fn load_file(&self, path: &Path) -> ImportResult<FileLoad> {
        let sheet = self.file_parser.parse(path)?;
        let renames = self
            .field_mapper
            .resolve_billing_columns(&sheet.headers, &sheet.source)?;
        let columns = renames.apply_to_headers(&sheet.headers);

        let total_rows = sheet.records.len();
        let mut lines = Vec::with_capacity(total_rows);
        let mut violations = Vec::new();

        for record in &sheet.records {
            let values = renames.apply_to_record(record);
            let raw = |column: &str| values.get(column).map(|v| v.as_str()).unwrap_or("");

            let article_number = self.data_cleaner.clean_article_number(raw(COL_ARTICLE));
            let article = (!article_number.is_empty()).then(|| article_number.clone());
            let mut row_violations = Vec::new();

            if article_number.is_empty() {
                row_violations.push(DqViolation::warning(
                    &sheet.source,
                    record.row_number,
                    None,
                    COL_ARTICLE,
                    "物料号为空",
                ));
            }

            let mut parse_number = |column: &str| -> Option<f64> {
                let value = raw(column);
                match self.data_cleaner.parse_float(value).filter(|n| n.is_finite()) {
                    Some(n) => Some(n),
                    None => {
                        row_violations.push(DqViolation::warning(
                            &sheet.source,
                            record.row_number,
                            article.clone(),
                            column,
                            format!("无法转换为数值: '{}'", value),
                        ));
                        None
                    }
                }
            };
            let quantity = parse_number(COL_QUANTITY);
            let price = parse_number(COL_PRICE);

            match (quantity, price) {
                (Some(quantity), Some(price)) if row_violations.is_empty() => {
                    lines.push(BillingLine {
                        source_file: sheet.source.clone(),
                        row_number: record.row_number,
                        article_number,
                        quantity,
                        price,
                        values,
                    });
                }
                _ => {
                    for v in &row_violations {
                        debug!(
                            file = %v.source,
                            row = v.row_number,
                            column = %v.field,
                            message = %v.message,
                            "行被剔除"
                        );
                    }
                    violations.extend(row_violations);
                }
            }
        }

        Ok(FileLoad {
            columns,
            lines,
            violations,
            total_rows,
        })
    }
}

/// 按配置加载账单文件
pub fn load_billing_files<P: AsRef<Path>>(
    paths: &[P],
    config: &AppConfig,
) -> ImportResult<(BillingTable, LoadReport)> {
    BillingImporter::from_config(config).load(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::DqLevel;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn csv_file(content: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_single_file() {
        let file = csv_file(
            "DATE_INVOICE;ID_MATERIAL;QUANTITY;AMOUNT_NET\n\
             2024-01-05;000100;1 000,5;12,30\n\
             2024-02-05;200;3;4\n",
        );

        let (table, report) = load_billing_files(&[file.path()], &AppConfig::default()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(
            table.columns,
            vec!["DATE_INVOICE", COL_ARTICLE, COL_QUANTITY, COL_PRICE, COL_SOURCE_FILE]
        );
        assert_eq!(table.lines[0].article_number, "100");
        assert_eq!(table.lines[0].quantity, 1000.5);
        assert_eq!(table.lines[0].price, 12.3);
        assert_eq!(report.loaded_rows, 2);
        assert_eq!(report.included_count(), 1);
        assert!(!report.batch_id.is_empty());
    }

    #[test]
    fn test_bad_rows_are_dropped_and_reported() {
        let file = csv_file(
            "ID_MATERIAL;QUANTITY;AMOUNT_NET\n\
             100;abc;1\n\
             200;2;3\n\
             ;1;1\n",
        );

        let (table, report) = load_billing_files(&[file.path()], &AppConfig::default()).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(report.total_rows, 3);
        assert_eq!(report.dropped_rows(), 2);
        assert_eq!(report.violations.len(), 2);
        assert_eq!(report.violations[0].row_number, 2);
        assert_eq!(report.violations[0].field, COL_QUANTITY);
        assert!(report.violations[0].message.contains("abc"));
        assert_eq!(report.included_files[0].rows_dropped, 2);
    }

    #[test]
    fn test_file_missing_columns_is_excluded() {
        let good = csv_file("ID_MATERIAL;QUANTITY;AMOUNT_NET\n100;1;1\n");
        let bad = csv_file("ID_MATERIAL;QTY\n100;1\n");

        let (table, report) =
            load_billing_files(&[good.path(), bad.path()], &AppConfig::default()).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(report.excluded_count(), 1);
        assert!(report.excluded_files[0].reason.contains("QUANTITY"));

        let errors: Vec<_> = report
            .violations
            .iter()
            .filter(|v| v.level == DqLevel::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].source, bad.path().display().to_string());
    }

    #[test]
    fn test_all_files_excluded() {
        let bad = csv_file("A;B\n1;2\n");
        let result = load_billing_files(&[bad.path()], &AppConfig::default());
        assert!(matches!(
            result,
            Err(ImportError::NoValidBillingFiles { excluded: 1, .. })
        ));
    }

    #[test]
    fn test_no_input_files() {
        let paths: Vec<&Path> = vec![];
        let result = load_billing_files(&paths[..], &AppConfig::default());
        assert!(matches!(result, Err(ImportError::NoInputFiles)));
    }
}
