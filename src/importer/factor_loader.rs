// ==========================================
// CO2 计费工具 - 排放因子表加载器
// ==========================================
// 流程: 解析 → 表头识别 → 因子清洗 → 去重
// 附加列（如 CM、Nom_Cat）原样保留并随结果输出
// ==========================================

use crate::config::AppConfig;
use crate::domain::emission::{EmissionFactor, EmissionFactorTable};
use crate::domain::types::{DqViolation, COL_ARTICLE, COL_FACTOR};
use crate::importer::conflict_handler::ConflictHandler;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::importer_trait::{DataCleaner as DataCleanerTrait, FileParser};
use std::collections::HashMap;
use std::path::Path;
use tracing::{error, info, instrument, warn};

// ==========================================
// FactorImporter - 排放因子导入器
// ==========================================
pub struct FactorImporter {
    file_parser: Box<dyn FileParser>,
    data_cleaner: Box<dyn DataCleanerTrait>,
    field_mapper: FieldMapper,
    conflict_handler: ConflictHandler,
    reject_comma: bool,
}

impl FactorImporter {
    pub fn new(
        file_parser: Box<dyn FileParser>,
        data_cleaner: Box<dyn DataCleanerTrait>,
        field_mapper: FieldMapper,
        reject_comma: bool,
    ) -> Self {
        Self {
            file_parser,
            data_cleaner,
            field_mapper,
            conflict_handler: ConflictHandler,
            reject_comma,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Box::new(UniversalFileParser::new(config.delimiter_byte())),
            Box::new(DataCleaner::new(config.strip_article_leading_zeros)),
            FieldMapper::from_config(config),
            config.reject_comma_in_factor,
        )
    }

    /// 加载排放因子表
    #[instrument(skip(self, path), fields(file = %path.display()))]
    pub fn load(&self, path: &Path) -> ImportResult<EmissionFactorTable> {
        self.load_inner(path).map_err(|e| {
            error!(error = %e, "排放因子表加载失败");
            e
        })
    }

    fn load_inner(&self, path: &Path) -> ImportResult<EmissionFactorTable> {
        let sheet = self.file_parser.parse(path)?;
        let mapping = self.field_mapper.resolve_factor_headers(&sheet.headers)?;
        info!(article = %mapping.article, factor = %mapping.factor, "因子表表头映射");

        let extra_columns: Vec<String> = sheet
            .headers
            .iter()
            .filter(|h| **h != mapping.article && **h != mapping.factor)
            .cloned()
            .collect();

        let mut entries = Vec::with_capacity(sheet.records.len());
        let mut violations = Vec::new();

        for record in &sheet.records {
            let raw_article = record.get(&mapping.article).unwrap_or("");
            let raw_factor = record.get(&mapping.factor).unwrap_or("");
            let article_number = self.data_cleaner.clean_article_number(raw_article);

            let skip = |field: &str, message: String| {
                warn!(row = record.row_number, field, message = %message, "因子行忽略");
                DqViolation::warning(
                    &sheet.source,
                    record.row_number,
                    (!article_number.is_empty()).then(|| article_number.clone()),
                    field,
                    message,
                )
            };

            if article_number.is_empty() {
                violations.push(skip(COL_ARTICLE, "物料号为空".to_string()));
                continue;
            }

            if self.reject_comma && raw_factor.contains(',') {
                violations.push(skip(
                    COL_FACTOR,
                    format!("值可疑: '{}'（检测到逗号）", raw_factor),
                ));
                continue;
            }

            let factor = match self.data_cleaner.parse_float(raw_factor) {
                Some(f) if f.is_finite() && f >= 0.0 => f,
                Some(f) => {
                    violations.push(skip(COL_FACTOR, format!("因子必须为非负有限数: {}", f)));
                    continue;
                }
                None => {
                    violations.push(skip(
                        COL_FACTOR,
                        format!("无法转换为数值: '{}'", raw_factor),
                    ));
                    continue;
                }
            };

            let extras: HashMap<String, String> = extra_columns
                .iter()
                .filter_map(|c| record.get(c).map(|v| (c.clone(), v.to_string())))
                .collect();

            entries.push(EmissionFactor {
                article_number,
                factor,
                extras,
                row_number: record.row_number,
            });
        }

        let (entries, duplicates) = self.conflict_handler.dedupe(&sheet.source, entries);
        violations.extend(duplicates);

        if entries.is_empty() {
            return Err(ImportError::NoValidFactors(sheet.source));
        }

        info!(
            entries = entries.len(),
            skipped = violations.len(),
            extra_columns = ?extra_columns,
            "排放因子表加载完成"
        );
        Ok(EmissionFactorTable::new(
            sheet.source,
            extra_columns,
            entries,
            violations,
        ))
    }
}

/// 按配置加载排放因子表
pub fn load_emission_factors(path: &Path, config: &AppConfig) -> ImportResult<EmissionFactorTable> {
    FactorImporter::from_config(config).load(path)
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
    fn test_load_short_headers_with_extras() {
        let file = csv_file("Num_art;FE;CM;Nom_Cat\n00100;0.5;A1;Acier\n200;1.25;B2;Verre\n");

        let table = load_emission_factors(file.path(), &AppConfig::default()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.extra_columns, vec!["CM", "Nom_Cat"]);
        let f = table.lookup("100").unwrap();
        assert_eq!(f.factor, 0.5);
        assert_eq!(f.extras.get("Nom_Cat").map(|s| s.as_str()), Some("Acier"));
    }

    #[test]
    fn test_comma_and_invalid_factors_are_skipped() {
        let file = csv_file(
            "numero_article;facteur_emission_co2\n\
             1;0,5\n\
             2;n/a\n\
             3;-1\n\
             4;1.470.000\n\
             ;2\n",
        );

        let table = load_emission_factors(file.path(), &AppConfig::default()).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup("4").map(|f| f.factor), Some(1470.0));
        assert_eq!(table.violations.len(), 4);
        assert!(table.violations[0].message.contains("逗号"));
        assert!(table.violations.iter().all(|v| v.level == DqLevel::Warning));
    }

    #[test]
    fn test_comma_accepted_when_not_rejected() {
        let file = csv_file("Num_art;FE\n1;0,5\n");
        let mut config = AppConfig::default();
        config.reject_comma_in_factor = false;

        let table = load_emission_factors(file.path(), &config).unwrap();
        assert_eq!(table.lookup("1").map(|f| f.factor), Some(0.5));
    }

    #[test]
    fn test_header_mismatch() {
        let file = csv_file("article;factor\n1;0.5\n");
        let result = load_emission_factors(file.path(), &AppConfig::default());
        assert!(matches!(result, Err(ImportError::FactorHeaderMismatch { .. })));
    }

    #[test]
    fn test_no_valid_entries() {
        let file = csv_file("Num_art;FE\n1;abc\n");
        let result = load_emission_factors(file.path(), &AppConfig::default());
        assert!(matches!(result, Err(ImportError::NoValidFactors(_))));
    }
}
