// ==========================================
// CO2 计费工具 - 字段映射器实现
// ==========================================
// 职责: 源列名 → 内部标准列名
// 账单: ID_MATERIAL / QUANTITY / AMOUNT_NET → numero_article / quantite / prix
// 因子: Num_art / FE 或 numero_article / facteur_emission_co2
// ==========================================

use crate::config::{AppConfig, BillingColumns, FactorHeaderMapping};
use crate::domain::table::unique_column_name;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::RawRecord;
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// 未被选中、但与内部列名同名的源列改名后缀
pub const SHADOWED_COLUMN_SUFFIX: &str = "_source";

// ==========================================
// ColumnRenames - 一个文件的列重命名表
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnRenames {
    renames: HashMap<String, String>, // 源列名 → 内部列名
}

impl ColumnRenames {
    pub fn rename<'a>(&'a self, column: &'a str) -> &'a str {
        self.renames.get(column).map(|s| s.as_str()).unwrap_or(column)
    }

    /// 重命名后的表头，保持原顺序
    pub fn apply_to_headers(&self, headers: &[String]) -> Vec<String> {
        headers.iter().map(|h| self.rename(h).to_string()).collect()
    }

    /// 重命名后的行（目标列名互不相同）
    pub fn apply_to_record(&self, record: &RawRecord) -> HashMap<String, String> {
        record
            .values
            .iter()
            .map(|(k, v)| (self.rename(k).to_string(), v.clone()))
            .collect()
    }
}

// ==========================================
// FieldMapper - 字段映射器
// ==========================================
#[derive(Debug, Clone)]
pub struct FieldMapper {
    billing: BillingColumns,
    factor_mappings: Vec<FactorHeaderMapping>,
}

impl FieldMapper {
    pub fn new(billing: BillingColumns, factor_mappings: Vec<FactorHeaderMapping>) -> Self {
        Self {
            billing,
            factor_mappings,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.billing_columns.clone(),
            config.factor_header_mappings.clone(),
        )
    }

    /// 在表头中查找别名：先精确匹配，再忽略大小写
    fn find_alias<'h>(headers: &'h [String], aliases: &[String]) -> Option<&'h String> {
        aliases
            .iter()
            .find_map(|alias| headers.iter().find(|h| *h == alias))
            .or_else(|| {
                aliases.iter().find_map(|alias| {
                    headers
                        .iter()
                        .find(|h| h.eq_ignore_ascii_case(alias.trim()))
                })
            })
    }

    /// 解析账单文件的必需列
    ///
    /// # 返回
    /// - Ok(ColumnRenames): 三个必需列均找到
    /// - Err(MissingColumns): 列出缺失列的首选源列名
    pub fn resolve_billing_columns(
        &self,
        headers: &[String],
        file: &str,
    ) -> ImportResult<ColumnRenames> {
        let mut renames = HashMap::new();
        let mut missing = Vec::new();

        for (internal, aliases) in self.billing.targets() {
            match Self::find_alias(headers, aliases) {
                Some(source) => {
                    renames.insert(source.clone(), internal.to_string());
                }
                None => missing.push(
                    aliases
                        .first()
                        .cloned()
                        .unwrap_or_else(|| internal.to_string()),
                ),
            }
        }

        if !missing.is_empty() {
            return Err(ImportError::MissingColumns {
                file: file.to_string(),
                columns: missing,
            });
        }

        // 与内部列名同名的其他源列保留为 `<列名>_source`
        let mut taken: HashSet<String> = headers
            .iter()
            .filter(|h| !renames.contains_key(*h))
            .cloned()
            .collect();
        taken.extend(renames.values().cloned());
        for header in headers {
            if renames.contains_key(header) || !renames.values().any(|t| t == header) {
                continue;
            }
            let renamed =
                unique_column_name(&format!("{}{}", header, SHADOWED_COLUMN_SUFFIX), &taken);
            warn!(file, column = %header, renamed = %renamed, "源列与标准列重名，已改名保留");
            taken.insert(renamed.clone());
            renames.insert(header.clone(), renamed);
        }

        Ok(ColumnRenames { renames })
    }

    /// 选择因子文件的表头组合（第一组完整出现者胜出）
    pub fn resolve_factor_headers(&self, headers: &[String]) -> ImportResult<&FactorHeaderMapping> {
        self.factor_mappings
            .iter()
            .find(|m| {
                headers.iter().any(|h| *h == m.article) && headers.iter().any(|h| *h == m.factor)
            })
            .ok_or_else(|| ImportError::FactorHeaderMismatch {
                expected: self
                    .factor_mappings
                    .iter()
                    .map(|m| format!("[{}, {}]", m.article, m.factor))
                    .collect::<Vec<_>>()
                    .join(" 或 "),
                found: headers.to_vec(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{COL_ARTICLE, COL_PRICE, COL_QUANTITY};

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn mapper() -> FieldMapper {
        FieldMapper::from_config(&AppConfig::default())
    }

    #[test]
    fn test_resolve_billing_columns_standard() {
        let hs = headers(&["DATE_INVOICE", "ID_MATERIAL", "QUANTITY", "AMOUNT_NET"]);
        let renames = mapper().resolve_billing_columns(&hs, "a.csv").unwrap();

        assert_eq!(
            renames.apply_to_headers(&hs),
            headers(&["DATE_INVOICE", COL_ARTICLE, COL_QUANTITY, COL_PRICE])
        );
    }

    #[test]
    fn test_resolve_billing_columns_internal_names_and_case() {
        let hs = headers(&["numero_article", "quantity", "Amount_Net"]);
        let renames = mapper().resolve_billing_columns(&hs, "a.csv").unwrap();

        assert_eq!(renames.rename("quantity"), COL_QUANTITY);
        assert_eq!(renames.rename("Amount_Net"), COL_PRICE);
        assert_eq!(renames.rename("numero_article"), COL_ARTICLE);
    }

    #[test]
    fn test_resolve_billing_columns_missing() {
        let hs = headers(&["ID_MATERIAL"]);
        match mapper().resolve_billing_columns(&hs, "a.csv") {
            Err(ImportError::MissingColumns { file, columns }) => {
                assert_eq!(file, "a.csv");
                assert_eq!(columns, vec!["QUANTITY", "AMOUNT_NET"]);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_apply_to_record() {
        let hs = headers(&["ID_MATERIAL", "QUANTITY", "AMOUNT_NET", "X"]);
        let renames = mapper().resolve_billing_columns(&hs, "a.csv").unwrap();
        let mut values = HashMap::new();
        values.insert("ID_MATERIAL".to_string(), "100".to_string());
        values.insert("X".to_string(), "keep".to_string());
        let record = RawRecord {
            row_number: 2,
            values,
        };

        let mapped = renames.apply_to_record(&record);
        assert_eq!(mapped.get(COL_ARTICLE).map(|s| s.as_str()), Some("100"));
        assert_eq!(mapped.get("X").map(|s| s.as_str()), Some("keep"));
    }

    #[test]
    fn test_alias_and_internal_name_both_present() {
        let hs = headers(&["ID_MATERIAL", "numero_article", "QUANTITY", "AMOUNT_NET"]);
        let renames = mapper().resolve_billing_columns(&hs, "a.csv").unwrap();

        assert_eq!(
            renames.apply_to_headers(&hs),
            headers(&[COL_ARTICLE, "numero_article_source", COL_QUANTITY, COL_PRICE])
        );

        let mut values = HashMap::new();
        values.insert("ID_MATERIAL".to_string(), "100".to_string());
        values.insert("numero_article".to_string(), "LEGACY".to_string());
        let record = RawRecord {
            row_number: 2,
            values,
        };
        // 多次映射结果一致，选中的别名总是胜出
        for _ in 0..20 {
            let mapped = renames.apply_to_record(&record);
            assert_eq!(mapped.get(COL_ARTICLE).map(|s| s.as_str()), Some("100"));
            assert_eq!(
                mapped.get("numero_article_source").map(|s| s.as_str()),
                Some("LEGACY")
            );
        }
    }

    #[test]
    fn test_resolve_factor_headers() {
        let m = mapper();
        let short = m.resolve_factor_headers(&headers(&["Num_art", "FE", "CM"])).unwrap();
        assert_eq!(short.factor, "FE");

        let long = m
            .resolve_factor_headers(&headers(&["numero_article", "facteur_emission_co2"]))
            .unwrap();
        assert_eq!(long.article, "numero_article");

        let err = m.resolve_factor_headers(&headers(&["Num_art", "X"])).unwrap_err();
        assert!(matches!(err, ImportError::FactorHeaderMismatch { .. }));
    }
}
