// ==========================================
// CO2 计费工具 - 碳排放计算引擎
// ==========================================
// 职责: 账单 ⋈ 因子表（按物料号左连接）→ 过滤无因子行 → 计算排放量
// 公式: emission_co2 = quantite × facteur_emission_co2
// ==========================================

use crate::domain::billing::BillingTable;
use crate::domain::emission::{EmissionFactorTable, EnrichedLine, EnrichedTable, ProcessSummary};
use tracing::{debug, info, instrument};

// ==========================================
// Co2Processor - 碳排放计算引擎
// ==========================================
#[derive(Debug, Default)]
pub struct Co2Processor;

impl Co2Processor {
    pub fn new() -> Self {
        Self
    }

    /// 连接并计算排放量
    ///
    /// # 返回
    /// - EnrichedTable: 仅包含找到因子的行，保持原行序
    /// - ProcessSummary: 连接统计
    #[instrument(skip_all, fields(billing_rows = billing.len(), factors = factors.len()))]
    pub fn process(
        &self,
        billing: &BillingTable,
        factors: &EmissionFactorTable,
    ) -> (EnrichedTable, ProcessSummary) {
        let mut result = EnrichedTable {
            billing_columns: billing.columns.clone(),
            factor_columns: factors.extra_columns.clone(),
            lines: Vec::with_capacity(billing.len()),
        };
        let mut summary = ProcessSummary {
            merged_rows: billing.len(),
            ..ProcessSummary::default()
        };

        for line in &billing.lines {
            match factors.lookup(&line.article_number) {
                Some(factor) => {
                    result.lines.push(EnrichedLine {
                        line: line.clone(),
                        factor: factor.factor,
                        factor_extras: factor.extras.clone(),
                        emission_co2: line.quantity * factor.factor,
                    });
                }
                None => {
                    summary.unmatched_rows += 1;
                    summary
                        .unmatched_articles
                        .insert(line.article_number.clone());
                }
            }
        }

        summary.matched_rows = result.len();
        summary.total_emission_co2 = result.total_emission_co2();

        if !summary.unmatched_articles.is_empty() {
            debug!(articles = ?summary.unmatched_articles, "无排放因子的物料号");
        }
        info!(
            merged = summary.merged_rows,
            matched = summary.matched_rows,
            unmatched = summary.unmatched_rows,
            total_emission_co2 = summary.total_emission_co2,
            "账单与因子表连接完成"
        );
        (result, summary)
    }
}

/// 连接账单与因子表并计算排放量
pub fn process_billing_with_co2(
    billing: &BillingTable,
    factors: &EmissionFactorTable,
) -> (EnrichedTable, ProcessSummary) {
    Co2Processor::new().process(billing, factors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::BillingLine;
    use crate::domain::emission::EmissionFactor;
    use crate::domain::types::{COL_ARTICLE, COL_QUANTITY};
    use std::collections::HashMap;

    fn billing(rows: &[(&str, f64)]) -> BillingTable {
        let mut table = BillingTable::new(vec![COL_ARTICLE.to_string(), COL_QUANTITY.to_string()]);
        for (i, (article, qty)) in rows.iter().enumerate() {
            table.lines.push(BillingLine {
                source_file: "a.csv".to_string(),
                row_number: i + 2,
                article_number: article.to_string(),
                quantity: *qty,
                price: 0.0,
                values: HashMap::new(),
            });
        }
        table
    }

    fn factors(rows: &[(&str, f64, &str)]) -> EmissionFactorTable {
        let entries = rows
            .iter()
            .enumerate()
            .map(|(i, (article, factor, cat))| {
                let mut extras = HashMap::new();
                extras.insert("Nom_Cat".to_string(), cat.to_string());
                EmissionFactor {
                    article_number: article.to_string(),
                    factor: *factor,
                    extras,
                    row_number: i + 2,
                }
            })
            .collect();
        EmissionFactorTable::new("fe.csv", vec!["Nom_Cat".to_string()], entries, vec![])
    }

    #[test]
    fn test_join_filters_unmatched_and_computes_emission() {
        let billing = billing(&[("100", 10.0), ("999", 5.0), ("200", 2.0), ("999", 1.0)]);
        let factors = factors(&[("100", 0.5, "Acier"), ("200", 3.0, "Verre")]);

        let (result, summary) = process_billing_with_co2(&billing, &factors);

        assert_eq!(result.len(), 2);
        assert_eq!(result.lines[0].emission_co2, 5.0);
        assert_eq!(result.lines[1].emission_co2, 6.0);
        assert_eq!(
            result.lines[1].factor_extras.get("Nom_Cat").map(|s| s.as_str()),
            Some("Verre")
        );
        assert_eq!(summary.merged_rows, 4);
        assert_eq!(summary.matched_rows, 2);
        assert_eq!(summary.unmatched_rows, 2);
        assert_eq!(summary.unmatched_articles.len(), 1);
        assert_eq!(summary.total_emission_co2, 11.0);
        assert_eq!(result.factor_columns, vec!["Nom_Cat"]);
    }

    #[test]
    fn test_empty_billing() {
        let (result, summary) = process_billing_with_co2(&billing(&[]), &factors(&[("1", 1.0, "x")]));
        assert!(result.is_empty());
        assert_eq!(summary.merged_rows, 0);
        assert_eq!(summary.total_emission_co2, 0.0);
    }

    #[test]
    fn test_negative_quantity_gives_negative_emission() {
        // 贷项通知单
        let (result, _) = process_billing_with_co2(&billing(&[("1", -4.0)]), &factors(&[("1", 0.25, "x")]));
        assert_eq!(result.lines[0].emission_co2, -1.0);
    }
}
