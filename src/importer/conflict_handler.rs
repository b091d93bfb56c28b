// ==========================================
// CO2 计费工具 - 冲突处理器实现
// ==========================================
// 职责: 检测因子表内重复物料号
// 策略: 首次出现者生效，后续记录为 DQ 违规
// ==========================================

use crate::domain::emission::EmissionFactor;
use crate::domain::types::{DqLevel, DqViolation, COL_ARTICLE};
use std::collections::HashMap;
use tracing::warn;

pub struct ConflictHandler;

impl ConflictHandler {
    /// 去重：保留首次出现，其余转为违规记录
    ///
    /// 重复项因子相同记为 INFO，不同记为 WARNING
    pub fn dedupe(
        &self,
        source: &str,
        entries: Vec<EmissionFactor>,
    ) -> (Vec<EmissionFactor>, Vec<DqViolation>) {
        let mut kept: Vec<EmissionFactor> = Vec::with_capacity(entries.len());
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut violations = Vec::new();

        for entry in entries {
            match positions.get(&entry.article_number) {
                Some(&pos) => {
                    let first = &kept[pos];
                    let same = first.factor == entry.factor;
                    let level = if same { DqLevel::Info } else { DqLevel::Warning };
                    if !same {
                        warn!(
                            article = %entry.article_number,
                            row = entry.row_number,
                            first_row = first.row_number,
                            "因子表物料号重复且因子不同，保留首次出现"
                        );
                    }
                    violations.push(DqViolation {
                        source: source.to_string(),
                        row_number: entry.row_number,
                        article_number: Some(entry.article_number.clone()),
                        level,
                        field: COL_ARTICLE.to_string(),
                        message: format!(
                            "物料号重复（首次出现于第 {} 行，因子 {}；本行因子 {}），本行忽略",
                            first.row_number, first.factor, entry.factor
                        ),
                    });
                }
                None => {
                    positions.insert(entry.article_number.clone(), kept.len());
                    kept.push(entry);
                }
            }
        }

        (kept, violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(article: &str, factor: f64, row: usize) -> EmissionFactor {
        EmissionFactor {
            article_number: article.to_string(),
            factor,
            extras: HashMap::new(),
            row_number: row,
        }
    }

    #[test]
    fn test_dedupe_keeps_first() {
        let entries = vec![
            entry("1", 0.5, 2),
            entry("1", 0.5, 3),
            entry("2", 1.0, 4),
            entry("1", 0.9, 5),
        ];

        let (kept, violations) = ConflictHandler.dedupe("fe.csv", entries);

        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].factor, 0.5);
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].level, DqLevel::Info);
        assert_eq!(violations[1].level, DqLevel::Warning);
        assert_eq!(violations[1].row_number, 5);
    }
}
