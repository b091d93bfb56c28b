// ==========================================
// CO2 计费工具 - 应用配置
// ==========================================
// 职责: 列映射、期间过滤、清洗开关、日志选项
// 存储: JSON 文件（见 config_manager）
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::domain::types::{COL_ARTICLE, COL_FACTOR, COL_PRICE, COL_QUANTITY};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// AppConfig - 应用配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// CSV 分隔符（读写共用）
    pub csv_delimiter: char,

    /// 账单必需列的源列名别名
    pub billing_columns: BillingColumns,

    /// 因子文件可接受的表头组合，按顺序匹配
    pub factor_header_mappings: Vec<FactorHeaderMapping>,

    /// 发票日期期间过滤
    pub period: PeriodConfig,

    /// 纯数字物料号去除前导零
    pub strip_article_leading_zeros: bool,

    /// 因子值含逗号时整行忽略
    pub reject_comma_in_factor: bool,

    /// 详细日志（debug 级别）
    pub show_detailed_logs: bool,

    /// JSON 格式日志
    pub log_json: bool,

    /// 界面语言（zh-CN / en / fr）
    pub locale: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            csv_delimiter: ';',
            billing_columns: BillingColumns::default(),
            factor_header_mappings: vec![
                FactorHeaderMapping::new("Num_art", "FE"),
                FactorHeaderMapping::new(COL_ARTICLE, COL_FACTOR),
            ],
            period: PeriodConfig::default(),
            strip_article_leading_zeros: true,
            reject_comma_in_factor: true,
            show_detailed_logs: false,
            log_json: false,
            locale: "fr".to_string(),
        }
    }
}

impl AppConfig {
    /// 分隔符字节（validate 保证为单字节 ASCII）
    pub fn delimiter_byte(&self) -> u8 {
        if self.csv_delimiter.is_ascii() {
            self.csv_delimiter as u8
        } else {
            b';'
        }
    }

    /// 校验配置
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.csv_delimiter.is_ascii() || self.csv_delimiter.is_ascii_alphanumeric() {
            return Err(invalid(
                "csv_delimiter",
                format!("分隔符必须为非字母数字的 ASCII 字符，实际 '{}'", self.csv_delimiter),
            ));
        }

        for (field, aliases) in [
            ("billing_columns.article", &self.billing_columns.article),
            ("billing_columns.quantity", &self.billing_columns.quantity),
            ("billing_columns.price", &self.billing_columns.price),
        ] {
            if aliases.iter().all(|a| a.trim().is_empty()) {
                return Err(invalid(field, "至少需要一个列名"));
            }
        }

        if self.factor_header_mappings.is_empty() {
            return Err(invalid("factor_header_mappings", "至少需要一组表头映射"));
        }
        if let Some(m) = self
            .factor_header_mappings
            .iter()
            .find(|m| m.article.trim().is_empty() || m.factor.trim().is_empty())
        {
            return Err(invalid(
                "factor_header_mappings",
                format!("表头映射不完整: {:?}", m),
            ));
        }

        if self.period.date_column.trim().is_empty() {
            return Err(invalid("period.date_column", "日期列名不能为空"));
        }
        if let (Some(start), Some(end)) = (self.period.start, self.period.end) {
            if start > end {
                return Err(invalid(
                    "period",
                    format!("开始日期 {} 晚于结束日期 {}", start, end),
                ));
            }
        }

        Ok(())
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        message: message.into(),
    }
}

// ==========================================
// BillingColumns - 账单列别名
// ==========================================
// 映射目标: numero_article / quantite / prix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingColumns {
    pub article: Vec<String>,
    pub quantity: Vec<String>,
    pub price: Vec<String>,
}

impl Default for BillingColumns {
    fn default() -> Self {
        Self {
            article: vec!["ID_MATERIAL".to_string(), COL_ARTICLE.to_string()],
            quantity: vec!["QUANTITY".to_string(), COL_QUANTITY.to_string()],
            price: vec!["AMOUNT_NET".to_string(), COL_PRICE.to_string()],
        }
    }
}

impl BillingColumns {
    /// (内部列名, 别名列表)
    pub fn targets(&self) -> [(&'static str, &[String]); 3] {
        [
            (COL_ARTICLE, self.article.as_slice()),
            (COL_QUANTITY, self.quantity.as_slice()),
            (COL_PRICE, self.price.as_slice()),
        ]
    }
}

// ==========================================
// FactorHeaderMapping - 因子文件表头组合
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorHeaderMapping {
    pub article: String,
    pub factor: String,
}

impl FactorHeaderMapping {
    pub fn new(article: &str, factor: &str) -> Self {
        Self {
            article: article.to_string(),
            factor: factor.to_string(),
        }
    }
}

// ==========================================
// PeriodConfig - 期间过滤
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodConfig {
    pub date_column: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl Default for PeriodConfig {
    fn default() -> Self {
        Self {
            date_column: "DATE_INVOICE".to_string(),
            start: None,
            end: None,
        }
    }
}

impl PeriodConfig {
    /// 起止日期均未设置时不启用过滤
    pub fn is_enabled(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// 设置为整年
    pub fn set_year(&mut self, year: i32) {
        self.start = NaiveDate::from_ymd_opt(year, 1, 1);
        self.end = NaiveDate::from_ymd_opt(year, 12, 31);
    }
}
