// ==========================================
// CO2 计费工具 - 数据清洗器实现
// ==========================================
// 职责: 宽松数值解析 / 物料号标准化 / 日期解析
// ==========================================

use crate::importer::importer_trait::DataCleaner as DataCleanerTrait;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

/// 解析时剔除的字符：空格、不间断空格、窄不间断空格、制表符、货币符号
const IGNORED_CHARS: [char; 7] = [' ', '\u{a0}', '\u{202f}', '\t', '€', '$', '£'];

/// 日在前的日期格式
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

fn thousands_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{1,3}(,\d{3})+(\.\d+)?$").expect("静态正则"))
}

fn plain_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d+\.?\d*|\.\d+)$").expect("静态正则"))
}

/// 宽松数值解析
///
/// # 规则
/// 1. 去除空格类字符与货币符号
/// 2. `1,234,567.89` 形式：逗号为千分位
/// 3. 同时含 `,` 与 `.`：靠后者为小数点
/// 4. 仅一个 `,`：小数逗号
/// 5. 多个 `.`：最后一个为小数点
/// 6. 其余字符非法 → None
pub fn parse_float(value: &str) -> Option<f64> {
    let s: String = value.chars().filter(|c| !IGNORED_CHARS.contains(c)).collect();
    if s.is_empty() {
        return None;
    }

    let (sign, body) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.strip_prefix('+').unwrap_or(&s)),
    };

    let commas = body.matches(',').count();
    let dots = body.matches('.').count();

    let normalized = if thousands_pattern().is_match(body) {
        body.replace(',', "")
    } else if commas > 0 && dots > 0 {
        match (body.rfind(','), body.rfind('.')) {
            (Some(c), Some(d)) if c > d => body.replace('.', "").replace(',', "."),
            _ => body.replace(',', ""),
        }
    } else if commas == 1 {
        body.replace(',', ".")
    } else if commas > 1 {
        return None;
    } else if dots > 1 {
        match body.rsplit_once('.') {
            Some((int_part, frac)) => format!("{}.{}", int_part.replace('.', ""), frac),
            None => body.to_string(),
        }
    } else {
        body.to_string()
    };

    if !plain_number_pattern().is_match(&normalized) {
        return None;
    }
    format!("{}{}", sign, normalized).parse::<f64>().ok()
}

/// 日期解析（日在前），忽略时间部分
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    let date_part = trimmed
        .split(|c: char| c == 'T' || c.is_whitespace())
        .next()
        .unwrap_or("");
    if date_part.is_empty() {
        return None;
    }

    // YYYYMMDD
    if date_part.len() == 8 && date_part.chars().all(|c| c.is_ascii_digit()) {
        let year = date_part[0..4].parse().ok()?;
        let month = date_part[4..6].parse().ok()?;
        let day = date_part[6..8].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// 物料号标准化
///
/// - trim
/// - Excel 整数浮点尾巴 `1234.0` → `1234`
/// - 纯数字去除前导零（`000` → `0`）
pub fn clean_article_number(value: &str, strip_leading_zeros: bool) -> String {
    let trimmed = value.trim();
    let trimmed = match trimmed.strip_suffix(".0") {
        Some(int_part) if !int_part.is_empty() && int_part.chars().all(|c| c.is_ascii_digit()) => {
            int_part
        }
        _ => trimmed,
    };

    if strip_leading_zeros && !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        let stripped = trimmed.trim_start_matches('0');
        if stripped.is_empty() {
            "0".to_string()
        } else {
            stripped.to_string()
        }
    } else {
        trimmed.to_string()
    }
}

// ==========================================
// DataCleaner - 默认清洗器
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct DataCleaner {
    strip_leading_zeros: bool,
}

impl DataCleaner {
    pub fn new(strip_leading_zeros: bool) -> Self {
        Self {
            strip_leading_zeros,
        }
    }
}

impl Default for DataCleaner {
    fn default() -> Self {
        Self::new(true)
    }
}

impl DataCleanerTrait for DataCleaner {
    fn parse_float(&self, value: &str) -> Option<f64> {
        parse_float(value)
    }

    fn clean_article_number(&self, value: &str) -> String {
        clean_article_number(value, self.strip_leading_zeros)
    }
}
