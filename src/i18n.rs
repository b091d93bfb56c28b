// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库，词条见 locales/*.yml
// 语言: zh-CN / en / fr（命令行默认跟随配置 locale）
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

use tracing::warn;

/// 支持的语言
pub const SUPPORTED_LOCALES: [&str; 3] = ["zh-CN", "en", "fr"];

/// 将用户输入的语言代码归一到受支持的语言
///
/// 只看主语言部分，忽略地区与大小写：
/// `fr-FR` / `FR` → `fr`，`en_US` → `en`，`zh` / `zh-TW` → `zh-CN`
pub fn resolve_locale(requested: &str) -> Option<&'static str> {
    let primary = requested
        .trim()
        .split(|c: char| c == '-' || c == '_')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    match primary.as_str() {
        "zh" => Some("zh-CN"),
        "en" => Some("en"),
        "fr" => Some("fr"),
        _ => None,
    }
}

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 返回
/// - true: 已切换
/// - false: 不支持的语言，保持当前语言
pub fn set_locale(locale: &str) -> bool {
    match resolve_locale(locale) {
        Some(resolved) => {
            rust_i18n::set_locale(resolved);
            true
        }
        None => {
            warn!(locale, supported = ?SUPPORTED_LOCALES, "不支持的语言，保持当前设置");
            false
        }
    }
}

/// 翻译消息（无参数）
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息，替换 `%{name}` 占位符
///
/// # 示例
/// ```no_run
/// use co2_billing::i18n::t_with_args;
/// let msg = t_with_args("export.done", &[("path", "resultat.xlsx")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    args.iter()
        .fold(t(key), |msg, (name, value)| msg.replace(&format!("%{{{}}}", name), value))
}
