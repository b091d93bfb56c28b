// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 支持环境变量配置日志级别
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 根据配置选择默认过滤级别
fn default_filter(detailed: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if detailed { "debug" } else { "info" }))
}

/// 初始化日志系统
///
/// # 参数
/// - detailed: 是否输出详细日志（debug 级别）
/// - json: 是否使用 JSON 格式输出
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器，设置后优先于 detailed
///   例如: RUST_LOG=debug 或 RUST_LOG=co2_billing=trace
///
/// # 示例
/// ```no_run
/// use co2_billing::logging;
/// logging::init(false, false);
/// ```
pub fn init(detailed: bool, json: bool) {
    let filter = default_filter(detailed);

    // 重复初始化时忽略错误
    let _ = if json {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .try_init()
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_line_number(detailed)
            .with_writer(std::io::stderr)
            .try_init()
    };
}

/// 初始化测试环境的日志系统
///
/// 使用更详细的日志级别，便于调试
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_test();
        init_test();
        init(true, false);
        tracing::debug!("日志已初始化");
    }
}
