// ==========================================
// CO2 计费工具 - 配置层
// ==========================================
// 职责: 应用配置模型与 JSON 文件持久化
// ==========================================

pub mod app_config;
pub mod config_manager;
pub mod error;

// 重导出核心类型
pub use app_config::{AppConfig, BillingColumns, FactorHeaderMapping, PeriodConfig};
pub use config_manager::{default_config_path, ConfigManager};
pub use error::{ConfigError, ConfigResult};
