// ==========================================
// CO2 计费工具 - 核心库
// ==========================================
// 职责: 批量导入账单 → 映射排放因子 → 计算 CO2 → 导出
// 技术栈: Rust + csv + calamine + rust_xlsxwriter
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 数据结构
pub mod domain;

// 导入层 - 账单与因子表
pub mod importer;

// 引擎层 - 期间过滤与排放计算
pub mod engine;

// 导出层 - CSV / Excel
pub mod exporter;

// 配置层
pub mod config;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// 应用层 - 会话状态
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

pub use app::{AppError, AppResult, PreviewView, Session};
pub use config::{AppConfig, ConfigManager};
pub use domain::{
    BillingTable, Cell, EmissionFactorTable, EnrichedTable, LoadReport, ProcessSummary, Table,
};
pub use engine::{filter_by_date_range, process_billing_with_co2};
pub use exporter::{export_table, ExportFormat};
pub use importer::{load_billing_files, load_emission_factors};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称（日志与命令行帮助）
pub const APP_NAME: &str = "CO2 Billing";
