// ==========================================
// CO2 计费工具 - 引擎层
// ==========================================
// 职责: 期间过滤、因子连接与排放量计算
// 红线: 引擎不读写文件
// ==========================================

pub mod co2_processor;
pub mod period_filter;

// 重导出核心引擎
pub use co2_processor::{process_billing_with_co2, Co2Processor};
pub use period_filter::{filter_by_date_range, filter_by_year, OutOfPeriodInfo, PeriodSplit};
