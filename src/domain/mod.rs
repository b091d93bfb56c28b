// ==========================================
// CO2 计费工具 - 领域模型层
// ==========================================
// 职责: 定义账单、排放因子、结果表等实体
// 红线: 不含文件读写逻辑
// ==========================================

pub mod billing;
pub mod emission;
pub mod table;
pub mod types;

// 重导出核心类型
pub use billing::{BillingLine, BillingTable, ExcludedFile, IncludedFile, LoadReport};
pub use emission::{
    EmissionFactor, EmissionFactorTable, EnrichedLine, EnrichedTable, ProcessSummary,
};
pub use table::{Cell, Table};
pub use types::{DqLevel, DqViolation};
