// ==========================================
// CO2 计费工具 - 应用层错误类型
// ==========================================
// 职责: 汇总导入/导出/配置错误，并补充会话状态错误
// ==========================================

use crate::config::ConfigError;
use crate::exporter::ExportError;
use crate::importer::ImportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    // ===== 会话状态错误 =====
    #[error("尚未加载账单文件")]
    NoBillingLoaded,

    #[error("尚未加载排放因子表")]
    NoFactorsLoaded,

    #[error("没有可导出的数据")]
    NothingToExport,

    #[error("没有期间外的账单")]
    NoOutOfPeriodData,
}

pub type AppResult<T> = Result<T, AppError>;
