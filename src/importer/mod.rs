// ==========================================
// CO2 计费工具 - 导入层
// ==========================================
// 职责: 账单文件与排放因子表的读取、映射、清洗、校验
// 支持: CSV, Excel
// ==========================================

// 模块声明
pub mod billing_loader;
pub mod conflict_handler;
pub mod data_cleaner;
pub mod error;
pub mod factor_loader;
pub mod field_mapper;
pub mod file_parser;
pub mod importer_trait;

// 重导出核心类型
pub use billing_loader::{load_billing_files, BillingImporter};
pub use conflict_handler::ConflictHandler;
pub use data_cleaner::DataCleaner as DataCleanerImpl;
pub use error::{ImportError, ImportResult};
pub use factor_loader::{load_emission_factors, FactorImporter};
pub use field_mapper::{ColumnRenames, FieldMapper};
pub use file_parser::{is_supported_file, CsvParser, ExcelParser, UniversalFileParser};

// 重导出 Trait 接口
pub use importer_trait::{DataCleaner, FileParser, RawRecord, RawSheet};
