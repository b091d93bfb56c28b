// ==========================================
// CO2 计费工具 - 应用层
// ==========================================
// 职责: 会话状态管理，连接导入/处理/导出各层
// ==========================================

pub mod error;
pub mod preview;
pub mod session;

// 重导出
pub use error::{AppError, AppResult};
pub use preview::render_table;
pub use session::{PreviewView, Session};
