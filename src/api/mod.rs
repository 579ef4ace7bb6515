// ==========================================
// 设备效能指标核心库 - API 层
// ==========================================
// 职责: 组合导入层与引擎层，提供 OEE / 维护两类计算入口
// 调用方: 命令行、嵌入方（看板等展示层）
// ==========================================

pub mod error;
pub mod maintenance_api;
pub mod oee_api;
pub mod pipeline;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use maintenance_api::{MaintenanceApi, MaintenanceDataset, MaintenanceReport, MaintenanceTables};
pub use oee_api::{OeeApi, OeeDataset, OeeReport};
pub use pipeline::ImportPipeline;
