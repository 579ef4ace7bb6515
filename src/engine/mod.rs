// ==========================================
// 设备效能指标核心库 - 引擎层
// ==========================================
// 职责: OEE 连接与逐行指标、分组聚合、MTBF、RUL
// 红线: 引擎无状态、不做 IO；输入为已清洗的类型化记录
// ==========================================

pub mod aggregation;
pub mod error;
pub mod mtbf;
pub mod oee;
pub mod rul;

// 重导出核心引擎
pub use aggregation::Aggregator;
pub use error::{EngineError, EngineResult};
pub use mtbf::MtbfEngine;
pub use oee::{OeeEngine, RowMetrics};
pub use rul::{RulEngine, DEFAULT_RUL_FACTOR};
