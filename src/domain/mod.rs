// ==========================================
// 设备效能指标核心库 - 领域模型层
// ==========================================
// 职责: 定义输入记录、派生行、聚合结果与数据质量类型
// 红线: 不含解析逻辑,不含计算逻辑
// ==========================================

pub mod maintenance;
pub mod production;
pub mod quality;
pub mod table;
pub mod types;

// 重导出核心类型
pub use maintenance::{
    DateMean, EquipmentRecord, FailureRecord, MtbfRow, OperatingRecord, RulRow, VibrationPoint,
    VibrationRecord,
};
pub use production::{
    DateOee, DowntimeRecord, EntityMetrics, EntityOee, MergedMetricRow, OverallMetrics,
    ProductionRecord,
};
pub use quality::{DqLevel, DqReport, DqSummary, DqViolation};
pub use table::RawTable;
pub use types::{EntityFilter, RulMode, RulNormalization, TableKind};
