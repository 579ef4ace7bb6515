// ==========================================
// 设备效能指标核心库
// ==========================================
// 指标: OEE（可用率 × 性能率 × 合格率）、MTBF、RUL
// 流程: 文件解析 → 列名标准化 → 记录载入 + DQ → 引擎计算 → 聚合
// 定位: 纯计算核心（同步、无持久化），展示层由调用方负责
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 记录与值类型
pub mod domain;

// 导入层 - 外部表格
pub mod importer;

// 引擎层 - 指标计算
pub mod engine;

// 配置层
pub mod config;

// 日志系统
pub mod logging;

// 性能统计
pub mod perf;

// API 层 - 组合入口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{EntityFilter, RulMode, RulNormalization, TableKind};

// 领域实体
pub use domain::{
    DqReport, DowntimeRecord, EquipmentRecord, FailureRecord, MergedMetricRow, MtbfRow,
    OperatingRecord, ProductionRecord, RawTable, RulRow, VibrationRecord,
};

// 引擎
pub use engine::{Aggregator, MtbfEngine, OeeEngine, RulEngine};

// API
pub use api::{ApiError, ApiResult, MaintenanceApi, OeeApi};

// 配置
pub use config::{ConfigManager, MetricsConfig};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "设备效能指标核心库";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
