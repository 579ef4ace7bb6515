// ==========================================
// 设备效能指标核心库 - 生产/停机领域模型
// ==========================================
// 职责: OEE 计算的输入记录、合并行与聚合结果
// 红线: 所有比率均为原始 f64，不做百分比格式化
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// ProductionRecord - 生产记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRecord {
    pub date: NaiveDate,         // 生产日期
    pub entity_id: String,       // 设备 ID
    pub production_hours: f64,   // 计划生产时长（小时）
    pub produced_units: u64,     // 产出数量
    pub defect_units: u64,       // 不良数量
    pub ideal_cycle_time: f64,   // 理想节拍（分钟/件）
    pub row_number: usize,       // 原始文件行号
}

// ==========================================
// DowntimeRecord - 停机记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DowntimeRecord {
    pub date: NaiveDate,
    pub entity_id: String,
    pub downtime_hours: f64, // 停机时长（小时）
    pub row_number: usize,
}

// ==========================================
// MergedMetricRow - 合并后的指标行
// ==========================================
// 每个 (date, entity_id) 一行；仅出现在一侧的行，另一侧字段为 None
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedMetricRow {
    pub date: NaiveDate,
    pub entity_id: String,

    // 输入（可能缺失）
    pub production_hours: Option<f64>,
    pub downtime_hours: Option<f64>,
    pub produced_units: Option<u64>,
    pub defect_units: Option<u64>,
    pub ideal_cycle_time: Option<f64>,

    // 派生
    pub operating_time: f64, // 实际运行时长（小时）
    pub availability: f64,   // 可用率
    pub performance: f64,    // 性能率（不封顶，可 > 1）
    pub quality: f64,        // 合格率
    pub oee: f64,            // availability × performance × quality
}

// ==========================================
// 聚合结果
// ==========================================

/// 按设备的平均 OEE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityOee {
    pub entity_id: String,
    pub oee: f64,
}

/// 按日期的平均 OEE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateOee {
    pub date: NaiveDate,
    pub oee: f64,
}

/// 按设备的四项指标平均值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMetrics {
    pub entity_id: String,
    pub availability: f64,
    pub performance: f64,
    pub quality: f64,
    pub oee: f64,
    pub row_count: usize,
}

/// 当前视图的整体平均（仪表盘）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallMetrics {
    pub availability: f64,
    pub performance: f64,
    pub quality: f64,
    pub oee: f64,
    pub row_count: usize,
}
