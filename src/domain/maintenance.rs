// ==========================================
// 设备效能指标核心库 - 维护/可靠性领域模型
// ==========================================
// 职责: MTBF / RUL 计算的输入记录与结果行
// ==========================================

use crate::domain::types::RulMode;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// 输入记录
// ==========================================

/// 运行时长记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingRecord {
    pub entity_id: String,
    pub date: NaiveDate,
    pub operating_hours: f64,
    pub row_number: usize,
}

/// 故障/维修记录（每行计一次故障）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub entity_id: String,
    pub failure_date: NaiveDate,
    pub description: Option<String>,
    pub row_number: usize,
}

/// 设备寿命记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentRecord {
    pub entity_id: String,
    pub manufacture_date: NaiveDate, // 出厂日期
    pub expire_date: NaiveDate,      // 设计寿命到期日
    pub row_number: usize,
}

/// 振动采样记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VibrationRecord {
    pub entity_id: String,
    pub timestamp: NaiveDateTime,
    pub vibration_level: f64, // mm/s
    pub row_number: usize,
}

// ==========================================
// MtbfRow - 每台设备的 MTBF
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MtbfRow {
    pub entity_id: String,
    pub total_operating_hours: Option<f64>, // 无运行记录时为 None
    pub failure_count: usize,
    pub mtbf_hours: Option<u64>, // floor(total / count)；count = 0 或无运行记录时为 None
}

// ==========================================
// RulRow - 剩余寿命（扩展 MtbfRow）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulRow {
    #[serde(flatten)]
    pub mtbf: MtbfRow,
    pub mode: RulMode,

    // 启发式模式
    pub rul_hours: Option<f64>,

    // 寿命模式
    pub pump_age_days: Option<i64>,
    pub expected_lifespan_days: Option<i64>,

    // 两种模式共用（保留两位小数）
    pub rul_percent: Option<f64>,
}

impl RulRow {
    pub fn entity_id(&self) -> &str {
        &self.mtbf.entity_id
    }
}

// ==========================================
// 趋势数据
// ==========================================

/// 按日期的平均值（运行时长趋势）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateMean {
    pub date: NaiveDate,
    pub mean: f64,
    pub sample_count: usize,
}

/// 按采样时刻的平均振动
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VibrationPoint {
    pub timestamp: NaiveDateTime,
    pub mean_level: f64,
    pub sample_count: usize,
}
