// ==========================================
// 设备效能指标核心库 - 计算配置
// ==========================================
// 职责: API 层使用的强类型配置（由 ConfigManager 生成，也可直接构造）
// ==========================================

use crate::domain::types::RulNormalization;
use crate::engine::rul::DEFAULT_RUL_FACTOR;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// DQ 报告默认展示的违规样本数
pub const DEFAULT_DQ_SAMPLE_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 启发式 RUL 系数（rul_hours = mtbf_hours × factor）
    pub rul_factor: f64,
    /// 启发式 RUL 百分比的归一化基准
    pub rul_normalization: RulNormalization,
    /// 违规样本展示数
    pub dq_sample_size: usize,
    /// 额外日期格式（chrono 格式串，优先于内置格式）
    pub extra_date_formats: Vec<String>,
    /// 额外列别名（规范列 → 拼写列表）
    pub extra_aliases: HashMap<String, Vec<String>>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            rul_factor: DEFAULT_RUL_FACTOR,
            rul_normalization: RulNormalization::default(),
            dq_sample_size: DEFAULT_DQ_SAMPLE_SIZE,
            extra_date_formats: Vec::new(),
            extra_aliases: HashMap::new(),
        }
    }
}
