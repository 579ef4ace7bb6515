// ==========================================
// 设备效能指标核心库 - MTBF 引擎
// ==========================================
// 职责: 按设备汇总运行时长与故障次数，计算平均故障间隔
// 规则: mtbf_hours = floor(total_operating_hours / failure_count)
//       failure_count = 0 或无运行记录 → None
// ==========================================

use crate::domain::maintenance::{FailureRecord, MtbfRow, OperatingRecord};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

pub struct MtbfEngine;

impl MtbfEngine {
    pub fn new() -> Self {
        Self
    }

    /// 运行汇总 ⟗ 故障计数（按 entity_id 全外连接），按 entity_id 排序
    #[instrument(skip_all, fields(operating = operating.len(), failures = failures.len()))]
    pub fn compute(&self, operating: &[OperatingRecord], failures: &[FailureRecord]) -> Vec<MtbfRow> {
        let mut hours: BTreeMap<&str, f64> = BTreeMap::new();
        for record in operating {
            *hours.entry(record.entity_id.as_str()).or_insert(0.0) += record.operating_hours;
        }

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for record in failures {
            *counts.entry(record.entity_id.as_str()).or_insert(0) += 1;
        }

        let mut ids: Vec<&str> = hours.keys().chain(counts.keys()).copied().collect();
        ids.sort_unstable();
        ids.dedup();

        let rows: Vec<MtbfRow> = ids
            .into_iter()
            .map(|id| {
                let total = hours.get(id).copied();
                let count = counts.get(id).copied().unwrap_or(0);
                MtbfRow {
                    entity_id: id.to_string(),
                    total_operating_hours: total,
                    failure_count: count,
                    mtbf_hours: Self::mtbf_hours(total, count),
                }
            })
            .collect();

        debug!(entities = rows.len(), "MTBF 计算完成");
        rows
    }

    /// 整数向下取整；负的运行总时长视为无效数据
    pub fn mtbf_hours(total_operating_hours: Option<f64>, failure_count: usize) -> Option<u64> {
        let total = total_operating_hours?;
        if failure_count == 0 || !total.is_finite() || total < 0.0 {
            return None;
        }
        Some((total / failure_count as f64).floor() as u64)
    }
}

impl Default for MtbfEngine {
    fn default() -> Self {
        Self::new()
    }
}
