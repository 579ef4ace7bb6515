// ==========================================
// 设备效能指标核心库 - OEE 引擎
// ==========================================
// 职责: 生产记录 ⟗ 停机记录（按 date + entity_id 全外连接） + 逐行指标
// 红线: 无状态引擎，所有方法都是纯函数；除零回退为 0，不抛错
// ==========================================
// availability = (ph - dh) / ph                  (ph > 0，否则 0)
// operating    = ph - dh
// performance  = (ict × units) / (operating × 60) (operating > 0 且 units > 0，否则 0)
// quality      = (units - defects) / units        (units > 0，否则 0)
// oee          = availability × performance × quality
// 仅一侧有记录的行: 停机或生产时长未定义，除合格率外全部按 0
// ==========================================

use crate::domain::production::{DowntimeRecord, MergedMetricRow, ProductionRecord};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// 小时 → 分钟
const MINUTES_PER_HOUR: f64 = 60.0;

/// 单行指标（纯计算结果）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowMetrics {
    pub operating_time: f64,
    pub availability: f64,
    pub performance: f64,
    pub quality: f64,
    pub oee: f64,
}

// ==========================================
// OeeEngine - OEE 计算引擎
// ==========================================
pub struct OeeEngine;

impl OeeEngine {
    pub fn new() -> Self {
        Self
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 全外连接并逐行计算
    ///
    /// # 规则
    /// - 连接键固定为 (date, entity_id)
    /// - 同一键在一侧出现多次时按关系连接产生笛卡尔积
    /// - 仅出现在一侧的键，另一侧字段为 None；缺停机记录不等于零停机，
    ///   运行时长、可用率、性能率、OEE 均为 0（合格率仍由生产记录得出）
    /// - 输出按 (date, entity_id) 排序
    #[instrument(skip_all, fields(production = production.len(), downtime = downtime.len()))]
    pub fn compute(
        &self,
        production: &[ProductionRecord],
        downtime: &[DowntimeRecord],
    ) -> Vec<MergedMetricRow> {
        type Side<'a> = (Vec<&'a ProductionRecord>, Vec<&'a DowntimeRecord>);
        let mut joined: BTreeMap<(NaiveDate, &str), Side<'_>> = BTreeMap::new();

        for p in production {
            joined
                .entry((p.date, p.entity_id.as_str()))
                .or_default()
                .0
                .push(p);
        }
        for d in downtime {
            joined
                .entry((d.date, d.entity_id.as_str()))
                .or_default()
                .1
                .push(d);
        }

        let mut rows = Vec::with_capacity(joined.len());
        for ((date, entity_id), (prods, downs)) in joined {
            match (prods.is_empty(), downs.is_empty()) {
                (false, false) => {
                    for p in &prods {
                        for d in &downs {
                            rows.push(self.merge_row(date, entity_id, Some(p), Some(d)));
                        }
                    }
                }
                (false, true) => {
                    for p in &prods {
                        rows.push(self.merge_row(date, entity_id, Some(p), None));
                    }
                }
                (true, false) => {
                    for d in &downs {
                        rows.push(self.merge_row(date, entity_id, None, Some(d)));
                    }
                }
                (true, true) => {}
            }
        }

        debug!(merged = rows.len(), "OEE 合并计算完成");
        rows
    }

    /// 构造一条合并行
    pub fn merge_row(
        &self,
        date: NaiveDate,
        entity_id: &str,
        production: Option<&ProductionRecord>,
        downtime: Option<&DowntimeRecord>,
    ) -> MergedMetricRow {
        let production_hours = production.map(|p| p.production_hours);
        let produced_units = production.map(|p| p.produced_units);
        let defect_units = production.map(|p| p.defect_units);
        let ideal_cycle_time = production.map(|p| p.ideal_cycle_time);
        let downtime_hours = downtime.map(|d| d.downtime_hours);

        let metrics = match (production, downtime) {
            (Some(p), Some(d)) => Self::evaluate(
                p.production_hours,
                d.downtime_hours,
                p.produced_units,
                p.defect_units,
                p.ideal_cycle_time,
            ),
            _ => Self::undefined(produced_units.unwrap_or(0), defect_units.unwrap_or(0)),
        };

        MergedMetricRow {
            date,
            entity_id: entity_id.to_string(),
            production_hours,
            downtime_hours,
            produced_units,
            defect_units,
            ideal_cycle_time,
            operating_time: metrics.operating_time,
            availability: metrics.availability,
            performance: metrics.performance,
            quality: metrics.quality,
            oee: metrics.oee,
        }
    }

    // ==========================================
    // 单行公式
    // ==========================================

    pub fn evaluate(
        production_hours: f64,
        downtime_hours: f64,
        produced_units: u64,
        defect_units: u64,
        ideal_cycle_time: f64,
    ) -> RowMetrics {
        let operating_time = production_hours - downtime_hours;
        let availability = Self::availability(production_hours, downtime_hours);
        let performance = Self::performance(ideal_cycle_time, produced_units, operating_time);
        let quality = Self::quality(produced_units, defect_units);

        RowMetrics {
            operating_time,
            availability,
            performance,
            quality,
            oee: availability * performance * quality,
        }
    }

    /// 单侧行: 可用率无定义，回退为 0
    fn undefined(produced_units: u64, defect_units: u64) -> RowMetrics {
        RowMetrics {
            operating_time: 0.0,
            availability: 0.0,
            performance: 0.0,
            quality: Self::quality(produced_units, defect_units),
            oee: 0.0,
        }
    }

    pub fn availability(production_hours: f64, downtime_hours: f64) -> f64 {
        if production_hours > 0.0 {
            (production_hours - downtime_hours) / production_hours
        } else {
            0.0
        }
    }

    /// 不封顶：节拍假设偏乐观时可 > 1
    pub fn performance(ideal_cycle_time: f64, produced_units: u64, operating_time: f64) -> f64 {
        if operating_time > 0.0 && produced_units > 0 {
            (ideal_cycle_time * produced_units as f64) / (operating_time * MINUTES_PER_HOUR)
        } else {
            0.0
        }
    }

    /// 不良数 > 产出数时为负（由 DQ 报告告警，不在此截断）
    pub fn quality(produced_units: u64, defect_units: u64) -> f64 {
        if produced_units > 0 {
            (produced_units as f64 - defect_units as f64) / produced_units as f64
        } else {
            0.0
        }
    }
}

impl Default for OeeEngine {
    fn default() -> Self {
        Self::new()
    }
}
