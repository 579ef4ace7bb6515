// ==========================================
// 设备效能指标核心库 - RUL 引擎（剩余使用寿命）
// ==========================================
// 两种模式:
// - 启发式 (HEURISTIC): rul_hours = mtbf_hours × factor
//   rul_percent = round2(100 × rul_hours / max(rul_hours))，max ≤ 0 → None
// - 寿命 (LIFESPAN): age = today - manufacture_date
//   lifespan = expire_date - manufacture_date
//   rul_percent = round2(max(0, (lifespan - age) / lifespan × 100))，lifespan ≤ 0 → None
// 红线: today 由调用方显式传入，引擎不读取系统时钟
// ==========================================

use crate::domain::maintenance::{EquipmentRecord, MtbfRow, RulRow};
use crate::domain::types::RulMode;
use crate::engine::error::{EngineError, EngineResult};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

/// 默认启发式系数
pub const DEFAULT_RUL_FACTOR: f64 = 1.0;

pub struct RulEngine;

impl RulEngine {
    pub fn new() -> Self {
        Self
    }

    // ==========================================
    // 启发式模式
    // ==========================================

    /// 以传入行集合内的最大 RUL 作为 100% 基准
    #[instrument(skip(self, rows), fields(entities = rows.len()))]
    pub fn heuristic(&self, rows: Vec<MtbfRow>, factor: f64) -> EngineResult<Vec<RulRow>> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(EngineError::InvalidRulFactor(factor));
        }

        let rul_hours: Vec<Option<f64>> = rows
            .iter()
            .map(|r| r.mtbf_hours.map(|m| m as f64 * factor))
            .collect();
        let max = rul_hours.iter().flatten().copied().fold(f64::NEG_INFINITY, f64::max);

        let result: Vec<RulRow> = rows
            .into_iter()
            .zip(rul_hours)
            .map(|(mtbf, hours)| {
                let rul_percent = hours.and_then(|h| (max > 0.0).then(|| Self::round2(100.0 * h / max)));
                RulRow {
                    mtbf,
                    mode: RulMode::Heuristic,
                    rul_hours: hours,
                    pump_age_days: None,
                    expected_lifespan_days: None,
                    rul_percent,
                }
            })
            .collect();

        debug!(max_rul_hours = max, "启发式 RUL 计算完成");
        Ok(result)
    }

    // ==========================================
    // 寿命模式
    // ==========================================

    /// MTBF 行与设备寿命表按 entity_id 全外连接
    ///
    /// 仅出现在设备表中的实体补一条空 MTBF 行；设备表重复 ID 取首条
    #[instrument(skip(self, rows, equipment), fields(entities = rows.len(), equipment = equipment.len()))]
    pub fn lifespan(
        &self,
        rows: Vec<MtbfRow>,
        equipment: &[EquipmentRecord],
        today: NaiveDate,
    ) -> Vec<RulRow> {
        let mut by_id: BTreeMap<&str, &EquipmentRecord> = BTreeMap::new();
        for record in equipment {
            if by_id.contains_key(record.entity_id.as_str()) {
                warn!(
                    entity_id = %record.entity_id,
                    row = record.row_number,
                    "设备寿命表存在重复 ID，保留首条记录"
                );
                continue;
            }
            by_id.insert(record.entity_id.as_str(), record);
        }

        let mut merged: BTreeMap<String, MtbfRow> = rows
            .into_iter()
            .map(|r| (r.entity_id.clone(), r))
            .collect();
        for id in by_id.keys() {
            merged.entry(id.to_string()).or_insert_with(|| MtbfRow {
                entity_id: id.to_string(),
                total_operating_hours: None,
                failure_count: 0,
                mtbf_hours: None,
            });
        }

        merged
            .into_values()
            .map(|mtbf| {
                let (age, lifespan, percent) = match by_id.get(mtbf.entity_id.as_str()) {
                    Some(record) => {
                        let (age, lifespan, percent) =
                            Self::lifespan_percent(record.manufacture_date, record.expire_date, today);
                        (Some(age), Some(lifespan), percent)
                    }
                    None => (None, None, None),
                };
                RulRow {
                    mtbf,
                    mode: RulMode::Lifespan,
                    rul_hours: None,
                    pump_age_days: age,
                    expected_lifespan_days: lifespan,
                    rul_percent: percent,
                }
            })
            .collect()
    }

    /// 返回 (设备年龄天数, 设计寿命天数, 剩余寿命百分比)
    pub fn lifespan_percent(
        manufacture_date: NaiveDate,
        expire_date: NaiveDate,
        today: NaiveDate,
    ) -> (i64, i64, Option<f64>) {
        let age = (today - manufacture_date).num_days();
        let lifespan = (expire_date - manufacture_date).num_days();
        if lifespan <= 0 {
            return (age, lifespan, None);
        }
        let remaining = (lifespan - age) as f64 / lifespan as f64 * 100.0;
        (age, lifespan, Some(Self::round2(remaining.max(0.0))))
    }

    // ==========================================
    // 汇总
    // ==========================================

    /// 视图内已定义 rul_percent 的平均值
    pub fn average_percent(rows: &[RulRow]) -> Option<f64> {
        let values: Vec<f64> = rows.iter().filter_map(|r| r.rul_percent).collect();
        if values.is_empty() {
            return None;
        }
        Some(Self::round2(values.iter().sum::<f64>() / values.len() as f64))
    }

    pub fn round2(value: f64) -> f64 {
        (value * 100.0).round() / 100.0
    }
}

impl Default for RulEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mtbf(id: &str, hours: Option<u64>) -> MtbfRow {
        MtbfRow {
            entity_id: id.to_string(),
            total_operating_hours: hours.map(|h| h as f64 * 2.0),
            failure_count: if hours.is_some() { 2 } else { 0 },
            mtbf_hours: hours,
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_heuristic_normalized_to_max() {
        let engine = RulEngine::new();
        let rows = engine
            .heuristic(vec![mtbf("1", Some(100)), mtbf("2", Some(50)), mtbf("3", None)], 1.5)
            .unwrap();

        assert_eq!(rows[0].rul_hours, Some(150.0));
        assert_eq!(rows[0].rul_percent, Some(100.0));
        assert_eq!(rows[1].rul_percent, Some(50.0));
        assert_eq!(rows[2].rul_hours, None);
        assert_eq!(rows[2].rul_percent, None);
        assert!(rows.iter().all(|r| r.mode == RulMode::Heuristic));
    }

    #[test]
    fn test_heuristic_zero_max() {
        let engine = RulEngine::new();
        let rows = engine.heuristic(vec![mtbf("1", Some(0))], 1.5).unwrap();

        assert_eq!(rows[0].rul_hours, Some(0.0));
        assert_eq!(rows[0].rul_percent, None);
    }

    #[test]
    fn test_invalid_factor() {
        let engine = RulEngine::new();
        assert_eq!(
            engine.heuristic(vec![], 0.0),
            Err(EngineError::InvalidRulFactor(0.0))
        );
        assert!(engine.heuristic(vec![], f64::NAN).is_err());
    }

    #[test]
    fn test_lifespan_reference_scenario() {
        let (age, lifespan, percent) =
            RulEngine::lifespan_percent(ymd(2015, 1, 1), ymd(2025, 1, 1), ymd(2024, 6, 15));

        assert_eq!(lifespan, 3653);
        assert_eq!(age, 3453);
        assert_eq!(percent, Some(5.47));
    }

    #[test]
    fn test_lifespan_clamped_after_expiry() {
        let (_, _, percent) =
            RulEngine::lifespan_percent(ymd(2015, 1, 1), ymd(2020, 1, 1), ymd(2024, 6, 15));
        assert_eq!(percent, Some(0.0));
    }

    #[test]
    fn test_lifespan_non_positive() {
        let (_, lifespan, percent) =
            RulEngine::lifespan_percent(ymd(2020, 1, 1), ymd(2020, 1, 1), ymd(2024, 6, 15));
        assert_eq!(lifespan, 0);
        assert_eq!(percent, None);
    }

    #[test]
    fn test_lifespan_join_with_equipment() {
        let engine = RulEngine::new();
        let equipment = vec![
            EquipmentRecord {
                entity_id: "1".to_string(),
                manufacture_date: ymd(2015, 1, 1),
                expire_date: ymd(2025, 1, 1),
                row_number: 1,
            },
            EquipmentRecord {
                entity_id: "9".to_string(),
                manufacture_date: ymd(2020, 1, 1),
                expire_date: ymd(2030, 1, 1),
                row_number: 2,
            },
        ];

        let rows = engine.lifespan(
            vec![mtbf("1", Some(6)), mtbf("2", Some(10))],
            &equipment,
            ymd(2024, 6, 15),
        );

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].entity_id(), "1");
        assert_eq!(rows[0].rul_percent, Some(5.47));
        assert_eq!(rows[1].entity_id(), "2");
        assert_eq!(rows[1].rul_percent, None);
        assert_eq!(rows[2].entity_id(), "9");
        assert_eq!(rows[2].mtbf.failure_count, 0);
        assert!(rows[2].rul_percent.is_some());
    }

    #[test]
    fn test_average_percent() {
        let engine = RulEngine::new();
        let rows = engine
            .heuristic(vec![mtbf("1", Some(100)), mtbf("2", Some(50)), mtbf("3", None)], 1.0)
            .unwrap();

        assert_eq!(RulEngine::average_percent(&rows), Some(75.0));
        assert_eq!(RulEngine::average_percent(&[]), None);
    }
}
