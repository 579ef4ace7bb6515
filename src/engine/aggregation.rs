// ==========================================
// 设备效能指标核心库 - 聚合引擎
// ==========================================
// 职责: 按设备 / 日期 / 时间戳分组求均值，实体过滤
// 红线: 空分组不会出现（分组来自数据本身）；空输入 → 空输出
// ==========================================

use crate::domain::maintenance::{DateMean, OperatingRecord, VibrationPoint, VibrationRecord};
use crate::domain::production::{DateOee, EntityMetrics, EntityOee, MergedMetricRow, OverallMetrics};
use crate::domain::types::EntityFilter;
use std::collections::BTreeMap;

/// 分组累加器（和 + 计数）
#[derive(Debug, Clone, Copy, Default)]
struct MeanAcc {
    sum: f64,
    count: usize,
}

impl MeanAcc {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

pub struct Aggregator;

impl Aggregator {
    pub fn new() -> Self {
        Self
    }

    // ==========================================
    // 通用分组
    // ==========================================

    /// 按 key 分组求均值，返回 key → (均值, 样本数)，key 升序
    pub fn mean_by<T, K, FK, FV>(items: &[T], key: FK, value: FV) -> BTreeMap<K, (f64, usize)>
    where
        K: Ord,
        FK: Fn(&T) -> K,
        FV: Fn(&T) -> f64,
    {
        let mut groups: BTreeMap<K, MeanAcc> = BTreeMap::new();
        for item in items {
            groups.entry(key(item)).or_default().push(value(item));
        }
        groups
            .into_iter()
            .map(|(k, acc)| (k, (acc.mean(), acc.count)))
            .collect()
    }

    /// 算术平均；空输入为 None
    pub fn mean<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
        let mut acc = MeanAcc::default();
        for v in values {
            acc.push(v);
        }
        (acc.count > 0).then(|| acc.mean())
    }

    // ==========================================
    // OEE 聚合
    // ==========================================

    pub fn filter_rows(&self, rows: &[MergedMetricRow], filter: &EntityFilter) -> Vec<MergedMetricRow> {
        rows.iter()
            .filter(|r| filter.matches(&r.entity_id))
            .cloned()
            .collect()
    }

    pub fn oee_by_entity(&self, rows: &[MergedMetricRow]) -> Vec<EntityOee> {
        Self::mean_by(rows, |r| r.entity_id.clone(), |r| r.oee)
            .into_iter()
            .map(|(entity_id, (oee, _))| EntityOee { entity_id, oee })
            .collect()
    }

    pub fn oee_by_date(&self, rows: &[MergedMetricRow]) -> Vec<DateOee> {
        Self::mean_by(rows, |r| r.date, |r| r.oee)
            .into_iter()
            .map(|(date, (oee, _))| DateOee { date, oee })
            .collect()
    }

    /// 按设备的四项指标平均（对比表）
    pub fn metrics_by_entity(&self, rows: &[MergedMetricRow]) -> Vec<EntityMetrics> {
        let mut groups: BTreeMap<&str, Vec<&MergedMetricRow>> = BTreeMap::new();
        for row in rows {
            groups.entry(row.entity_id.as_str()).or_default().push(row);
        }

        groups
            .into_iter()
            .map(|(entity_id, group)| {
                let overall = Self::summarize(&group);
                EntityMetrics {
                    entity_id: entity_id.to_string(),
                    availability: overall.availability,
                    performance: overall.performance,
                    quality: overall.quality,
                    oee: overall.oee,
                    row_count: overall.row_count,
                }
            })
            .collect()
    }

    /// 当前视图整体平均；空视图为 None
    pub fn overall(&self, rows: &[MergedMetricRow]) -> Option<OverallMetrics> {
        if rows.is_empty() {
            return None;
        }
        let refs: Vec<&MergedMetricRow> = rows.iter().collect();
        Some(Self::summarize(&refs))
    }

    fn summarize(rows: &[&MergedMetricRow]) -> OverallMetrics {
        let mut a = MeanAcc::default();
        let mut p = MeanAcc::default();
        let mut q = MeanAcc::default();
        let mut o = MeanAcc::default();
        for row in rows {
            a.push(row.availability);
            p.push(row.performance);
            q.push(row.quality);
            o.push(row.oee);
        }
        OverallMetrics {
            availability: a.mean(),
            performance: p.mean(),
            quality: q.mean(),
            oee: o.mean(),
            row_count: rows.len(),
        }
    }

    // ==========================================
    // 维护趋势
    // ==========================================

    /// 每日平均运行时长（跨设备）
    pub fn operating_hours_by_date(&self, records: &[OperatingRecord]) -> Vec<DateMean> {
        Self::mean_by(records, |r| r.date, |r| r.operating_hours)
            .into_iter()
            .map(|(date, (mean, sample_count))| DateMean {
                date,
                mean,
                sample_count,
            })
            .collect()
    }

    /// 每个时间戳的平均振动值（跨设备）
    pub fn vibration_by_timestamp(&self, records: &[VibrationRecord]) -> Vec<VibrationPoint> {
        Self::mean_by(records, |r| r.timestamp, |r| r.vibration_level)
            .into_iter()
            .map(|(timestamp, (mean_level, sample_count))| VibrationPoint {
                timestamp,
                mean_level,
                sample_count,
            })
            .collect()
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(d: u32, id: &str, a: f64, p: f64, q: f64) -> MergedMetricRow {
        MergedMetricRow {
            date: NaiveDate::from_ymd_opt(2024, 6, d).unwrap(),
            entity_id: id.to_string(),
            production_hours: None,
            downtime_hours: None,
            produced_units: None,
            defect_units: None,
            ideal_cycle_time: None,
            operating_time: 0.0,
            availability: a,
            performance: p,
            quality: q,
            oee: a * p * q,
        }
    }

    #[test]
    fn test_oee_by_entity_mean() {
        let agg = Aggregator::new();
        let rows = vec![row(15, "A", 1.0, 0.5, 1.0), row(16, "A", 1.0, 1.0, 1.0), row(15, "B", 0.5, 1.0, 1.0)];

        let by_entity = agg.oee_by_entity(&rows);

        assert_eq!(by_entity.len(), 2);
        assert_eq!(by_entity[0].entity_id, "A");
        assert_eq!(by_entity[0].oee, 0.75);
        assert_eq!(by_entity[1].oee, 0.5);
    }

    #[test]
    fn test_oee_by_date_sorted() {
        let agg = Aggregator::new();
        let rows = vec![row(16, "A", 1.0, 1.0, 1.0), row(15, "A", 0.5, 1.0, 1.0), row(15, "B", 1.0, 1.0, 1.0)];

        let by_date = agg.oee_by_date(&rows);

        assert_eq!(by_date.len(), 2);
        assert!(by_date[0].date < by_date[1].date);
        assert_eq!(by_date[0].oee, 0.75);
    }

    #[test]
    fn test_mean_by_idempotent_on_own_output() {
        let pairs = vec![("A", 1.0), ("A", 3.0), ("B", 5.0)];
        let once = Aggregator::mean_by(&pairs, |p| p.0, |p| p.1);
        let flattened: Vec<(&str, f64)> = once.iter().map(|(k, (m, _))| (*k, *m)).collect();
        let twice = Aggregator::mean_by(&flattened, |p| p.0, |p| p.1);

        for (k, (m, _)) in &once {
            assert_eq!(twice[k].0, *m);
        }
    }

    #[test]
    fn test_filter_unknown_entity_is_empty() {
        let agg = Aggregator::new();
        let rows = vec![row(15, "A", 1.0, 1.0, 1.0)];

        let filtered = agg.filter_rows(&rows, &EntityFilter::Only("Z".to_string()));

        assert!(filtered.is_empty());
        assert!(agg.overall(&filtered).is_none());
        assert!(agg.oee_by_entity(&filtered).is_empty());
    }

    #[test]
    fn test_metrics_by_entity() {
        let agg = Aggregator::new();
        let rows = vec![row(15, "A", 1.0, 0.5, 1.0), row(16, "A", 0.5, 1.0, 0.5)];

        let metrics = agg.metrics_by_entity(&rows);

        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].availability, 0.75);
        assert_eq!(metrics[0].performance, 0.75);
        assert_eq!(metrics[0].quality, 0.75);
        assert_eq!(metrics[0].row_count, 2);
    }

    #[test]
    fn test_mean_empty() {
        assert_eq!(Aggregator::mean(Vec::<f64>::new()), None);
        assert_eq!(Aggregator::mean(vec![1.0, 2.0]), Some(1.5));
    }
}
