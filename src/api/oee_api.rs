// ==========================================
// 设备效能指标核心库 - OEE API
// ==========================================
// 职责: 生产 + 停机两张表 → 合并行 + 聚合 + DQ 报告
// 流程: 解析 → 标准化 → 连接键检查 → 载入 → 跨表检查 | 过滤 → 计算 → 聚合
// ==========================================

use crate::api::error::ApiResult;
use crate::api::pipeline::ImportPipeline;
use crate::config::MetricsConfig;
use crate::domain::production::{
    DateOee, DowntimeRecord, EntityMetrics, EntityOee, MergedMetricRow, OverallMetrics,
    ProductionRecord,
};
use crate::domain::quality::{DqLevel, DqReport, DqViolation};
use crate::domain::table::RawTable;
use crate::domain::types::{EntityFilter, TableKind};
use crate::engine::{Aggregator, OeeEngine};
use crate::importer::{columns, AliasTable, ColumnCollision, DqValidator};
use crate::perf::{record_rows, PerfGuard};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::{info, instrument};
use uuid::Uuid;

/// 连接键
const JOIN_KEYS: [&str; 2] = [columns::DATE, columns::ENTITY_ID];

// ==========================================
// 数据集（载入后、计算前）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OeeDataset {
    pub batch_id: String, // 导入批次 ID（UUID v4）
    pub production: Vec<ProductionRecord>,
    pub downtime: Vec<DowntimeRecord>,
    pub dq_reports: Vec<DqReport>,
    pub collisions: Vec<ColumnCollision>,
}

impl OeeDataset {
    /// 两张表出现过的全部设备 ID（升序去重）
    pub fn entity_ids(&self) -> Vec<String> {
        let ids: BTreeSet<&str> = self
            .production
            .iter()
            .map(|r| r.entity_id.as_str())
            .chain(self.downtime.iter().map(|r| r.entity_id.as_str()))
            .collect();
        ids.into_iter().map(str::to_string).collect()
    }
}

// ==========================================
// 计算结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OeeReport {
    pub batch_id: String,
    pub filter: EntityFilter,
    pub rows: Vec<MergedMetricRow>,
    pub by_entity: Vec<EntityOee>,
    pub by_date: Vec<DateOee>,
    pub entity_metrics: Vec<EntityMetrics>,
    pub overall: Option<OverallMetrics>,
    pub entity_ids: Vec<String>,
    pub dq_reports: Vec<DqReport>,
    pub collisions: Vec<ColumnCollision>,
}

// ==========================================
// OeeApi
// ==========================================
pub struct OeeApi {
    config: MetricsConfig,
    pipeline: ImportPipeline,
    engine: OeeEngine,
    aggregator: Aggregator,
    validator: DqValidator,
}

impl OeeApi {
    pub fn new(config: MetricsConfig) -> Self {
        let pipeline = ImportPipeline::new(AliasTable::oee_default(), &config);
        Self {
            config,
            pipeline,
            engine: OeeEngine::new(),
            aggregator: Aggregator::new(),
            validator: DqValidator::new(),
        }
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// 从文件载入（CSV / Excel / JSON）
    pub fn load_files(&self, production: &Path, downtime: &Path) -> ApiResult<OeeDataset> {
        let production = self.pipeline.read(production)?;
        let downtime = self.pipeline.read(downtime)?;
        self.from_tables(production, downtime)
    }

    /// 从内存表载入
    ///
    /// # 错误
    /// - 任一表缺少 date / entity_id → ApiError::JoinKey
    /// - 缺少其他必需列 → ImportError::MissingColumns
    #[instrument(skip_all, fields(production = production.len(), downtime = downtime.len()))]
    pub fn from_tables(&self, production: RawTable, downtime: RawTable) -> ApiResult<OeeDataset> {
        let _perf = PerfGuard::new("oee_load");

        let mut collisions = Vec::new();
        let production = self
            .pipeline
            .normalize(TableKind::Production, production, &mut collisions);
        let downtime = self
            .pipeline
            .normalize(TableKind::Downtime, downtime, &mut collisions);

        ImportPipeline::require_join_keys(TableKind::Production, &production, &JOIN_KEYS)?;
        ImportPipeline::require_join_keys(TableKind::Downtime, &downtime, &JOIN_KEYS)?;

        let loader = self.pipeline.loader();
        let production = loader.load_production(&production)?;
        let downtime = loader.load_downtime(&downtime)?;
        record_rows(production.records.len() + downtime.records.len());

        let mut production_report = production.report;
        let mut downtime_report = downtime.report;

        for v in self.validator.validate_unique_keys(
            production
                .records
                .iter()
                .map(|r| (format!("{}|{}", r.date, r.entity_id), r.row_number, r.entity_id.as_str())),
        ) {
            production_report.record(v);
        }
        for v in self.validator.validate_unique_keys(
            downtime
                .records
                .iter()
                .map(|r| (format!("{}|{}", r.date, r.entity_id), r.row_number, r.entity_id.as_str())),
        ) {
            downtime_report.record(v);
        }
        for v in Self::downtime_exceeds_production(&production.records, &downtime.records) {
            downtime_report.record(v);
        }
        for v in Self::production_without_downtime(&production.records, &downtime.records) {
            production_report.record(v);
        }

        let batch_id = Uuid::new_v4().to_string();
        info!(
            batch_id = %batch_id,
            production = production.records.len(),
            downtime = downtime.records.len(),
            collisions = collisions.len(),
            "OEE 数据集载入完成"
        );

        Ok(OeeDataset {
            batch_id,
            production: production.records,
            downtime: downtime.records,
            dq_reports: vec![production_report, downtime_report],
            collisions,
        })
    }

    /// 合并、过滤、聚合
    ///
    /// 过滤作用于合并行；未知设备 ID 返回空结果
    #[instrument(skip_all, fields(filter = %filter))]
    pub fn compute(&self, dataset: &OeeDataset, filter: &EntityFilter) -> OeeReport {
        let _perf = PerfGuard::new("oee_compute");

        let merged = self.engine.compute(&dataset.production, &dataset.downtime);
        let rows = self.aggregator.filter_rows(&merged, filter);
        record_rows(rows.len());

        OeeReport {
            batch_id: dataset.batch_id.clone(),
            filter: filter.clone(),
            by_entity: self.aggregator.oee_by_entity(&rows),
            by_date: self.aggregator.oee_by_date(&rows),
            entity_metrics: self.aggregator.metrics_by_entity(&rows),
            overall: self.aggregator.overall(&rows),
            entity_ids: dataset.entity_ids(),
            dq_reports: dataset.dq_reports.clone(),
            collisions: dataset.collisions.clone(),
            rows,
        }
    }

    /// 载入 + 计算
    pub fn run(&self, production: &Path, downtime: &Path, filter: &EntityFilter) -> ApiResult<OeeReport> {
        let dataset = self.load_files(production, downtime)?;
        Ok(self.compute(&dataset, filter))
    }

    /// 停机时长超过同键生产时长（可用率为负）
    fn downtime_exceeds_production(
        production: &[ProductionRecord],
        downtime: &[DowntimeRecord],
    ) -> Vec<DqViolation> {
        let mut hours: HashMap<(chrono::NaiveDate, &str), f64> = HashMap::new();
        for p in production {
            *hours.entry((p.date, p.entity_id.as_str())).or_insert(0.0) += p.production_hours;
        }

        downtime
            .iter()
            .filter_map(|d| {
                let ph = hours.get(&(d.date, d.entity_id.as_str()))?;
                (d.downtime_hours > *ph).then(|| DqViolation {
                    row_number: d.row_number,
                    entity_id: Some(d.entity_id.clone()),
                    level: DqLevel::Warning,
                    field: columns::DOWNTIME_HOURS.to_string(),
                    message: format!("停机时长 {} 大于生产时长 {}", d.downtime_hours, ph),
                })
            })
            .collect()
    }

    /// 生产记录无同键停机记录（该行可用率与 OEE 记为 0）
    fn production_without_downtime(
        production: &[ProductionRecord],
        downtime: &[DowntimeRecord],
    ) -> Vec<DqViolation> {
        let keys: BTreeSet<(chrono::NaiveDate, &str)> = downtime
            .iter()
            .map(|d| (d.date, d.entity_id.as_str()))
            .collect();

        production
            .iter()
            .filter(|p| !keys.contains(&(p.date, p.entity_id.as_str())))
            .map(|p| DqViolation {
                row_number: p.row_number,
                entity_id: Some(p.entity_id.clone()),
                level: DqLevel::Warning,
                field: columns::DOWNTIME_HOURS.to_string(),
                message: format!("{} 无停机记录，可用率无法计算", p.date),
            })
            .collect()
    }
}

impl Default for OeeApi {
    fn default() -> Self {
        Self::new(MetricsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::ImportError;
    use crate::api::error::ApiError;

    fn table(columns: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::from_rows(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|v| v.to_string()).collect())
                .collect(),
        )
    }

    fn production() -> RawTable {
        table(
            &["Date", "Id", "ProductionHours", "ProducedGoods", "DefectGoods", "IdealCycle"],
            &[
                &["2024-06-15", "11", "21", "817", "42", "1.4"],
                &["2024-06-15", "12", "2", "100", "0", "1.0"],
            ],
        )
    }

    fn downtime() -> RawTable {
        table(
            &["Date", "Id", "DownTimeHrs"],
            &[&["2024-06-15T00:00:00.000", "11", "1"], &["2024-06-15", "12", "3"]],
        )
    }

    #[test]
    fn test_end_to_end_from_tables() {
        let api = OeeApi::default();
        let dataset = api.from_tables(production(), downtime()).unwrap();
        let report = api.compute(&dataset, &EntityFilter::All);

        assert_eq!(report.rows.len(), 2);
        assert!((report.rows[0].oee - 0.8611).abs() < 1e-4);
        assert_eq!(report.entity_ids, vec!["11".to_string(), "12".to_string()]);
        assert!(report.overall.is_some());
    }

    #[test]
    fn test_downtime_exceeding_production_is_warning() {
        let api = OeeApi::default();
        let dataset = api.from_tables(production(), downtime()).unwrap();

        let downtime_report = &dataset.dq_reports[1];
        assert_eq!(downtime_report.summary.warning, 1);
        assert_eq!(downtime_report.violations[0].entity_id.as_deref(), Some("12"));
    }

    #[test]
    fn test_production_without_downtime_is_warning() {
        let api = OeeApi::default();
        let downtime = table(&["Date", "Id", "DownTimeHrs"], &[&["2024-06-15", "11", "1"]]);
        let dataset = api.from_tables(production(), downtime).unwrap();

        let production_report = &dataset.dq_reports[0];
        assert_eq!(production_report.summary.warning, 1);
        assert_eq!(production_report.violations[0].entity_id.as_deref(), Some("12"));

        let report = api.compute(&dataset, &EntityFilter::All);
        assert_eq!(report.rows[1].downtime_hours, None);
        assert_eq!(report.rows[1].availability, 0.0);
        assert_eq!(report.rows[1].oee, 0.0);
    }

    #[test]
    fn test_missing_join_key() {
        let api = OeeApi::default();
        let downtime = table(&["Id", "DownTimeHrs"], &[&["11", "1"]]);

        let err = api.from_tables(production(), downtime).unwrap_err();
        assert!(matches!(err, ApiError::JoinKey { table: TableKind::Downtime, .. }));
    }

    #[test]
    fn test_missing_metric_column() {
        let api = OeeApi::default();
        let downtime = table(&["Date", "Id"], &[&["2024-06-15", "11"]]);

        let err = api.from_tables(production(), downtime).unwrap_err();
        assert!(matches!(err, ApiError::Import(ImportError::MissingColumns { .. })));
    }

    #[test]
    fn test_entity_literally_named_all() {
        let api = OeeApi::default();
        let production = table(
            &["Date", "Id", "ProductionHours", "ProducedGoods", "DefectGoods"],
            &[&["2024-06-15", "All", "8", "100", "0"], &["2024-06-15", "12", "8", "100", "0"]],
        );
        let downtime = table(
            &["Date", "Id", "DownTimeHrs"],
            &[&["2024-06-15", "All", "1"], &["2024-06-15", "12", "1"]],
        );
        let dataset = api.from_tables(production, downtime).unwrap();

        // 下拉保留值: 不过滤
        let unfiltered = api.compute(&dataset, &EntityFilter::from_option(Some("All")));
        assert_eq!(unfiltered.rows.len(), 2);

        let exact = api.compute(&dataset, &EntityFilter::only("All"));
        assert_eq!(exact.rows.len(), 1);
        assert_eq!(exact.rows[0].entity_id, "All");
    }

    #[test]
    fn test_unknown_entity_filter_is_empty() {
        let api = OeeApi::default();
        let dataset = api.from_tables(production(), downtime()).unwrap();
        let report = api.compute(&dataset, &EntityFilter::Only("99".to_string()));

        assert!(report.rows.is_empty());
        assert!(report.by_entity.is_empty());
        assert!(report.overall.is_none());
    }
}
