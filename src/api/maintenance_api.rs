// ==========================================
// 设备效能指标核心库 - 维护 API（MTBF / RUL）
// ==========================================
// 职责: 运行时长 + 维修历史（+ 可选设备寿命、振动数据）→ MTBF / RUL / 趋势
// 规则:
// - 提供设备寿命表 → 寿命模式；否则 → 启发式模式
// - 启发式百分比的归一化基准由 MetricsConfig.rul_normalization 决定
// - today 由调用方显式传入
// ==========================================

use crate::api::error::ApiResult;
use crate::api::pipeline::ImportPipeline;
use crate::config::MetricsConfig;
use crate::domain::maintenance::{
    DateMean, EquipmentRecord, FailureRecord, MtbfRow, OperatingRecord, RulRow, VibrationPoint,
    VibrationRecord,
};
use crate::domain::quality::DqReport;
use crate::domain::table::RawTable;
use crate::domain::types::{EntityFilter, RulMode, RulNormalization, TableKind};
use crate::engine::{Aggregator, MtbfEngine, RulEngine};
use crate::importer::{AliasTable, ColumnCollision};
use crate::perf::{record_rows, PerfGuard};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, instrument};
use uuid::Uuid;

// ==========================================
// 输入表
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct MaintenanceTables {
    pub operating: RawTable,
    pub failures: RawTable,
    pub equipment: Option<RawTable>,
    pub vibration: Option<RawTable>,
}

// ==========================================
// 数据集（载入后、计算前）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceDataset {
    pub batch_id: String, // 导入批次 ID（UUID v4）
    pub operating: Vec<OperatingRecord>,
    pub failures: Vec<FailureRecord>,
    pub equipment: Option<Vec<EquipmentRecord>>,
    pub vibration: Vec<VibrationRecord>,
    pub dq_reports: Vec<DqReport>,
    pub collisions: Vec<ColumnCollision>,
}

impl MaintenanceDataset {
    pub fn rul_mode(&self) -> RulMode {
        if self.equipment.is_some() {
            RulMode::Lifespan
        } else {
            RulMode::Heuristic
        }
    }

    /// 所有表中出现过的设备 ID（升序去重）
    pub fn entity_ids(&self) -> Vec<String> {
        let mut ids: BTreeSet<&str> = BTreeSet::new();
        ids.extend(self.operating.iter().map(|r| r.entity_id.as_str()));
        ids.extend(self.failures.iter().map(|r| r.entity_id.as_str()));
        ids.extend(self.vibration.iter().map(|r| r.entity_id.as_str()));
        if let Some(equipment) = &self.equipment {
            ids.extend(equipment.iter().map(|r| r.entity_id.as_str()));
        }
        ids.into_iter().map(str::to_string).collect()
    }
}

// ==========================================
// 计算结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceReport {
    pub batch_id: String,
    pub filter: EntityFilter,
    pub today: NaiveDate,
    pub mode: RulMode,
    pub mtbf: Vec<MtbfRow>,
    pub rul: Vec<RulRow>,
    pub average_rul_percent: Option<f64>,
    pub operating_by_date: Vec<DateMean>,
    pub vibration: Vec<VibrationPoint>,
    pub entity_ids: Vec<String>,
    pub dq_reports: Vec<DqReport>,
    pub collisions: Vec<ColumnCollision>,
}

// ==========================================
// MaintenanceApi
// ==========================================
pub struct MaintenanceApi {
    config: MetricsConfig,
    pipeline: ImportPipeline,
    mtbf_engine: MtbfEngine,
    rul_engine: RulEngine,
    aggregator: Aggregator,
}

impl MaintenanceApi {
    pub fn new(config: MetricsConfig) -> Self {
        let pipeline = ImportPipeline::new(AliasTable::maintenance_default(), &config);
        Self {
            config,
            pipeline,
            mtbf_engine: MtbfEngine::new(),
            rul_engine: RulEngine::new(),
            aggregator: Aggregator::new(),
        }
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// 从文件载入；设备寿命表与振动表可选
    pub fn load_files(
        &self,
        operating: &Path,
        failures: &Path,
        equipment: Option<&Path>,
        vibration: Option<&Path>,
    ) -> ApiResult<MaintenanceDataset> {
        let tables = MaintenanceTables {
            operating: self.pipeline.read(operating)?,
            failures: self.pipeline.read(failures)?,
            equipment: equipment.map(|p| self.pipeline.read(p)).transpose()?,
            vibration: vibration.map(|p| self.pipeline.read(p)).transpose()?,
        };
        self.from_tables(tables)
    }

    /// 从内存表载入
    ///
    /// # 错误
    /// - 必需列缺失 → ImportError::MissingColumns（寿命模式下缺 expire_date 同样在此报错）
    #[instrument(skip_all, fields(operating = tables.operating.len(), failures = tables.failures.len()))]
    pub fn from_tables(&self, tables: MaintenanceTables) -> ApiResult<MaintenanceDataset> {
        let _perf = PerfGuard::new("maintenance_load");

        let mut collisions = Vec::new();
        let mut dq_reports = Vec::new();
        let loader = self.pipeline.loader();

        let operating = self
            .pipeline
            .normalize(TableKind::Operating, tables.operating, &mut collisions);
        let operating = loader.load_operating(&operating)?;
        dq_reports.push(operating.report);

        let failures = self
            .pipeline
            .normalize(TableKind::Failure, tables.failures, &mut collisions);
        let failures = loader.load_failures(&failures)?;
        dq_reports.push(failures.report);

        let equipment = match tables.equipment {
            Some(table) => {
                let table = self
                    .pipeline
                    .normalize(TableKind::Equipment, table, &mut collisions);
                let loaded = loader.load_equipment(&table)?;
                dq_reports.push(loaded.report);
                Some(loaded.records)
            }
            None => None,
        };

        let vibration = match tables.vibration {
            Some(table) => {
                let table = self
                    .pipeline
                    .normalize(TableKind::Vibration, table, &mut collisions);
                let loaded = loader.load_vibration(&table)?;
                dq_reports.push(loaded.report);
                loaded.records
            }
            None => Vec::new(),
        };

        record_rows(operating.records.len() + failures.records.len() + vibration.len());
        let batch_id = Uuid::new_v4().to_string();
        info!(
            batch_id = %batch_id,
            operating = operating.records.len(),
            failures = failures.records.len(),
            equipment = equipment.as_ref().map(Vec::len),
            vibration = vibration.len(),
            "维护数据集载入完成"
        );

        Ok(MaintenanceDataset {
            batch_id,
            operating: operating.records,
            failures: failures.records,
            equipment,
            vibration,
            dq_reports,
            collisions,
        })
    }

    /// MTBF / RUL / 趋势
    ///
    /// # 错误
    /// - 启发式模式下 rul_factor 非法 → EngineError::InvalidRulFactor
    #[instrument(skip_all, fields(filter = %filter, today = %today))]
    pub fn compute(
        &self,
        dataset: &MaintenanceDataset,
        filter: &EntityFilter,
        today: NaiveDate,
    ) -> ApiResult<MaintenanceReport> {
        let _perf = PerfGuard::new("maintenance_compute");

        let all_mtbf = self.mtbf_engine.compute(&dataset.operating, &dataset.failures);
        let in_view = |id: &str| filter.matches(id);

        let rul: Vec<RulRow> = match &dataset.equipment {
            Some(equipment) => self
                .rul_engine
                .lifespan(all_mtbf.clone(), equipment, today)
                .into_iter()
                .filter(|r| in_view(r.entity_id()))
                .collect(),
            None => match self.config.rul_normalization {
                RulNormalization::FullDataset => self
                    .rul_engine
                    .heuristic(all_mtbf.clone(), self.config.rul_factor)?
                    .into_iter()
                    .filter(|r| in_view(r.entity_id()))
                    .collect(),
                RulNormalization::FilteredView => {
                    let view: Vec<MtbfRow> = all_mtbf
                        .iter()
                        .filter(|r| in_view(&r.entity_id))
                        .cloned()
                        .collect();
                    self.rul_engine.heuristic(view, self.config.rul_factor)?
                }
            },
        };

        let mtbf: Vec<MtbfRow> = all_mtbf
            .into_iter()
            .filter(|r| in_view(&r.entity_id))
            .collect();

        let operating: Vec<OperatingRecord> = dataset
            .operating
            .iter()
            .filter(|r| in_view(&r.entity_id))
            .cloned()
            .collect();
        let vibration: Vec<VibrationRecord> = dataset
            .vibration
            .iter()
            .filter(|r| in_view(&r.entity_id))
            .cloned()
            .collect();
        record_rows(mtbf.len() + operating.len() + vibration.len());

        Ok(MaintenanceReport {
            batch_id: dataset.batch_id.clone(),
            filter: filter.clone(),
            today,
            mode: dataset.rul_mode(),
            average_rul_percent: RulEngine::average_percent(&rul),
            mtbf,
            rul,
            operating_by_date: self.aggregator.operating_hours_by_date(&operating),
            vibration: self.aggregator.vibration_by_timestamp(&vibration),
            entity_ids: dataset.entity_ids(),
            dq_reports: dataset.dq_reports.clone(),
            collisions: dataset.collisions.clone(),
        })
    }
}

impl Default for MaintenanceApi {
    fn default() -> Self {
        Self::new(MetricsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ApiError;
    use crate::engine::EngineError;
    use crate::importer::ImportError;

    fn table(columns: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::from_rows(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|v| v.to_string()).collect())
                .collect(),
        )
    }

    fn tables() -> MaintenanceTables {
        MaintenanceTables {
            operating: table(
                &["PumpID", "Date", "Operating Hours"],
                &[
                    &["1", "2024-06-01", "8"],
                    &["1", "2024-06-02", "5"],
                    &["2", "2024-06-01", "100"],
                ],
            ),
            failures: table(
                &["PumpID", "Failure Date", "Description"],
                &[
                    &["1", "2024-06-01", "Change oil"],
                    &["1", "2024-06-02", "Replace bearings"],
                    &["2", "2024-06-01", "Clean filters"],
                ],
            ),
            equipment: None,
            vibration: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn test_heuristic_full_dataset() {
        let api = MaintenanceApi::default();
        let dataset = api.from_tables(tables()).unwrap();
        let report = api.compute(&dataset, &EntityFilter::All, today()).unwrap();

        assert_eq!(report.mode, RulMode::Heuristic);
        assert_eq!(report.mtbf[0].mtbf_hours, Some(6));
        assert_eq!(report.mtbf[1].mtbf_hours, Some(100));
        assert_eq!(report.rul[1].rul_percent, Some(100.0));
        assert_eq!(report.rul[0].rul_percent, Some(6.0));
    }

    #[test]
    fn test_normalization_base() {
        let filter = EntityFilter::Only("1".to_string());

        let full = MaintenanceApi::default();
        let dataset = full.from_tables(tables()).unwrap();
        let report = full.compute(&dataset, &filter, today()).unwrap();
        assert_eq!(report.rul.len(), 1);
        assert_eq!(report.rul[0].rul_percent, Some(6.0));

        let filtered = MaintenanceApi::new(MetricsConfig {
            rul_normalization: RulNormalization::FilteredView,
            ..MetricsConfig::default()
        });
        let report = filtered.compute(&dataset, &filter, today()).unwrap();
        assert_eq!(report.rul[0].rul_percent, Some(100.0));
    }

    #[test]
    fn test_lifespan_mode() {
        let api = MaintenanceApi::default();
        let mut input = tables();
        input.equipment = Some(table(
            &["PumpID", "Manufacture Date", "Expire Date"],
            &[&["1", "2015-01-01", "2025-01-01"]],
        ));

        let dataset = api.from_tables(input).unwrap();
        let report = api.compute(&dataset, &EntityFilter::All, today()).unwrap();

        assert_eq!(report.mode, RulMode::Lifespan);
        assert_eq!(report.rul[0].rul_percent, Some(5.47));
        assert_eq!(report.rul[1].rul_percent, None);
        assert_eq!(report.average_rul_percent, Some(5.47));
    }

    #[test]
    fn test_lifespan_missing_expire_column() {
        let api = MaintenanceApi::default();
        let mut input = tables();
        input.equipment = Some(table(&["PumpID", "Manufacture Date"], &[&["1", "2015-01-01"]]));

        let err = api.from_tables(input).unwrap_err();
        assert!(matches!(err, ApiError::Import(ImportError::MissingColumns { .. })));
    }

    #[test]
    fn test_invalid_factor() {
        let api = MaintenanceApi::new(MetricsConfig {
            rul_factor: -1.0,
            ..MetricsConfig::default()
        });
        let dataset = api.from_tables(tables()).unwrap();

        let err = api.compute(&dataset, &EntityFilter::All, today()).unwrap_err();
        assert!(matches!(err, ApiError::Engine(EngineError::InvalidRulFactor(_))));
    }

    #[test]
    fn test_trends_follow_filter() {
        let api = MaintenanceApi::default();
        let mut input = tables();
        input.vibration = Some(table(
            &["PumpID", "Date", "Vibration Level (mm/s)"],
            &[
                &["1", "2024-06-01 08:00:00", "0.5"],
                &["2", "2024-06-01 08:00:00", "0.7"],
            ],
        ));
        let dataset = api.from_tables(input).unwrap();

        let all = api.compute(&dataset, &EntityFilter::All, today()).unwrap();
        assert_eq!(all.vibration.len(), 1);
        assert!((all.vibration[0].mean_level - 0.6).abs() < 1e-12);
        assert_eq!(all.operating_by_date[0].mean, 54.0);

        let one = api
            .compute(&dataset, &EntityFilter::Only("2".to_string()), today())
            .unwrap();
        assert_eq!(one.vibration[0].mean_level, 0.7);
        assert_eq!(one.operating_by_date.len(), 1);
        assert_eq!(one.operating_by_date[0].mean, 100.0);
    }
}
