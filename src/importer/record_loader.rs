// ==========================================
// 设备效能指标核心库 - 记录载入器
// ==========================================
// 职责: 标准化后的 RawTable → 类型化记录 + DQ 报告
// 规则: 结构错误（缺必需列）直接返回 Err；
//       单元格错误剔除该行并写入 DQ 报告，不静默丢弃
// ==========================================

use crate::domain::maintenance::{EquipmentRecord, FailureRecord, OperatingRecord, VibrationRecord};
use crate::domain::production::{DowntimeRecord, ProductionRecord};
use crate::domain::quality::{DqLevel, DqReport, DqViolation};
use crate::domain::table::RawTable;
use crate::domain::types::TableKind;
use crate::importer::dq_validator::DqValidator;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::DataCleaner;
use crate::importer::schema_normalizer::columns;
use chrono::{NaiveDate, NaiveDateTime};
use tracing::{info, instrument, warn};

/// 载入结果
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub records: Vec<T>,
    pub report: DqReport,
}

// ==========================================
// RowReader - 单行读取辅助
// ==========================================
struct RowReader<'a> {
    table: &'a RawTable,
    idx: usize,
    cleaner: &'a dyn DataCleaner,
}

impl<'a> RowReader<'a> {
    fn row_number(&self) -> usize {
        self.idx + 1
    }

    fn text(&self, field: &str) -> Option<String> {
        self.cleaner.normalize_null(self.table.cell(self.idx, field))
    }

    fn required_text(&self, field: &str) -> ImportResult<String> {
        self.text(field).ok_or_else(|| ImportError::MissingValue {
            row: self.row_number(),
            field: field.to_string(),
        })
    }

    fn entity_id(&self) -> ImportResult<String> {
        let raw = self.required_text(columns::ENTITY_ID)?;
        Ok(self.cleaner.clean_entity_id(&raw))
    }

    fn datetime(&self, field: &str) -> ImportResult<NaiveDateTime> {
        let raw = self.required_text(field)?;
        self.cleaner
            .parse_datetime(&raw)
            .ok_or_else(|| ImportError::DateFormatError {
                row: self.row_number(),
                field: field.to_string(),
                value: raw,
            })
    }

    fn date(&self, field: &str) -> ImportResult<NaiveDate> {
        self.datetime(field).map(|dt| dt.date())
    }

    fn non_negative(&self, field: &str, raw: String) -> ImportResult<f64> {
        let value = self
            .cleaner
            .parse_f64(&raw)
            .ok_or_else(|| ImportError::TypeConversionError {
                row: self.row_number(),
                field: field.to_string(),
                message: format!("无法解析为数值: {}", raw),
            })?;
        if value < 0.0 {
            return Err(ImportError::ValueRangeError {
                row: self.row_number(),
                field: field.to_string(),
                value,
                min: 0.0,
                max: f64::MAX,
            });
        }
        Ok(value)
    }

    fn required_f64(&self, field: &str) -> ImportResult<f64> {
        let raw = self.required_text(field)?;
        self.non_negative(field, raw)
    }

    /// 可选数值列：列缺失或单元格为空 → None
    fn optional_f64(&self, field: &str) -> ImportResult<Option<f64>> {
        match self.text(field) {
            None => Ok(None),
            Some(raw) => self.non_negative(field, raw).map(Some),
        }
    }

    fn required_count(&self, field: &str) -> ImportResult<u64> {
        let raw = self.required_text(field)?;
        self.cleaner
            .parse_count(&raw)
            .ok_or_else(|| ImportError::TypeConversionError {
                row: self.row_number(),
                field: field.to_string(),
                message: format!("无法解析为非负整数: {}", raw),
            })
    }
}

// ==========================================
// RecordLoader
// ==========================================
pub struct RecordLoader {
    cleaner: Box<dyn DataCleaner>,
    validator: DqValidator,
}

impl RecordLoader {
    pub fn new(cleaner: Box<dyn DataCleaner>) -> Self {
        Self {
            cleaner,
            validator: DqValidator::new(),
        }
    }

    /// 通用载入流程: 必需列校验 → 逐行映射 → DQ 报告
    fn load<T, F, W>(
        &self,
        kind: TableKind,
        table: &RawTable,
        map_row: F,
        semantic_checks: W,
    ) -> ImportResult<Loaded<T>>
    where
        F: Fn(&RowReader<'_>) -> ImportResult<T>,
        W: Fn(&T) -> Vec<DqViolation>,
    {
        self.validator.validate_required_columns(kind, table)?;

        let mut violations = self.validator.validate_optional_columns(kind, table);
        let mut records = Vec::with_capacity(table.len());

        for idx in 0..table.len() {
            let reader = RowReader {
                table,
                idx,
                cleaner: self.cleaner.as_ref(),
            };

            match map_row(&reader) {
                Ok(record) => {
                    violations.extend(semantic_checks(&record));
                    records.push(record);
                }
                Err(e) => {
                    warn!(table = %kind, row_number = reader.row_number(), error = %e, "行解析失败，已剔除");
                    violations.push(DqViolation {
                        row_number: reader.row_number(),
                        entity_id: reader.entity_id().ok(),
                        level: DqLevel::Error,
                        field: e.field().unwrap_or("").to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        let report =
            self.validator
                .generate_dq_report(kind, table.len(), records.len(), violations);
        info!(
            table = %kind,
            total = report.summary.total_rows,
            loaded = report.summary.loaded,
            excluded = report.summary.excluded,
            "记录载入完成"
        );

        Ok(Loaded { records, report })
    }

    #[instrument(skip(self, table), fields(rows = table.len()))]
    pub fn load_production(&self, table: &RawTable) -> ImportResult<Loaded<ProductionRecord>> {
        self.load(
            TableKind::Production,
            table,
            |r| {
                Ok(ProductionRecord {
                    date: r.date(columns::DATE)?,
                    entity_id: r.entity_id()?,
                    production_hours: r.required_f64(columns::PRODUCTION_HOURS)?,
                    produced_units: r.required_count(columns::PRODUCED_UNITS)?,
                    defect_units: r.required_count(columns::DEFECT_UNITS)?,
                    ideal_cycle_time: r.optional_f64(columns::IDEAL_CYCLE_TIME)?.unwrap_or(0.0),
                    row_number: r.row_number(),
                })
            },
            |record| self.validator.validate_production(record),
        )
    }

    #[instrument(skip(self, table), fields(rows = table.len()))]
    pub fn load_downtime(&self, table: &RawTable) -> ImportResult<Loaded<DowntimeRecord>> {
        self.load(
            TableKind::Downtime,
            table,
            |r| {
                Ok(DowntimeRecord {
                    date: r.date(columns::DATE)?,
                    entity_id: r.entity_id()?,
                    downtime_hours: r.required_f64(columns::DOWNTIME_HOURS)?,
                    row_number: r.row_number(),
                })
            },
            |_| Vec::new(),
        )
    }

    #[instrument(skip(self, table), fields(rows = table.len()))]
    pub fn load_operating(&self, table: &RawTable) -> ImportResult<Loaded<OperatingRecord>> {
        self.load(
            TableKind::Operating,
            table,
            |r| {
                Ok(OperatingRecord {
                    entity_id: r.entity_id()?,
                    date: r.date(columns::DATE)?,
                    operating_hours: r.required_f64(columns::OPERATING_HOURS)?,
                    row_number: r.row_number(),
                })
            },
            |_| Vec::new(),
        )
    }

    #[instrument(skip(self, table), fields(rows = table.len()))]
    pub fn load_failures(&self, table: &RawTable) -> ImportResult<Loaded<FailureRecord>> {
        self.load(
            TableKind::Failure,
            table,
            |r| {
                Ok(FailureRecord {
                    entity_id: r.entity_id()?,
                    failure_date: r.date(columns::FAILURE_DATE)?,
                    description: r.text(columns::DESCRIPTION),
                    row_number: r.row_number(),
                })
            },
            |_| Vec::new(),
        )
    }

    #[instrument(skip(self, table), fields(rows = table.len()))]
    pub fn load_equipment(&self, table: &RawTable) -> ImportResult<Loaded<EquipmentRecord>> {
        self.load(
            TableKind::Equipment,
            table,
            |r| {
                Ok(EquipmentRecord {
                    entity_id: r.entity_id()?,
                    manufacture_date: r.date(columns::MANUFACTURE_DATE)?,
                    expire_date: r.date(columns::EXPIRE_DATE)?,
                    row_number: r.row_number(),
                })
            },
            |record| {
                if record.expire_date <= record.manufacture_date {
                    vec![DqViolation {
                        row_number: record.row_number,
                        entity_id: Some(record.entity_id.clone()),
                        level: DqLevel::Warning,
                        field: columns::EXPIRE_DATE.to_string(),
                        message: "到期日不晚于出厂日，RUL 无法计算".to_string(),
                    }]
                } else {
                    Vec::new()
                }
            },
        )
    }

    #[instrument(skip(self, table), fields(rows = table.len()))]
    pub fn load_vibration(&self, table: &RawTable) -> ImportResult<Loaded<VibrationRecord>> {
        self.load(
            TableKind::Vibration,
            table,
            |r| {
                Ok(VibrationRecord {
                    entity_id: r.entity_id()?,
                    timestamp: r.datetime(columns::DATE)?,
                    vibration_level: r.required_f64(columns::VIBRATION_LEVEL)?,
                    row_number: r.row_number(),
                })
            },
            |_| Vec::new(),
        )
    }
}
