// ==========================================
// 设备效能指标核心库 - 数据质量校验器实现
// ==========================================
// 职责: 必需列校验（结构错误） + 记录级语义校验 + DQ 报告汇总
// ==========================================

use crate::domain::production::ProductionRecord;
use crate::domain::quality::{DqLevel, DqReport, DqViolation};
use crate::domain::table::RawTable;
use crate::domain::types::TableKind;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::schema_normalizer::columns;
use std::collections::HashSet;

/// 各表必需的规范列
pub fn required_columns(kind: TableKind) -> &'static [&'static str] {
    match kind {
        TableKind::Production => &[
            columns::DATE,
            columns::ENTITY_ID,
            columns::PRODUCTION_HOURS,
            columns::PRODUCED_UNITS,
            columns::DEFECT_UNITS,
        ],
        TableKind::Downtime => &[columns::DATE, columns::ENTITY_ID, columns::DOWNTIME_HOURS],
        TableKind::Operating => &[
            columns::ENTITY_ID,
            columns::DATE,
            columns::OPERATING_HOURS,
        ],
        TableKind::Failure => &[columns::ENTITY_ID, columns::FAILURE_DATE],
        TableKind::Equipment => &[
            columns::ENTITY_ID,
            columns::MANUFACTURE_DATE,
            columns::EXPIRE_DATE,
        ],
        TableKind::Vibration => &[
            columns::ENTITY_ID,
            columns::DATE,
            columns::VIBRATION_LEVEL,
        ],
    }
}

/// 各表可选的规范列（缺失时按默认值处理）
pub fn optional_columns(kind: TableKind) -> &'static [&'static str] {
    match kind {
        TableKind::Production => &[columns::IDEAL_CYCLE_TIME],
        TableKind::Failure => &[columns::DESCRIPTION],
        _ => &[],
    }
}

pub struct DqValidator;

impl DqValidator {
    pub fn new() -> Self {
        Self
    }

    /// 校验必需列（结构错误直接返回，不进入后续计算）
    pub fn validate_required_columns(&self, kind: TableKind, table: &RawTable) -> ImportResult<()> {
        let missing = table.missing_columns(required_columns(kind));
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ImportError::MissingColumns {
                table: kind,
                missing: missing.into_iter().map(str::to_string).collect(),
            })
        }
    }

    /// 可选列缺失提示（整表级 INFO）
    pub fn validate_optional_columns(&self, kind: TableKind, table: &RawTable) -> Vec<DqViolation> {
        table
            .missing_columns(optional_columns(kind))
            .into_iter()
            .map(|column| DqViolation {
                row_number: 0,
                entity_id: None,
                level: DqLevel::Info,
                field: column.to_string(),
                message: "可选列缺失，按 0 / 空值处理".to_string(),
            })
            .collect()
    }

    /// 生产记录语义校验（WARNING，保留该行）
    pub fn validate_production(&self, record: &ProductionRecord) -> Vec<DqViolation> {
        let mut violations = Vec::new();

        // 不良数超过产出数：合格率将为负
        if record.defect_units > record.produced_units {
            violations.push(DqViolation {
                row_number: record.row_number,
                entity_id: Some(record.entity_id.clone()),
                level: DqLevel::Warning,
                field: columns::DEFECT_UNITS.to_string(),
                message: format!(
                    "不良数 {} 大于产出数 {}",
                    record.defect_units, record.produced_units
                ),
            });
        }

        violations
    }

    /// 同一表内 (date, entity_id) 重复键提示（合并时会产生笛卡尔积）
    pub fn validate_unique_keys<'a, I>(&self, keys: I) -> Vec<DqViolation>
    where
        I: IntoIterator<Item = (String, usize, &'a str)>,
    {
        let mut seen = HashSet::new();
        let mut violations = Vec::new();
        for (key, row_number, entity_id) in keys {
            if !seen.insert(key.clone()) {
                violations.push(DqViolation {
                    row_number,
                    entity_id: Some(entity_id.to_string()),
                    level: DqLevel::Warning,
                    field: format!("{},{}", columns::DATE, columns::ENTITY_ID),
                    message: format!("重复键 {}", key),
                });
            }
        }
        violations
    }

    /// 生成 DQ 报告
    ///
    /// # 参数
    /// - total_rows: 表格数据行数
    /// - loaded: 成功载入的记录数
    pub fn generate_dq_report(
        &self,
        kind: TableKind,
        total_rows: usize,
        loaded: usize,
        violations: Vec<DqViolation>,
    ) -> DqReport {
        let mut report = DqReport::new(kind);
        report.summary.total_rows = total_rows;
        report.summary.loaded = loaded;
        report.summary.excluded = total_rows.saturating_sub(loaded);
        report.summary.warning = violations
            .iter()
            .filter(|v| matches!(v.level, DqLevel::Warning))
            .count();
        report.violations = violations;
        report
    }
}

impl Default for DqValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn production(produced: u64, defects: u64) -> ProductionRecord {
        ProductionRecord {
            date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            entity_id: "11".to_string(),
            production_hours: 8.0,
            produced_units: produced,
            defect_units: defects,
            ideal_cycle_time: 0.5,
            row_number: 1,
        }
    }

    #[test]
    fn test_required_columns_missing() {
        let validator = DqValidator::new();
        let table = RawTable::new(vec!["entity_id".to_string(), "manufacture_date".to_string()]);

        let err = validator
            .validate_required_columns(TableKind::Equipment, &table)
            .unwrap_err();

        match err {
            ImportError::MissingColumns { table, missing } => {
                assert_eq!(table, TableKind::Equipment);
                assert_eq!(missing, vec!["expire_date".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_required_columns_present() {
        let validator = DqValidator::new();
        let table = RawTable::new(
            ["date", "entity_id", "downtime_hours"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        );
        assert!(validator
            .validate_required_columns(TableKind::Downtime, &table)
            .is_ok());
    }

    #[test]
    fn test_optional_column_info() {
        let validator = DqValidator::new();
        let table = RawTable::new(vec!["date".to_string()]);
        let notes = validator.validate_optional_columns(TableKind::Production, &table);

        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, DqLevel::Info);
        assert_eq!(notes[0].field, "ideal_cycle_time");
    }

    #[test]
    fn test_defects_exceeding_output_is_warning() {
        let validator = DqValidator::new();
        assert!(validator.validate_production(&production(100, 5)).is_empty());

        let violations = validator.validate_production(&production(10, 12));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].level, DqLevel::Warning);
    }

    #[test]
    fn test_duplicate_keys() {
        let validator = DqValidator::new();
        let violations = validator.validate_unique_keys(vec![
            ("2024-06-15|11".to_string(), 1, "11"),
            ("2024-06-15|12".to_string(), 2, "12"),
            ("2024-06-15|11".to_string(), 3, "11"),
        ]);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].row_number, 3);
    }

    #[test]
    fn test_generate_report_counts() {
        let validator = DqValidator::new();
        let violations = vec![DqViolation {
            row_number: 2,
            entity_id: None,
            level: DqLevel::Warning,
            field: "defect_units".to_string(),
            message: "x".to_string(),
        }];
        let report = validator.generate_dq_report(TableKind::Production, 5, 3, violations);

        assert_eq!(report.summary.total_rows, 5);
        assert_eq!(report.summary.loaded, 3);
        assert_eq!(report.summary.excluded, 2);
        assert_eq!(report.summary.warning, 1);
    }
}
