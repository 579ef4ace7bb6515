// ==========================================
// 设备效能指标核心库 - 列名标准化
// ==========================================
// 职责: 源列名（各种拼写） → 规范列名
// 红线: 纯变换；不识别的列原样透传；不在此处报告缺列
// ==========================================

use crate::domain::table::RawTable;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

// ==========================================
// 规范列名
// ==========================================
pub mod columns {
    pub const DATE: &str = "date";
    pub const ENTITY_ID: &str = "entity_id";
    pub const PRODUCTION_HOURS: &str = "production_hours";
    pub const PRODUCED_UNITS: &str = "produced_units";
    pub const DEFECT_UNITS: &str = "defect_units";
    pub const IDEAL_CYCLE_TIME: &str = "ideal_cycle_time";
    pub const DOWNTIME_HOURS: &str = "downtime_hours";
    pub const OPERATING_HOURS: &str = "operating_hours";
    pub const FAILURE_DATE: &str = "failure_date";
    pub const DESCRIPTION: &str = "description";
    pub const MANUFACTURE_DATE: &str = "manufacture_date";
    pub const EXPIRE_DATE: &str = "expire_date";
    pub const VIBRATION_LEVEL: &str = "vibration_level";
}

// ==========================================
// AliasTable - 规范名 → 可接受拼写集合（区分大小写）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AliasTable {
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册别名（规范名自身总是被接受）
    pub fn with(mut self, canonical: &str, aliases: &[&str]) -> Self {
        self.add_aliases(canonical, aliases.iter().map(|a| a.to_string()));
        self
    }

    pub fn add_aliases<I>(&mut self, canonical: &str, aliases: I)
    where
        I: IntoIterator<Item = String>,
    {
        let set = self.entries.entry(canonical.to_string()).or_default();
        set.insert(canonical.to_string());
        for alias in aliases {
            let alias = alias.trim().to_string();
            if !alias.is_empty() {
                set.insert(alias);
            }
        }
    }

    /// 合并额外别名（来自配置）
    pub fn extend(&mut self, extra: &HashMap<String, Vec<String>>) {
        for (canonical, aliases) in extra {
            self.add_aliases(canonical, aliases.iter().cloned());
        }
    }

    /// 查找某拼写对应的规范名
    pub fn canonical_for(&self, spelling: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, aliases)| aliases.contains(spelling))
            .map(|(canonical, _)| canonical.as_str())
    }

    pub fn aliases_of(&self, canonical: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(canonical)
    }

    pub fn canonical_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// 生产/停机表默认别名
    pub fn oee_default() -> Self {
        Self::new()
            .with(columns::DATE, &["Date", "date", "production_date"])
            .with(
                columns::ENTITY_ID,
                &["Id", "id", "ID", "machine_id", "equipment_id"],
            )
            .with(
                columns::PRODUCTION_HOURS,
                &[
                    "ProductionHrs",
                    "production_hours",
                    "prod_hours",
                    "Production Hours",
                    "ProductionHours",
                ],
            )
            .with(
                columns::PRODUCED_UNITS,
                &[
                    "ProducedGoods",
                    "produced_goods",
                    "produced_pieces",
                    "Production Goods",
                ],
            )
            .with(
                columns::DEFECT_UNITS,
                &["DefectGoods", "defect_goods", "defective_goods", "Defect Goods"],
            )
            .with(
                columns::IDEAL_CYCLE_TIME,
                &["IdealCycle", "ideal_cycle_time", "ideal_cycle", "Ideal Cycle"],
            )
            .with(
                columns::DOWNTIME_HOURS,
                &["DownTimeHrs", "downtime_hours", "down_hours", "Downtime Hours"],
            )
    }

    /// 运行/维修/设备/振动表默认别名
    pub fn maintenance_default() -> Self {
        Self::new()
            .with(columns::DATE, &["Date", "date"])
            .with(
                columns::ENTITY_ID,
                &["PumpID", "pump_id", "Pump ID", "Id", "id", "ID", "equipment_id"],
            )
            .with(
                columns::OPERATING_HOURS,
                &["Operating Hours", "OperatingHours", "operating_hours"],
            )
            .with(
                columns::FAILURE_DATE,
                &["Failure Date", "FailureDate", "failure_date"],
            )
            .with(columns::DESCRIPTION, &["Description", "description"])
            .with(
                columns::MANUFACTURE_DATE,
                &[
                    "Manufacture Date",
                    "ManufactureDate",
                    "manufacture_date",
                    "manufacturing_date",
                ],
            )
            .with(
                columns::EXPIRE_DATE,
                &["Expire Date", "ExpireDate", "expire_date", "expiry_date"],
            )
            .with(
                columns::VIBRATION_LEVEL,
                &[
                    "Vibration Level (mm/s)",
                    "VibrationLevel",
                    "vibration_level",
                ],
            )
    }
}

// ==========================================
// 标准化结果
// ==========================================

/// 多个源列映射到同一规范名时的冲突记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnCollision {
    pub canonical: String,     // 规范名
    pub kept: String,          // 被采用的源列（第一个）
    pub ignored: String,       // 被保留原名的源列
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeOutcome {
    pub table: RawTable,
    pub renamed: Vec<(String, String)>, // (源列名, 规范名)
    pub collisions: Vec<ColumnCollision>,
}

// ==========================================
// SchemaNormalizer
// ==========================================
pub struct SchemaNormalizer {
    aliases: AliasTable,
}

impl SchemaNormalizer {
    pub fn new(aliases: AliasTable) -> Self {
        Self { aliases }
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// 重命名可识别的列
    ///
    /// # 规则
    /// - 源列名出现在某别名集合中 → 改为对应规范名
    /// - 未识别的列 → 原样透传
    /// - 多列映射到同一规范名 → 第一个列采用规范名，其余保留原名并记录冲突
    pub fn normalize(&self, table: RawTable) -> NormalizeOutcome {
        let RawTable { columns, rows } = table;

        // 已被源列直接占用的规范名（如文件里本来就有 "date"）也参与冲突判断
        let mut taken: HashMap<String, String> = HashMap::new();
        let mut renamed = Vec::new();
        let mut collisions = Vec::new();
        let mut new_columns = Vec::with_capacity(columns.len());

        for column in columns {
            match self.aliases.canonical_for(&column) {
                Some(canonical) => {
                    if let Some(kept) = taken.get(canonical) {
                        warn!(
                            canonical = canonical,
                            kept = %kept,
                            ignored = %column,
                            "多个源列映射到同一规范列，保留第一个"
                        );
                        collisions.push(ColumnCollision {
                            canonical: canonical.to_string(),
                            kept: kept.clone(),
                            ignored: column.clone(),
                        });
                        new_columns.push(column);
                    } else {
                        taken.insert(canonical.to_string(), column.clone());
                        if canonical != column {
                            renamed.push((column.clone(), canonical.to_string()));
                        }
                        new_columns.push(canonical.to_string());
                    }
                }
                None => new_columns.push(column),
            }
        }

        debug!(
            renamed = renamed.len(),
            collisions = collisions.len(),
            "列名标准化完成"
        );

        NormalizeOutcome {
            table: RawTable {
                columns: new_columns,
                rows,
            },
            renamed,
            collisions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str]) -> RawTable {
        RawTable::from_rows(
            columns.iter().map(|c| c.to_string()).collect(),
            vec![columns.iter().map(|c| format!("v-{}", c)).collect()],
        )
    }

    #[test]
    fn test_renames_known_aliases() {
        let normalizer = SchemaNormalizer::new(AliasTable::oee_default());
        let outcome = normalizer.normalize(table(&["Date", "Id", "DownTimeHrs", "Shift"]));

        assert_eq!(
            outcome.table.columns,
            vec!["date", "entity_id", "downtime_hours", "Shift"]
        );
        // 单元格位置不变
        assert_eq!(outcome.table.cell(0, "entity_id"), Some("v-Id"));
        assert_eq!(outcome.table.cell(0, "Shift"), Some("v-Shift"));
        assert_eq!(outcome.renamed.len(), 3);
        assert!(outcome.collisions.is_empty());
    }

    #[test]
    fn test_aliases_are_case_sensitive() {
        let normalizer = SchemaNormalizer::new(AliasTable::oee_default());
        let outcome = normalizer.normalize(table(&["DATE", "iD"]));

        assert_eq!(outcome.table.columns, vec!["DATE", "iD"]);
    }

    #[test]
    fn test_collision_keeps_first_column() {
        let normalizer = SchemaNormalizer::new(AliasTable::oee_default());
        let outcome = normalizer.normalize(table(&["Id", "machine_id", "Date"]));

        assert_eq!(outcome.table.columns, vec!["entity_id", "machine_id", "date"]);
        assert_eq!(outcome.collisions.len(), 1);
        assert_eq!(outcome.collisions[0].kept, "Id");
        assert_eq!(outcome.collisions[0].ignored, "machine_id");
    }

    #[test]
    fn test_round_trip_every_alias() {
        let aliases = AliasTable::oee_default();
        let normalizer = SchemaNormalizer::new(aliases.clone());
        let canonical = table(&["date", "entity_id", "production_hours", "downtime_hours"]);

        for name in ["date", "entity_id", "production_hours", "downtime_hours"] {
            for alias in aliases.aliases_of(name).unwrap() {
                let mut renamed = canonical.clone();
                let idx = renamed.column_index(name).unwrap();
                renamed.columns[idx] = alias.clone();

                let outcome = normalizer.normalize(renamed);
                assert_eq!(outcome.table, canonical, "alias {} of {}", alias, name);
            }
        }
    }

    #[test]
    fn test_extend_from_config() {
        let mut aliases = AliasTable::maintenance_default();
        let mut extra = HashMap::new();
        extra.insert(
            columns::OPERATING_HOURS.to_string(),
            vec!["Run Hours".to_string()],
        );
        aliases.extend(&extra);

        assert_eq!(aliases.canonical_for("Run Hours"), Some(columns::OPERATING_HOURS));
        assert_eq!(aliases.canonical_for("PumpID"), Some(columns::ENTITY_ID));
        assert_eq!(aliases.canonical_for("Vibration"), None);
    }
}
