// ==========================================
// 设备效能指标核心库 - 领域类型定义
// ==========================================
// 职责: 表类型、实体过滤、RUL 计算模式等值类型
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 表类型 (Table Kind)
// ==========================================
// 每种上传表格对应一组规范列
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableKind {
    Production, // 生产记录
    Downtime,   // 停机记录
    Operating,  // 运行时长
    Failure,    // 维修/故障历史
    Equipment,  // 设备寿命
    Vibration,  // 振动数据
}

impl TableKind {
    /// 全部表类型（模板生成、批量校验时使用）
    pub const ALL: [TableKind; 6] = [
        TableKind::Production,
        TableKind::Downtime,
        TableKind::Operating,
        TableKind::Failure,
        TableKind::Equipment,
        TableKind::Vibration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Production => "production",
            TableKind::Downtime => "downtime",
            TableKind::Operating => "operating",
            TableKind::Failure => "failure",
            TableKind::Equipment => "equipment",
            TableKind::Vibration => "vibration",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TableKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" => Ok(TableKind::Production),
            "downtime" => Ok(TableKind::Downtime),
            "operating" => Ok(TableKind::Operating),
            "failure" | "maintenance" => Ok(TableKind::Failure),
            "equipment" => Ok(TableKind::Equipment),
            "vibration" => Ok(TableKind::Vibration),
            other => Err(format!("未知表类型: {}", other)),
        }
    }
}

// ==========================================
// 实体过滤 (Entity Filter)
// ==========================================
// 对应看板上的 "All / 指定设备" 下拉选择
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "entity_id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityFilter {
    #[default]
    All,
    Only(String),
}

impl EntityFilter {
    /// 从可选 ID 构造（None / 空串 / "All" 不区分大小写 → 全部）
    ///
    /// "All" 是下拉框的保留值；ID 恰为 "All" 的设备需用 [`EntityFilter::only`] 选中
    pub fn from_option(entity_id: Option<&str>) -> Self {
        match entity_id.map(str::trim) {
            None | Some("") => EntityFilter::All,
            Some(id) if id.eq_ignore_ascii_case("all") => EntityFilter::All,
            Some(id) => EntityFilter::Only(id.to_string()),
        }
    }

    /// 精确选中一台设备（不做保留值映射）
    pub fn only(entity_id: impl Into<String>) -> Self {
        EntityFilter::Only(entity_id.into())
    }

    pub fn matches(&self, entity_id: &str) -> bool {
        match self {
            EntityFilter::All => true,
            EntityFilter::Only(id) => id == entity_id,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, EntityFilter::All)
    }
}

impl fmt::Display for EntityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityFilter::All => write!(f, "ALL"),
            EntityFilter::Only(id) => write!(f, "{}", id),
        }
    }
}

// ==========================================
// RUL 计算模式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RulMode {
    Heuristic, // MTBF × 系数，按最大值归一化
    Lifespan,  // 设备年龄 vs 设计寿命
}

impl fmt::Display for RulMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RulMode::Heuristic => write!(f, "HEURISTIC"),
            RulMode::Lifespan => write!(f, "LIFESPAN"),
        }
    }
}

// ==========================================
// 启发式 RUL 百分比的归一化基准
// ==========================================
// FullDataset: 以全量设备的最大 RUL 为 100%（过滤不改变刻度）
// FilteredView: 以当前过滤视图内的最大 RUL 为 100%
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RulNormalization {
    #[default]
    FullDataset,
    FilteredView,
}

impl std::str::FromStr for RulNormalization {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "FULL_DATASET" | "FULL" => Ok(RulNormalization::FullDataset),
            "FILTERED_VIEW" | "FILTERED" => Ok(RulNormalization::FilteredView),
            other => Err(format!("未知归一化基准: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_filter_from_option() {
        assert_eq!(EntityFilter::from_option(None), EntityFilter::All);
        assert_eq!(EntityFilter::from_option(Some("All")), EntityFilter::All);
        assert_eq!(EntityFilter::from_option(Some("  ")), EntityFilter::All);
        assert_eq!(
            EntityFilter::from_option(Some(" P-01 ")),
            EntityFilter::Only("P-01".to_string())
        );
    }

    #[test]
    fn test_entity_named_all_is_selectable() {
        let filter = EntityFilter::only("All");
        assert!(!filter.is_all());
        assert!(filter.matches("All"));
        assert!(!filter.matches("11"));
    }

    #[test]
    fn test_entity_filter_matches() {
        assert!(EntityFilter::All.matches("anything"));
        let only = EntityFilter::Only("11".to_string());
        assert!(only.matches("11"));
        assert!(!only.matches("12"));
    }

    #[test]
    fn test_table_kind_parse() {
        assert_eq!("Production".parse::<TableKind>(), Ok(TableKind::Production));
        assert_eq!("maintenance".parse::<TableKind>(), Ok(TableKind::Failure));
        assert!("unknown".parse::<TableKind>().is_err());
    }

    #[test]
    fn test_rul_normalization_parse() {
        assert_eq!(
            "filtered_view".parse::<RulNormalization>(),
            Ok(RulNormalization::FilteredView)
        );
        assert_eq!(RulNormalization::default(), RulNormalization::FullDataset);
    }
}
