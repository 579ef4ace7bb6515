// ==========================================
// 设备效能指标核心库 - 数据质量模型
// ==========================================
// 职责: 行级数据质量违规、汇总与报告
// 红线: 被剔除的行必须留痕，不允许静默丢弃
// ==========================================

use crate::domain::types::TableKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// DqLevel - 数据质量级别
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DqLevel {
    Error,   // 错误（该行被剔除）
    Warning, // 警告（保留该行）
    Info,    // 提示（仅记录）
}

// ==========================================
// DqViolation - 数据质量违规记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DqViolation {
    pub row_number: usize,         // 原始文件行号（0 表示整表级别）
    pub entity_id: Option<String>, // 设备 ID（如果可解析）
    pub level: DqLevel,            // 违规级别
    pub field: String,             // 违规字段
    pub message: String,           // 违规描述
}

// ==========================================
// DqSummary - 数据质量汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DqSummary {
    pub total_rows: usize, // 总行数
    pub loaded: usize,     // 成功载入
    pub excluded: usize,   // 剔除（ERROR）
    pub warning: usize,    // 警告（WARNING）
}

// ==========================================
// DqReport - 数据质量报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DqReport {
    pub report_id: String,            // 报告 ID
    pub table: TableKind,             // 来源表
    pub summary: DqSummary,           // 汇总统计
    pub violations: Vec<DqViolation>, // 违规明细
}

impl DqReport {
    pub fn new(table: TableKind) -> Self {
        Self {
            report_id: Uuid::new_v4().to_string(),
            table,
            summary: DqSummary::default(),
            violations: Vec::new(),
        }
    }

    /// 追加一条违规（载入后的跨表检查使用），同步更新汇总
    pub fn record(&mut self, violation: DqViolation) {
        if violation.level == DqLevel::Warning {
            self.summary.warning += 1;
        }
        self.violations.push(violation);
    }

    pub fn has_exclusions(&self) -> bool {
        self.summary.excluded > 0
    }

    /// 取前 n 条违规作为样本（用于展示/日志）
    pub fn sample(&self, n: usize) -> &[DqViolation] {
        &self.violations[..self.violations.len().min(n)]
    }

    /// 指定级别的违规
    pub fn violations_at(&self, level: DqLevel) -> impl Iterator<Item = &DqViolation> {
        self.violations.iter().filter(move |v| v.level == level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation(row: usize, level: DqLevel) -> DqViolation {
        DqViolation {
            row_number: row,
            entity_id: None,
            level,
            field: "date".to_string(),
            message: "日期格式错误".to_string(),
        }
    }

    #[test]
    fn test_sample_is_bounded() {
        let mut report = DqReport::new(TableKind::Production);
        report.violations = vec![
            violation(1, DqLevel::Error),
            violation(2, DqLevel::Warning),
            violation(3, DqLevel::Error),
        ];

        assert_eq!(report.sample(2).len(), 2);
        assert_eq!(report.sample(10).len(), 3);
        assert_eq!(report.violations_at(DqLevel::Error).count(), 2);
    }

    #[test]
    fn test_report_ids_are_unique() {
        let a = DqReport::new(TableKind::Downtime);
        let b = DqReport::new(TableKind::Downtime);
        assert_ne!(a.report_id, b.report_id);
        assert!(!a.has_exclusions());
    }
}
