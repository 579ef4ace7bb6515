// ==========================================
// 设备效能指标核心库 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::types::TableKind;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .csv/.json/.xlsx/.xls）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("JSON 解析失败: {0}")]
    JsonParseError(String),

    // ===== 结构错误 =====
    #[error("{table} 表缺少必需列: {}", missing.join(", "))]
    MissingColumns {
        table: TableKind,
        missing: Vec<String>,
    },

    // ===== 单元格错误（行级，通常进入 DQ 报告而非直接返回） =====
    #[error("类型转换失败 (行 {row}, 字段 {field}): {message}")]
    TypeConversionError {
        row: usize,
        field: String,
        message: String,
    },

    #[error("日期格式错误 (行 {row}, 字段 {field}): 无法识别 {value}")]
    DateFormatError {
        row: usize,
        field: String,
        value: String,
    },

    #[error("数值范围错误 (行 {row}, 字段 {field}): 值 {value} 超出范围 [{min}, {max}]")]
    ValueRangeError {
        row: usize,
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("必填值缺失 (行 {row}, 字段 {field})")]
    MissingValue { row: usize, field: String },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 行级错误对应的字段名（整表级错误返回 None）
    pub fn field(&self) -> Option<&str> {
        match self {
            ImportError::TypeConversionError { field, .. }
            | ImportError::DateFormatError { field, .. }
            | ImportError::ValueRangeError { field, .. }
            | ImportError::MissingValue { field, .. } => Some(field),
            _ => None,
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::JsonParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message_lists_columns() {
        let err = ImportError::MissingColumns {
            table: TableKind::Equipment,
            missing: vec!["expire_date".to_string(), "entity_id".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("equipment"));
        assert!(msg.contains("expire_date, entity_id"));
    }

    #[test]
    fn test_field_accessor() {
        let err = ImportError::MissingValue {
            row: 3,
            field: "production_hours".to_string(),
        };
        assert_eq!(err.field(), Some("production_hours"));
        assert_eq!(ImportError::FileNotFound("x".to_string()).field(), None);
    }
}
