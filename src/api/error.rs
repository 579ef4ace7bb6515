// ==========================================
// 设备效能指标核心库 - API层错误类型
// ==========================================
// 职责: 汇总导入层 / 引擎层 / 配置层错误，补充连接键等组合错误
// ==========================================

use crate::config::ConfigError;
use crate::domain::types::TableKind;
use crate::engine::error::EngineError;
use crate::importer::error::ImportError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 组合校验错误
    // ==========================================
    /// 标准化后缺少连接键列（date / entity_id）
    #[error("{table} 表缺少连接键列: {}", missing.join(", "))]
    JoinKey {
        table: TableKind,
        missing: Vec<String>,
    },

    #[error("无效输入: {0}")]
    InvalidInput(String),

    // ==========================================
    // 分层错误
    // ==========================================
    #[error("导入失败: {0}")]
    Import(#[from] ImportError),

    #[error("计算失败: {0}")]
    Engine(#[from] EngineError),

    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_key_message() {
        let err = ApiError::JoinKey {
            table: TableKind::Downtime,
            missing: vec!["date".to_string()],
        };
        assert_eq!(err.to_string(), "downtime 表缺少连接键列: date");
    }

    #[test]
    fn test_from_engine_error() {
        let err: ApiError = EngineError::InvalidRulFactor(-1.0).into();
        assert!(matches!(err, ApiError::Engine(EngineError::InvalidRulFactor(_))));
    }
}
