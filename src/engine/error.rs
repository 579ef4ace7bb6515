// ==========================================
// 设备效能指标核心库 - 引擎层错误类型
// ==========================================
// 说明: 除零等算术退化不属于错误（按约定回退为 0 / None）
// ==========================================

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("RUL 系数无效: {0}（必须为有限正数）")]
    InvalidRulFactor(f64),

    #[error("无效输入: {0}")]
    InvalidInput(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
