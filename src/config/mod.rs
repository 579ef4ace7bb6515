// ==========================================
// 设备效能指标核心库 - 配置层
// ==========================================
// 职责: 配置加载与覆写（文件 + 环境变量），生成 MetricsConfig
// 存储: JSON 配置文件（key-value）
// ==========================================

pub mod config_manager;
pub mod metrics_config;

// 重导出核心配置管理器
pub use config_manager::{config_keys, env_keys, ConfigError, ConfigManager, ConfigResult};
pub use metrics_config::{MetricsConfig, DEFAULT_DQ_SAMPLE_SIZE};
