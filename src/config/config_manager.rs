// ==========================================
// 设备效能指标核心库 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: 扁平 JSON 对象文件 (key → value)
// 优先级: 环境变量 > 配置文件 > 内置默认值
// ==========================================

use crate::config::metrics_config::{MetricsConfig, DEFAULT_DQ_SAMPLE_SIZE};
use crate::domain::types::RulNormalization;
use crate::engine::rul::DEFAULT_RUL_FACTOR;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

// ==========================================
// 配置错误
// ==========================================
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读写失败: {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("配置文件格式错误: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("配置文件顶层必须是 JSON 对象")]
    NotAnObject,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ConfigManager {
    values: HashMap<String, String>,
    source: Option<PathBuf>,
}

impl ConfigManager {
    /// 空配置（全部取默认值）
    pub fn new() -> Self {
        Self::default()
    }

    /// 默认配置文件路径: <config_dir>/equipment-metrics/config.json
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("equipment-metrics").join("config.json"))
    }

    /// 按约定位置加载配置
    ///
    /// # 查找顺序
    /// 1. 环境变量 EQUIPMENT_METRICS_CONFIG 指定的文件（必须存在）
    /// 2. 默认路径（不存在时使用空配置）
    ///
    /// 加载后应用环境变量覆写
    pub fn load_default() -> ConfigResult<Self> {
        let mut manager = match std::env::var(env_keys::CONFIG_PATH) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(Path::new(path.trim()))?,
            _ => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    debug!("未找到配置文件，使用默认配置");
                    Self::new()
                }
            },
        };

        manager.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(manager)
    }

    /// 从 JSON 文件加载
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut manager = Self::from_json_str(&content)?;
        manager.source = Some(path.to_path_buf());
        info!(path = %path.display(), keys = manager.values.len(), "配置文件已加载");
        Ok(manager)
    }

    /// 从 JSON 文本加载
    ///
    /// 字符串值原样保存，其他类型（数字、数组、对象）保存为 JSON 文本
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let value: Value = serde_json::from_str(content)?;
        let Value::Object(map) = value else {
            return Err(ConfigError::NotAnObject);
        };

        let values = map
            .into_iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, text)
            })
            .collect();

        Ok(Self {
            values,
            source: None,
        })
    }

    /// 应用环境变量覆写（lookup 便于测试注入）
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for (env_key, config_key) in env_keys::OVERRIDES {
            if let Some(value) = lookup(env_key) {
                debug!(env_key, config_key, value = %value, "环境变量覆写配置");
                self.values.insert(config_key.to_string(), value);
            }
        }
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// 读取原始配置值
    pub fn get_global_config_value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    fn get_config_or_default<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get_global_config_value(key).unwrap_or(default)
    }

    /// 获取所有配置的快照（JSON格式，键有序）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let ordered: BTreeMap<&String, &String> = self.values.iter().collect();
        Ok(serde_json::to_string(&ordered)?)
    }

    /// 写回 JSON 文件（目录不存在时创建）
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let io_err = |source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let ordered: BTreeMap<&String, &String> = self.values.iter().collect();
        let content = serde_json::to_string_pretty(&ordered)?;
        std::fs::write(path, content).map_err(io_err)?;
        Ok(())
    }

    // ===== 计算参数 =====

    /// 启发式 RUL 系数（默认 1.0）
    pub fn get_rul_factor(&self) -> f64 {
        let default = DEFAULT_RUL_FACTOR.to_string();
        let value = self.get_config_or_default(config_keys::RUL_FACTOR, &default);
        value.trim().parse::<f64>().unwrap_or_else(|_| {
            warn!(config_key = config_keys::RUL_FACTOR, raw_value = %value, "RUL 系数格式错误，使用默认值");
            DEFAULT_RUL_FACTOR
        })
    }

    /// RUL 归一化基准（默认 FULL_DATASET）
    pub fn get_rul_normalization(&self) -> RulNormalization {
        let value = self.get_config_or_default(config_keys::RUL_NORMALIZATION, "FULL_DATASET");
        value.parse().unwrap_or_else(|_| {
            warn!(config_key = config_keys::RUL_NORMALIZATION, raw_value = %value, "归一化基准格式错误，使用默认值");
            RulNormalization::default()
        })
    }

    pub fn get_dq_sample_size(&self) -> usize {
        let default = DEFAULT_DQ_SAMPLE_SIZE.to_string();
        let value = self.get_config_or_default(config_keys::DQ_SAMPLE_SIZE, &default);
        value.trim().parse::<usize>().unwrap_or(DEFAULT_DQ_SAMPLE_SIZE)
    }

    /// 额外日期格式
    ///
    /// 配置格式为 JSON 数组: ["%m/%d/%Y", "%Y年%m月%d日"]
    pub fn get_extra_date_formats(&self) -> Vec<String> {
        let value = self.get_config_or_default(config_keys::EXTRA_DATE_FORMATS, "[]");
        serde_json::from_str(value).unwrap_or_else(|_| {
            warn!(config_key = config_keys::EXTRA_DATE_FORMATS, raw_value = %value, "日期格式配置错误，忽略");
            Vec::new()
        })
    }

    /// 额外列别名
    ///
    /// 配置格式为 JSON: {"entity_id": ["Machine", "Line"], "downtime_hours": ["Stop Hrs"]}
    pub fn get_extra_aliases(&self) -> HashMap<String, Vec<String>> {
        let value = self.get_config_or_default(config_keys::EXTRA_ALIASES, "{}");
        serde_json::from_str(value).unwrap_or_else(|_| {
            warn!(config_key = config_keys::EXTRA_ALIASES, raw_value = %value, "别名配置格式错误，使用空配置");
            HashMap::new()
        })
    }

    /// 汇总为强类型配置
    pub fn load_metrics_config(&self) -> MetricsConfig {
        MetricsConfig {
            rul_factor: self.get_rul_factor(),
            rul_normalization: self.get_rul_normalization(),
            dq_sample_size: self.get_dq_sample_size(),
            extra_date_formats: self.get_extra_date_formats(),
            extra_aliases: self.get_extra_aliases(),
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // RUL
    pub const RUL_FACTOR: &str = "rul_factor";
    pub const RUL_NORMALIZATION: &str = "rul_normalization";

    // 数据质量
    pub const DQ_SAMPLE_SIZE: &str = "dq_sample_size";

    // 导入
    pub const EXTRA_DATE_FORMATS: &str = "extra_date_formats"; // JSON 数组
    pub const EXTRA_ALIASES: &str = "extra_aliases"; // JSON 对象
}

// ==========================================
// 环境变量
// ==========================================
pub mod env_keys {
    pub const CONFIG_PATH: &str = "EQUIPMENT_METRICS_CONFIG";
    pub const RUL_FACTOR: &str = "EQUIPMENT_METRICS_RUL_FACTOR";
    pub const RUL_NORMALIZATION: &str = "EQUIPMENT_METRICS_RUL_NORMALIZATION";

    /// (环境变量, 配置键)
    pub const OVERRIDES: [(&str, &str); 2] = [
        (RUL_FACTOR, super::config_keys::RUL_FACTOR),
        (RUL_NORMALIZATION, super::config_keys::RUL_NORMALIZATION),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let config = ConfigManager::new().load_metrics_config();
        assert_eq!(config, MetricsConfig::default());
    }

    #[test]
    fn test_json_values_of_any_type() {
        let manager = ConfigManager::from_json_str(
            r#"{
                "rul_factor": 2.5,
                "rul_normalization": "FILTERED_VIEW",
                "extra_date_formats": ["%m/%d/%Y"],
                "extra_aliases": {"entity_id": ["Machine"]}
            }"#,
        )
        .unwrap();

        let config = manager.load_metrics_config();
        assert_eq!(config.rul_factor, 2.5);
        assert_eq!(config.rul_normalization, RulNormalization::FilteredView);
        assert_eq!(config.extra_date_formats, vec!["%m/%d/%Y".to_string()]);
        assert_eq!(config.extra_aliases["entity_id"], vec!["Machine".to_string()]);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let mut manager = ConfigManager::new();
        manager.set(config_keys::RUL_FACTOR, "abc");
        manager.set(config_keys::EXTRA_ALIASES, "not json");

        assert_eq!(manager.get_rul_factor(), DEFAULT_RUL_FACTOR);
        assert!(manager.get_extra_aliases().is_empty());
    }

    #[test]
    fn test_env_overrides_take_precedence() {
        let mut manager = ConfigManager::from_json_str(r#"{"rul_factor": 2.0}"#).unwrap();
        manager.apply_env_overrides(|key| (key == env_keys::RUL_FACTOR).then(|| "3".to_string()));

        assert_eq!(manager.get_rul_factor(), 3.0);
    }

    #[test]
    fn test_not_an_object() {
        assert!(matches!(
            ConfigManager::from_json_str("[1, 2]"),
            Err(ConfigError::NotAnObject)
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut manager = ConfigManager::new();
        manager.set(config_keys::DQ_SAMPLE_SIZE, "5");
        manager.save(&path).unwrap();

        let reloaded = ConfigManager::from_file(&path).unwrap();
        assert_eq!(reloaded.get_dq_sample_size(), 5);
        assert_eq!(reloaded.source(), Some(path.as_path()));
        assert_eq!(reloaded.get_config_snapshot().unwrap(), r#"{"dq_sample_size":"5"}"#);
    }
}
