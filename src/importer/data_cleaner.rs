// ==========================================
// 设备效能指标核心库 - 数据清洗器实现
// ==========================================
// 职责: TRIM / NULL 标准化 / 日期与数值解析
// 日期: ISO-8601、"YYYY-MM-DD HH:MM:SS"、日-月-年、Excel 序列号
// 数值: 逗号仅作千分位（1,000 / 12,345.5），其他位置的逗号视为解析失败
// ==========================================

use crate::importer::importer_trait::DataCleaner as DataCleanerTrait;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

/// 内置日期时间格式（按优先级尝试）
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
];

/// 内置纯日期格式
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y%m%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
];

/// Excel 序列号合理区间（1954-10-03 ~ 2119-01-11），避免把普通数字误判为日期
const EXCEL_SERIAL_MIN: f64 = 20_000.0;
const EXCEL_SERIAL_MAX: f64 = 80_000.0;

pub struct DataCleaner {
    extra_formats: Vec<String>, // 配置追加的格式（先于内置格式尝试）
}

impl DataCleaner {
    pub fn new() -> Self {
        Self {
            extra_formats: Vec::new(),
        }
    }

    /// 追加自定义日期/日期时间格式（chrono strftime 语法）
    pub fn with_extra_formats(extra_formats: Vec<String>) -> Self {
        Self { extra_formats }
    }

    fn parse_with_format(value: &str, format: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(value, format)
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(value, format)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
    }

    /// 去掉千分位逗号；逗号不在千分位上时返回 None
    fn strip_thousands(value: &str) -> Option<String> {
        let value = value.trim();
        if !value.contains(',') {
            return Some(value.to_string());
        }

        let (sign, unsigned) = match value.strip_prefix(|c: char| c == '+' || c == '-') {
            Some(rest) => (&value[..1], rest),
            None => ("", value),
        };
        let (int_part, frac_part) = match unsigned.find('.') {
            Some(idx) => unsigned.split_at(idx),
            None => (unsigned, ""),
        };
        if frac_part.contains(',') {
            return None;
        }

        let mut groups = int_part.split(',');
        let head = groups.next()?;
        if head.is_empty() || head.len() > 3 || !head.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let mut digits = String::with_capacity(value.len());
        digits.push_str(sign);
        digits.push_str(head);
        for group in groups {
            if group.len() != 3 || !group.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            digits.push_str(group);
        }
        digits.push_str(frac_part);
        Some(digits)
    }

    /// Excel 序列号 → 日期时间（1900 日期系统，基准 1899-12-30）
    fn parse_excel_serial(value: &str) -> Option<NaiveDateTime> {
        let serial = value.parse::<f64>().ok()?;
        if !(EXCEL_SERIAL_MIN..=EXCEL_SERIAL_MAX).contains(&serial) {
            return None;
        }
        let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
        let days = serial.trunc() as i64;
        let seconds = ((serial - serial.trunc()) * 86_400.0).round() as i64;
        Some(base + Duration::days(days) + Duration::seconds(seconds))
    }
}

impl Default for DataCleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl DataCleanerTrait for DataCleaner {
    fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") || trimmed == "null" {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    fn clean_entity_id(&self, value: &str) -> String {
        let trimmed = value.trim();
        match trimmed.strip_suffix(".0") {
            Some(int_part) if !int_part.is_empty() && int_part.chars().all(|c| c.is_ascii_digit()) => {
                int_part.to_string()
            }
            _ => trimmed.to_string(),
        }
    }

    fn parse_datetime(&self, value: &str) -> Option<NaiveDateTime> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }

        // 配置追加格式优先
        for format in &self.extra_formats {
            if let Some(dt) = Self::parse_with_format(value, format) {
                return Some(dt);
            }
        }

        // 带时区的 RFC 3339（统一取本地墙钟时间）
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(dt.naive_local());
        }

        for format in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
                return Some(dt);
            }
        }

        for format in DATE_FORMATS {
            if let Ok(d) = NaiveDate::parse_from_str(value, format) {
                return d.and_hms_opt(0, 0, 0);
            }
        }

        Self::parse_excel_serial(value)
    }

    fn parse_f64(&self, value: &str) -> Option<f64> {
        let cleaned = Self::strip_thousands(value)?;
        cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    fn parse_count(&self, value: &str) -> Option<u64> {
        let cleaned = Self::strip_thousands(value)?;
        if let Ok(n) = cleaned.parse::<u64>() {
            return Some(n);
        }
        // Excel/JSON 中整数可能以浮点形式出现
        let f = cleaned.parse::<f64>().ok()?;
        if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
            Some(f as u64)
        } else {
            None
        }
    }
}
