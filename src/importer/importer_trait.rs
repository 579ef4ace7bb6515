// ==========================================
// 设备效能指标核心库 - 导入管道 Trait
// ==========================================
// 职责: 定义导入各阶段接口（不包含实现）
// 流程: 文件解析 → 列名标准化 → 单元格清洗 → 记录载入
// ==========================================

use crate::domain::table::RawTable;
use crate::importer::error::ImportResult;
use chrono::{NaiveDate, NaiveDateTime};
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: CsvParser, ExcelParser, JsonParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始表格
    ///
    /// # 参数
    /// - file_path: 文件路径
    ///
    /// # 返回
    /// - Ok(RawTable): 表头 + 数据行（完全空白的行已跳过）
    /// - Err: 文件不存在、扩展名不符、格式错误
    fn parse_to_table(&self, file_path: &Path) -> ImportResult<RawTable>;
}

// ==========================================
// DataCleaner Trait
// ==========================================
// 用途: 单元格清洗与类型转换接口（阶段 2）
// 实现者: DataCleaner
pub trait DataCleaner: Send + Sync {
    /// 标准化 NULL 值（空字符串/空白 → None）
    fn normalize_null(&self, value: Option<&str>) -> Option<String>;

    /// 标准化设备 ID（去空白，整数形式的浮点数去掉 ".0"）
    fn clean_entity_id(&self, value: &str) -> String;

    /// 解析日期时间（多种文本格式 + Excel 序列号）
    ///
    /// # 返回
    /// - Some(NaiveDateTime): 纯日期格式补 00:00:00
    /// - None: 所有格式均不匹配
    fn parse_datetime(&self, value: &str) -> Option<NaiveDateTime>;

    /// 解析日期（解析日期时间后取日期部分）
    fn parse_date(&self, value: &str) -> Option<NaiveDate> {
        self.parse_datetime(value).map(|dt| dt.date())
    }

    /// 解析浮点数（允许千分位逗号）
    fn parse_f64(&self, value: &str) -> Option<f64>;

    /// 解析非负整数计数（"1000" / "1000.0" 均可，带小数部分则失败）
    fn parse_count(&self, value: &str) -> Option<u64>;
}
