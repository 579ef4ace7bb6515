// ==========================================
// 设备效能指标核心库 - 文件解析器实现
// ==========================================
// 阶段 0: 文件读取与解析
// 支持: CSV (.csv) / Excel (.xlsx/.xls) / JSON (.json, 记录数组)
// ==========================================

use crate::domain::table::RawTable;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::FileParser;
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use serde_json::Value;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// 检查文件存在且扩展名在允许列表内
fn check_file(path: &Path, allowed: &[&str]) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if !allowed.contains(&ext.as_str()) {
        return Err(ImportError::UnsupportedFormat(ext));
    }
    Ok(())
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_table(&self, file_path: &Path) -> ImportResult<RawTable> {
        check_file(file_path, &["csv"])?;

        // 打开 CSV 文件
        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .trim(csv::Trim::All)
            .from_reader(file);

        // 读取表头
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut table = RawTable::new(headers);
        for result in reader.records() {
            let record = result?;
            let row: Vec<String> = record.iter().map(|v| v.trim().to_string()).collect();

            // 跳过完全空白的行
            if row.iter().all(|v| v.is_empty()) {
                continue;
            }
            table.push_row(row);
        }

        debug!(rows = table.len(), columns = table.columns.len(), "CSV 解析完成");
        Ok(table)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_to_table(&self, file_path: &Path) -> ImportResult<RawTable> {
        check_file(file_path, &["xlsx", "xls"])?;

        let mut workbook = open_workbook_auto(file_path)?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;

        // 提取表头（第一行）
        let mut rows = range.rows();
        let header_row = rows
            .next()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无数据行".to_string()))?;

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let mut table = RawTable::new(headers);
        for data_row in rows {
            let row: Vec<String> = data_row
                .iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect();

            // 跳过完全空白的行
            if row.iter().all(|v| v.is_empty()) {
                continue;
            }
            table.push_row(row);
        }

        debug!(sheet = %sheet_name, rows = table.len(), "Excel 解析完成");
        Ok(table)
    }
}

// ==========================================
// JSON Parser 实现
// ==========================================
// 格式: [{"Date": "...", "Id": 1, ...}, ...]
pub struct JsonParser;

impl JsonParser {
    /// 从 JSON 文本解析（便于测试与内存数据）
    pub fn parse_str(&self, content: &str) -> ImportResult<RawTable> {
        let value: Value = serde_json::from_str(content)?;
        let records = value.as_array().ok_or_else(|| {
            ImportError::JsonParseError("顶层必须是对象数组".to_string())
        })?;

        // 列集合: 合并所有记录的键（顺序同 serde_json::Map 的遍历顺序）
        let mut columns: Vec<String> = Vec::new();
        for (idx, record) in records.iter().enumerate() {
            let obj = record.as_object().ok_or_else(|| {
                ImportError::JsonParseError(format!("第 {} 条记录不是对象", idx + 1))
            })?;
            for key in obj.keys() {
                let key = key.trim();
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.to_string());
                }
            }
        }

        let mut table = RawTable::new(columns.clone());
        for record in records {
            let Some(obj) = record.as_object() else {
                continue;
            };
            let row: Vec<String> = columns
                .iter()
                .map(|col| {
                    obj.iter()
                        .find(|(k, _)| k.trim() == col)
                        .map(|(_, v)| Self::cell_text(v))
                        .unwrap_or_default()
                })
                .collect();

            if row.iter().all(|v| v.is_empty()) {
                continue;
            }
            table.push_row(row);
        }

        Ok(table)
    }

    fn cell_text(value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => other.to_string(),
        }
    }
}

impl FileParser for JsonParser {
    fn parse_to_table(&self, file_path: &Path) -> ImportResult<RawTable> {
        check_file(file_path, &["json"])?;

        let content = std::fs::read_to_string(file_path)?;
        let table = self.parse_str(&content)?;

        debug!(rows = table.len(), columns = table.columns.len(), "JSON 解析完成");
        Ok(table)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<RawTable> {
        let path = file_path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvParser.parse_to_table(path),
            "xlsx" | "xls" => ExcelParser.parse_to_table(path),
            "json" => JsonParser.parse_to_table(path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

impl FileParser for UniversalFileParser {
    fn parse_to_table(&self, file_path: &Path) -> ImportResult<RawTable> {
        self.parse(file_path)
    }
}
