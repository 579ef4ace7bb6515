// ==========================================
// 设备效能指标核心库 - 原始表格
// ==========================================
// 职责: 文件解析结果的统一承载（列名 + 按位置存储的单元格）
// 红线: 不做类型转换，所有单元格保持去空白后的文本
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// RawTable - 原始矩形表格
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub columns: Vec<String>,   // 列名（表头顺序）
    pub rows: Vec<Vec<String>>, // 数据行（与 columns 按位置对齐）
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// 由表头与行构造（短行补空字符串，长行截断）
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 列位置（同名列取第一个）
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// 返回缺失的列名（保持入参顺序）
    pub fn missing_columns<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|name| !self.has_column(name))
            .collect()
    }

    /// 读取单元格（空白视为 None）
    pub fn cell(&self, row_idx: usize, column: &str) -> Option<&str> {
        let col_idx = self.column_index(column)?;
        self.rows
            .get(row_idx)
            .and_then(|row| row.get(col_idx))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RawTable {
        RawTable::from_rows(
            vec!["Date".to_string(), "Id".to_string()],
            vec![
                vec!["2024-06-15".to_string(), "11".to_string()],
                vec!["2024-06-16".to_string()],
            ],
        )
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = sample();
        assert_eq!(table.rows[1].len(), 2);
        assert_eq!(table.cell(1, "Id"), None);
    }

    #[test]
    fn test_cell_lookup() {
        let table = sample();
        assert_eq!(table.cell(0, "Id"), Some("11"));
        assert_eq!(table.cell(0, "Missing"), None);
        assert_eq!(table.cell(5, "Id"), None);
    }

    #[test]
    fn test_missing_columns() {
        let table = sample();
        assert_eq!(
            table.missing_columns(&["Date", "Hours", "Id", "Units"]),
            vec!["Hours", "Units"]
        );
    }
}
