// ==========================================
// 设备效能指标核心库 - 导入层
// ==========================================
// 职责: 外部表格 → 规范列 → 类型化记录 + DQ 报告
// 支持: CSV, Excel, JSON
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod dq_validator;
pub mod error;
pub mod file_parser;
pub mod importer_trait;
pub mod record_loader;
pub mod schema_normalizer;
pub mod templates;

// 重导出核心类型
pub use data_cleaner::DataCleaner as DataCleanerImpl;
pub use dq_validator::{optional_columns, required_columns, DqValidator};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, JsonParser, UniversalFileParser};
pub use record_loader::{Loaded, RecordLoader};
pub use schema_normalizer::{columns, AliasTable, ColumnCollision, NormalizeOutcome, SchemaNormalizer};

// 重导出 Trait 接口
pub use importer_trait::{DataCleaner, FileParser};
