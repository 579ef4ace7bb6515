// ==========================================
// 设备效能指标核心库 - 导入流水线
// ==========================================
// 职责: 文件解析 → 列名标准化 → 类型化记录（两个 API 共用）
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::MetricsConfig;
use crate::domain::table::RawTable;
use crate::domain::types::TableKind;
use crate::importer::data_cleaner::DataCleaner as DefaultCleaner;
use crate::importer::{
    AliasTable, ColumnCollision, RecordLoader, SchemaNormalizer, UniversalFileParser,
};
use std::path::Path;
use tracing::debug;

pub struct ImportPipeline {
    parser: UniversalFileParser,
    normalizer: SchemaNormalizer,
    loader: RecordLoader,
}

impl ImportPipeline {
    /// 以默认别名表为基础，叠加配置中的额外别名与日期格式
    pub fn new(mut aliases: AliasTable, config: &MetricsConfig) -> Self {
        aliases.extend(&config.extra_aliases);
        let cleaner = DefaultCleaner::with_extra_formats(config.extra_date_formats.clone());
        Self {
            parser: UniversalFileParser,
            normalizer: SchemaNormalizer::new(aliases),
            loader: RecordLoader::new(Box::new(cleaner)),
        }
    }

    pub fn loader(&self) -> &RecordLoader {
        &self.loader
    }

    pub fn read(&self, path: &Path) -> ApiResult<RawTable> {
        Ok(self.parser.parse(path)?)
    }

    /// 标准化列名，冲突追加到 collisions
    pub fn normalize(
        &self,
        kind: TableKind,
        table: RawTable,
        collisions: &mut Vec<ColumnCollision>,
    ) -> RawTable {
        let outcome = self.normalizer.normalize(table);
        debug!(table = %kind, renamed = ?outcome.renamed, "列名标准化");
        collisions.extend(outcome.collisions);
        outcome.table
    }

    /// 连接键检查（缺失属于配置错误，不进入逐行载入）
    pub fn require_join_keys(kind: TableKind, table: &RawTable, keys: &[&str]) -> ApiResult<()> {
        let missing = table.missing_columns(keys);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ApiError::JoinKey {
                table: kind,
                missing: missing.into_iter().map(str::to_string).collect(),
            })
        }
    }
}
