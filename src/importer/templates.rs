// ==========================================
// 设备效能指标核心库 - 样例数据模板
// ==========================================
// 职责: 为每种表提供可直接导入的样例（CSV / JSON）
// 用途: 命令行 template 子命令、generate_sample_data 工具、测试
// ==========================================

use crate::domain::types::TableKind;
use crate::importer::dq_validator::{optional_columns, required_columns};
use crate::importer::error::ImportResult;
use std::path::{Path, PathBuf};
use tracing::info;

/// 样例 CSV（表头使用常见的源列拼写，演示别名识别）
pub fn sample_csv(kind: TableKind) -> &'static str {
    match kind {
        TableKind::Production => {
            "Date,Id,ProductionHours,ProducedGoods,DefectGoods,IdealCycle\n\
             2024-06-15,11,21,817,42,1.4\n\
             2024-06-15,12,8,1000,50,0.5\n\
             2024-06-16,11,20,790,30,1.4\n\
             2024-06-16,12,8,950,20,0.5\n\
             2024-06-16,13,10,600,0,0.9\n"
        }
        TableKind::Downtime => {
            "Date,Id,DownTimeHrs\n\
             2024-06-15T00:00:00.000,11,1\n\
             2024-06-15T00:00:00.000,12,3\n\
             2024-06-16T00:00:00.000,11,0\n\
             2024-06-16T00:00:00.000,12,1\n\
             2024-06-16T00:00:00.000,13,3\n"
        }
        TableKind::Operating => {
            "PumpID,Date,Operating Hours\n\
             1,2024-06-01,120\n\
             1,2024-06-02,115\n\
             2,2024-06-01,105\n\
             2,2024-06-02,110\n"
        }
        TableKind::Failure => {
            "PumpID,Failure Date,Description\n\
             1,2024-06-01,Change oil\n\
             1,2024-06-02,Replace bearings\n\
             2,2024-06-01,Clean filters\n\
             2,2024-06-02,Inspect seals\n"
        }
        TableKind::Equipment => {
            "PumpID,Manufacture Date,Expire Date\n\
             1,2015-01-01,2025-01-01\n\
             2,2020-03-15,2035-03-15\n"
        }
        TableKind::Vibration => {
            "PumpID,Date,Vibration Level (mm/s)\n\
             1,2024-06-01 08:00:00,0.5\n\
             1,2024-06-01 08:01:00,0.6\n\
             2,2024-06-01 08:00:00,0.7\n\
             2,2024-06-01 08:01:00,0.8\n"
        }
    }
}

/// 样例 JSON（记录数组，与 CSV 内容一致）
pub fn sample_json(kind: TableKind) -> ImportResult<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(sample_csv(kind).as_bytes());
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        let obj: serde_json::Map<String, serde_json::Value> = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| {
                let number = match v.parse::<i64>() {
                    Ok(n) => Some(serde_json::Number::from(n)),
                    Err(_) => v.parse::<f64>().ok().and_then(serde_json::Number::from_f64),
                };
                let value = number
                    .map(serde_json::Value::Number)
                    .unwrap_or_else(|| serde_json::Value::String(v.to_string()));
                (h.to_string(), value)
            })
            .collect();
        records.push(serde_json::Value::Object(obj));
    }

    Ok(serde_json::to_string_pretty(&records)?)
}

/// 列说明（规范列 + 是否必需）
pub fn column_guide(kind: TableKind) -> String {
    let mut lines = vec![format!("[{}]", kind)];
    for column in required_columns(kind) {
        lines.push(format!("  {} (必需)", column));
    }
    for column in optional_columns(kind) {
        lines.push(format!("  {} (可选)", column));
    }
    lines.join("\n")
}

/// 将全部样例写入目录，返回写出的文件列表
pub fn write_samples(dir: &Path) -> ImportResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    for kind in TableKind::ALL {
        let csv_path = dir.join(format!("{}_sample.csv", kind));
        std::fs::write(&csv_path, sample_csv(kind))?;
        written.push(csv_path);

        let json_path = dir.join(format!("{}_sample.json", kind));
        std::fs::write(&json_path, sample_json(kind)?)?;
        written.push(json_path);
    }

    info!(dir = %dir.display(), files = written.len(), "样例数据已生成");
    Ok(written)
}
