// ==========================================
// 设备效能指标核心库 - 命令行入口
// ==========================================
// 子命令:
// - oee          生产 + 停机 → OEE 报告
// - maintenance  运行时长 + 维修历史 (+ 设备寿命 / 振动) → MTBF / RUL 报告
// - template     输出或写出样例数据模板
// 结果输出到 stdout，日志输出到 stderr
// ==========================================

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use equipment_metrics::api::{MaintenanceApi, MaintenanceReport, OeeApi, OeeReport};
use equipment_metrics::config::{ConfigManager, MetricsConfig};
use equipment_metrics::domain::quality::DqReport;
use equipment_metrics::domain::types::{EntityFilter, RulNormalization, TableKind};
use equipment_metrics::importer::templates;
use equipment_metrics::logging;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "equipment-metrics", version, about = "设备效能指标计算（OEE / MTBF / RUL）")]
struct Cli {
    /// 配置文件路径（默认读取 EQUIPMENT_METRICS_CONFIG 或用户配置目录）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 输出格式
    #[arg(long, value_enum, default_value = "json", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Summary,
}

#[derive(Subcommand)]
enum Commands {
    /// 计算 OEE（可用率 × 性能率 × 合格率）
    Oee {
        /// 生产记录文件（CSV / Excel / JSON）
        production: PathBuf,
        /// 停机记录文件
        downtime: PathBuf,
        /// 只看指定设备（缺省或 All 为全部）
        #[arg(long)]
        entity: Option<String>,
        /// 按原样匹配 --entity（ID 恰为 "All" 的设备）
        #[arg(long, requires = "entity")]
        exact_entity: bool,
    },
    /// 计算 MTBF 与 RUL
    Maintenance {
        /// 运行时长文件
        operating: PathBuf,
        /// 维修历史文件
        failures: PathBuf,
        /// 设备寿命文件（提供时使用寿命模式）
        #[arg(long)]
        equipment: Option<PathBuf>,
        /// 振动数据文件
        #[arg(long)]
        vibration: Option<PathBuf>,
        /// 只看指定设备（缺省或 All 为全部）
        #[arg(long)]
        entity: Option<String>,
        /// 按原样匹配 --entity（ID 恰为 "All" 的设备）
        #[arg(long, requires = "entity")]
        exact_entity: bool,
        /// 计算基准日（YYYY-MM-DD，默认今天）
        #[arg(long)]
        today: Option<NaiveDate>,
        /// 启发式 RUL 系数（覆盖配置）
        #[arg(long)]
        rul_factor: Option<f64>,
        /// 启发式百分比归一化基准: full_dataset / filtered_view（覆盖配置）
        #[arg(long)]
        normalization: Option<RulNormalization>,
    },
    /// 样例数据模板
    Template {
        /// 表类型（production / downtime / operating / failure / equipment / vibration）
        kind: Option<TableKind>,
        /// 写出全部模板到目录
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// 以 JSON 输出单个模板
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Oee {
            production,
            downtime,
            entity,
            exact_entity,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let api = OeeApi::new(config);
            let filter = entity_filter(entity.as_deref(), exact_entity);
            let report = api.run(&production, &downtime, &filter)?;
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Summary => print_oee_summary(&report, api.config().dq_sample_size),
            }
        }
        Commands::Maintenance {
            operating,
            failures,
            equipment,
            vibration,
            entity,
            exact_entity,
            today,
            rul_factor,
            normalization,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(factor) = rul_factor {
                config.rul_factor = factor;
            }
            if let Some(normalization) = normalization {
                config.rul_normalization = normalization;
            }

            let api = MaintenanceApi::new(config);
            let dataset = api.load_files(
                &operating,
                &failures,
                equipment.as_deref(),
                vibration.as_deref(),
            )?;
            let filter = entity_filter(entity.as_deref(), exact_entity);
            let today = today.unwrap_or_else(|| Local::now().date_naive());
            let report = api.compute(&dataset, &filter, today)?;
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Summary => {
                    print_maintenance_summary(&report, api.config().dq_sample_size)
                }
            }
        }
        Commands::Template {
            kind,
            out_dir,
            json,
        } => match (out_dir, kind) {
            (Some(dir), _) => {
                for path in templates::write_samples(&dir)? {
                    println!("{}", path.display());
                }
            }
            (None, Some(kind)) => {
                eprintln!("{}", templates::column_guide(kind));
                if json {
                    println!("{}", templates::sample_json(kind)?);
                } else {
                    print!("{}", templates::sample_csv(kind));
                }
            }
            (None, None) => {
                for kind in TableKind::ALL {
                    println!("{}\n", templates::column_guide(kind));
                }
            }
        },
    }

    Ok(())
}

fn entity_filter(entity: Option<&str>, exact: bool) -> EntityFilter {
    match entity {
        Some(id) if exact => EntityFilter::only(id),
        _ => EntityFilter::from_option(entity),
    }
}

fn load_config(path: Option<&Path>) -> Result<MetricsConfig> {
    let manager = match path {
        Some(path) => {
            let mut manager = ConfigManager::from_file(path)
                .with_context(|| format!("无法加载配置文件 {}", path.display()))?;
            manager.apply_env_overrides(|key| std::env::var(key).ok());
            manager
        }
        None => ConfigManager::load_default()?,
    };
    Ok(manager.load_metrics_config())
}

fn print_dq(reports: &[DqReport], sample_size: usize) {
    for report in reports {
        println!(
            "[DQ] {}: total={} loaded={} excluded={} warning={}",
            report.table,
            report.summary.total_rows,
            report.summary.loaded,
            report.summary.excluded,
            report.summary.warning
        );
        for v in report.sample(sample_size) {
            println!("  row {} {:?} {}: {}", v.row_number, v.level, v.field, v.message);
        }
    }
}

fn print_oee_summary(report: &OeeReport, sample_size: usize) {
    print_dq(&report.dq_reports, sample_size);
    match &report.overall {
        Some(o) => println!(
            "overall ({} rows): availability={:.4} performance={:.4} quality={:.4} oee={:.4}",
            o.row_count, o.availability, o.performance, o.quality, o.oee
        ),
        None => println!("filter {}: no rows", report.filter),
    }
    for m in &report.entity_metrics {
        println!(
            "  {}: availability={:.4} performance={:.4} quality={:.4} oee={:.4}",
            m.entity_id, m.availability, m.performance, m.quality, m.oee
        );
    }
}

fn print_maintenance_summary(report: &MaintenanceReport, sample_size: usize) {
    print_dq(&report.dq_reports, sample_size);
    println!("mode={} today={}", report.mode, report.today);
    for r in &report.rul {
        println!(
            "  {}: failures={} mtbf={} rul%={}",
            r.entity_id(),
            r.mtbf.failure_count,
            r.mtbf.mtbf_hours.map_or("-".to_string(), |v| v.to_string()),
            r.rul_percent.map_or("-".to_string(), |v| format!("{:.2}", v))
        );
    }
    if let Some(avg) = report.average_rul_percent {
        println!("average rul%={:.2}", avg);
    }
}
