use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Once;
use std::time::Instant;

static PERF_ENABLED: AtomicBool = AtomicBool::new(false);
static SLOW_OP_THRESHOLD_MS: AtomicU64 = AtomicU64::new(0);
static INIT: Once = Once::new();

thread_local! {
    static PERF_DEPTH: Cell<u32> = Cell::new(0);
    static ROW_COUNT: Cell<u64> = Cell::new(0);
}

fn is_true(v: &str) -> bool {
    matches!(
        v.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

/// 读取性能统计开关（进程内只读取一次）
///
/// 开关：
/// - Debug 默认开启；Release 默认关闭（可通过环境变量开启）
/// - `EQUIPMENT_METRICS_PERF=1` 强制开启
/// - `EQUIPMENT_METRICS_SLOW_OP_MS=200` 配置慢操作阈值（毫秒）
pub fn init_from_env() {
    INIT.call_once(|| {
        let enabled = match std::env::var("EQUIPMENT_METRICS_PERF") {
            Ok(v) => is_true(&v),
            Err(_) => cfg!(debug_assertions),
        };
        PERF_ENABLED.store(enabled, Ordering::Relaxed);

        let slow_ms = std::env::var("EQUIPMENT_METRICS_SLOW_OP_MS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(if cfg!(debug_assertions) { 200 } else { 1000 });
        SLOW_OP_THRESHOLD_MS.store(slow_ms, Ordering::Relaxed);
    });
}

pub fn is_enabled() -> bool {
    init_from_env();
    PERF_ENABLED.load(Ordering::Relaxed)
}

/// 记录当前操作处理的行数（仅在 PerfGuard 作用域内计数）
pub fn record_rows(rows: usize) {
    let active = PERF_DEPTH.with(|d| d.get() > 0);
    if !active {
        return;
    }
    ROW_COUNT.with(|c| c.set(c.get().saturating_add(rows as u64)));
}

/// 性能统计 Guard：记录 elapsed_ms + 处理行数
///
/// 使用方式：
/// ```ignore
/// let _perf = equipment_metrics::perf::PerfGuard::new("oee_compute");
/// // do work...
/// ```
pub struct PerfGuard {
    op: &'static str,
    start: Instant,
    rows_start: u64,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        PERF_DEPTH.with(|d| d.set(d.get().saturating_add(1)));
        let rows_start = ROW_COUNT.with(|c| c.get());
        Self {
            op,
            start: Instant::now(),
            rows_start,
        }
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        let rows = ROW_COUNT.with(|c| c.get()).saturating_sub(self.rows_start);

        if is_enabled() {
            tracing::info!(target: "perf", op = self.op, elapsed_ms, rows, "done");

            let threshold = SLOW_OP_THRESHOLD_MS.load(Ordering::Relaxed);
            if threshold > 0 && elapsed_ms >= threshold {
                tracing::warn!(target: "slow_op", op = self.op, elapsed_ms, rows, "slow operation");
            }
        }

        PERF_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_counted_inside_guard_only() {
        record_rows(100);
        let before = ROW_COUNT.with(|c| c.get());
        {
            let _perf = PerfGuard::new("test_op");
            record_rows(5);
            record_rows(7);
        }
        let after = ROW_COUNT.with(|c| c.get());
        assert_eq!(after - before, 12);
    }

    #[test]
    fn test_is_true() {
        assert!(is_true(" YES "));
        assert!(!is_true("0"));
    }
}
