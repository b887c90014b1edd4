//! Path: native/orbit_core/src/clock.rs
//! Summary: 単調時刻ソース（実時間 / テスト・スクリプト用の手動時刻）

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 原点からの経過時間を返す単調時計
pub trait Clock: Send {
    fn now(&self) -> Duration;
}

pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// 手動で進める時計。clone はすべて同じ時刻を共有する。
#[derive(Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, t: Duration) {
        let n = t.as_nanos().min(u64::MAX as u128) as u64;
        self.nanos.store(n, Ordering::SeqCst);
    }

    pub fn advance(&self, dt: Duration) {
        let n = dt.as_nanos().min(u64::MAX as u128) as u64;
        self.nanos.fetch_add(n, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}
