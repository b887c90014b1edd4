//! Path: native/orbit_core/src/timer.rs
//! Summary: 単発タイマーサービス（仮想時刻キュー・キャンセル可能なハンドル）
//!
//! コールバックはクロージャではなく `TimerEvent` で表し、発火したタイマーは
//! 所有者（Encounter）が各コントローラに振り分ける。

use std::collections::BTreeMap;
use std::time::Duration;

use rustc_hash::FxHashMap;

/// タイマーハンドル。発番は単調増加なので同時刻のタイマーは登録順に発火する。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// 発火時に所有者へ届けるイベント
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    DashExpired,
    DodgeExpired,
    /// 攻撃ディレクターの現在フェーズの終了
    AttackPhase,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FiredTimer {
    pub id:       TimerId,
    pub deadline: Duration,
    pub event:    TimerEvent,
}

/// schedule / cancel の契約
pub trait TimerService {
    fn now(&self) -> Duration;
    fn schedule(&mut self, delay: Duration, event: TimerEvent) -> TimerId;
    /// 未発火のタイマーを取り消したとき true
    fn cancel(&mut self, id: TimerId) -> bool;
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    now:     Duration,
    next_id: u64,
    pending: BTreeMap<(Duration, TimerId), TimerEvent>,
    index:   FxHashMap<TimerId, Duration>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.keys().next().map(|&(deadline, _)| deadline)
    }

    /// `until` 以前に期限が来た最も早いタイマーを取り出し、`now` をその期限まで進める。
    /// 発火処理の中で再スケジュールすると、期限基準で次の期限が決まる（ドリフトなし）。
    pub fn pop_due(&mut self, until: Duration) -> Option<FiredTimer> {
        let (&(deadline, id), _) = self.pending.first_key_value()?;
        if deadline > until {
            return None;
        }
        let event = self.pending.remove(&(deadline, id))?;
        self.index.remove(&id);
        self.now = self.now.max(deadline);
        Some(FiredTimer { id, deadline, event })
    }

    /// 時刻を進める。逆行したサンプルは無視する。
    pub fn advance_to(&mut self, t: Duration) {
        if t < self.now {
            log::warn!(
                "timer clock went backwards: now={:?} sample={:?} (ignored)",
                self.now,
                t
            );
            return;
        }
        self.now = t;
    }

    /// 全タイマーを破棄し、破棄した数を返す
    pub fn cancel_all(&mut self) -> usize {
        let n = self.pending.len();
        self.pending.clear();
        self.index.clear();
        n
    }
}

impl TimerService for TimerQueue {
    fn now(&self) -> Duration {
        self.now
    }

    fn schedule(&mut self, delay: Duration, event: TimerEvent) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let deadline = self.now + delay;
        self.pending.insert((deadline, id), event);
        self.index.insert(id, deadline);
        id
    }

    fn cancel(&mut self, id: TimerId) -> bool {
        match self.index.remove(&id) {
            Some(deadline) => self.pending.remove(&(deadline, id)).is_some(),
            None => false,
        }
    }
}
