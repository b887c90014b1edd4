//! Path: native/orbit_core/src/attack.rs
//! Summary: ボスの攻撃ステートマシン（待機 → 予備動作 → 点滅 → 攻撃 → 待機）
//!
//! 各フェーズは入場時にタイマーを 1 つだけ張り、その発火で次のフェーズへ遷移する。
//! したがってティアダウンは「張っている 1 本を取り消す」だけで済む。
//! 攻撃中の進捗だけは描画フレームごとにサンプリングする。

use std::time::Duration;

use serde::Serialize;

use crate::config::AttackParams;
use crate::frame_event::FrameEvent;
use crate::timer::{FiredTimer, TimerEvent, TimerId, TimerService};

/// 外部に公開する攻撃段階
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackStage {
    #[default]
    Idle,
    Blinking,
    Attacking,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AttackState {
    pub stage:             AttackStage,
    pub blink_on:          bool,
    pub attack_start_time: Option<Duration>,
    /// Attacking 以外では常に 0
    pub progress:          f32,
    /// Blinking → Attacking の瞬間に 1 度だけ確定するボス→プレイヤー方位
    pub aim_angle:         f32,
}

/// 内部フェーズ。Idle は待機と予備動作の 2 段に分かれる。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// 未開始、またはティアダウン済み
    Halted,
    Cooldown,
    WindUp,
    Blinking { toggles: u32 },
    Striking,
}

pub struct AttackDirector {
    state:        AttackState,
    phase:        Phase,
    params:       AttackParams,
    boss_center:  (f32, f32),
    orbit_radius: f32,
    armed:        Option<TimerId>,
}

impl AttackDirector {
    pub fn new(params: AttackParams, boss_center: (f32, f32), orbit_radius: f32) -> Self {
        Self {
            state: AttackState::default(),
            phase: Phase::Halted,
            params,
            boss_center,
            orbit_radius,
            armed: None,
        }
    }

    pub fn state(&self) -> &AttackState {
        &self.state
    }

    pub fn stage(&self) -> AttackStage {
        self.state.stage
    }

    pub fn pending_timers(&self) -> usize {
        self.armed.is_some() as usize
    }

    /// 最初のサイクルを開始する（待機タイマーを張る）。稼働中なら何もしない。
    pub fn start<T: TimerService>(&mut self, timers: &mut T) {
        if self.phase != Phase::Halted {
            return;
        }
        self.enter_cooldown(timers);
    }

    pub fn on_timer<T: TimerService>(
        &mut self,
        fired: &FiredTimer,
        player_pos: (f32, f32),
        timers: &mut T,
        events: &mut Vec<FrameEvent>,
    ) {
        if fired.event != TimerEvent::AttackPhase {
            return;
        }
        if self.armed != Some(fired.id) {
            log::warn!("stale attack timer {:?} ignored (phase={:?})", fired.id, self.phase);
            return;
        }
        self.armed = None;
        let now = fired.deadline;

        match self.phase {
            Phase::Halted => {}
            Phase::Cooldown => {
                self.phase = Phase::WindUp;
                self.arm(timers, self.params.pre_attack_delay());
            }
            Phase::WindUp => {
                self.phase = Phase::Blinking { toggles: 0 };
                self.state.stage = AttackStage::Blinking;
                self.state.blink_on = false;
                events.push(FrameEvent::TelegraphStarted);
                log::debug!("boss telegraph at {:?}", now);
                self.arm(timers, self.params.blink_interval());
            }
            Phase::Blinking { toggles } => {
                let toggles = toggles + 1;
                self.state.blink_on = !self.state.blink_on;
                events.push(FrameEvent::BlinkToggled { on: self.state.blink_on });
                if toggles < self.params.total_toggles() {
                    self.phase = Phase::Blinking { toggles };
                    self.arm(timers, self.params.blink_interval());
                } else {
                    self.enter_strike(now, player_pos, timers, events);
                }
            }
            Phase::Striking => {
                self.state.stage = AttackStage::Idle;
                self.state.attack_start_time = None;
                self.state.progress = 0.0;
                events.push(FrameEvent::StrikeEnded);
                log::debug!("boss strike ended at {:?}", now);
                self.enter_cooldown(timers);
            }
        }
    }

    /// 描画フレームごとの進捗サンプル。[0, 1] にクランプし、1 回の攻撃内で減少しない。
    pub fn sample(&mut self, now: Duration) -> f32 {
        self.state.progress = match (self.state.stage, self.state.attack_start_time) {
            (AttackStage::Attacking, Some(start)) => {
                let elapsed = now.saturating_sub(start).as_secs_f32();
                let p = (elapsed / self.params.attack_duration().as_secs_f32()).clamp(0.0, 1.0);
                p.max(self.state.progress)
            }
            _ => 0.0,
        };
        self.state.progress
    }

    /// ボス中心からプレイヤーへの方位
    pub fn bearing_to(&self, player_pos: (f32, f32)) -> f32 {
        (player_pos.1 - self.boss_center.1).atan2(player_pos.0 - self.boss_center.0)
    }

    /// i 番目のアームセグメントの中心距離。Idle では None。
    pub fn segment_distance(&self, i: usize) -> Option<f32> {
        let base = self.orbit_radius + self.params.attack_offset;
        let full = (i + 1) as f32 * self.params.segment_size;
        match self.state.stage {
            AttackStage::Idle => None,
            AttackStage::Blinking => Some(base + full),
            AttackStage::Attacking => Some(base + self.state.progress * full),
        }
    }

    /// セグメント座標を `out` に書き込む（`out` は内部で clear する）。
    /// 点滅中のプレビューはプレイヤーの現在方位を、攻撃中は確定した aim_angle を向く。
    pub fn segment_positions_into(&self, player_pos: (f32, f32), out: &mut Vec<(f32, f32)>) {
        out.clear();
        let angle = match self.state.stage {
            AttackStage::Idle => return,
            AttackStage::Blinking => self.bearing_to(player_pos),
            AttackStage::Attacking => self.state.aim_angle,
        };
        let (sin, cos) = angle.sin_cos();
        out.extend((0..self.params.arm_segments).filter_map(|i| {
            self.segment_distance(i)
                .map(|d| (self.boss_center.0 + d * cos, self.boss_center.1 + d * sin))
        }));
    }

    /// 張っているタイマーを取り消して停止する。取り消した数を返す。
    pub fn teardown<T: TimerService>(&mut self, timers: &mut T) -> usize {
        self.phase = Phase::Halted;
        match self.armed.take() {
            Some(id) => timers.cancel(id) as usize,
            None => 0,
        }
    }

    fn enter_cooldown<T: TimerService>(&mut self, timers: &mut T) {
        self.phase = Phase::Cooldown;
        self.arm(timers, self.params.attack_interval());
    }

    fn enter_strike<T: TimerService>(
        &mut self,
        now: Duration,
        player_pos: (f32, f32),
        timers: &mut T,
        events: &mut Vec<FrameEvent>,
    ) {
        self.phase = Phase::Striking;
        self.state.stage = AttackStage::Attacking;
        self.state.blink_on = false;
        self.state.aim_angle = self.bearing_to(player_pos);
        self.state.attack_start_time = Some(now);
        self.state.progress = 0.0;
        events.push(FrameEvent::StrikeStarted { aim_angle: self.state.aim_angle });
        log::debug!("boss strike at {:?} aim={:.3}rad", now, self.state.aim_angle);
        self.arm(timers, self.params.attack_duration());
    }

    fn arm<T: TimerService>(&mut self, timers: &mut T, delay: Duration) {
        self.armed = Some(timers.schedule(delay, TimerEvent::AttackPhase));
    }
}
