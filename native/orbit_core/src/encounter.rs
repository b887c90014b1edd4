//! Path: native/orbit_core/src/encounter.rs
//! Summary: エンカウンター全体（入力・タイマー振り分け・フレーム更新・ティアダウン）
//!
//! 状態はすべて MotionController と AttackDirector のどちらか一方が所有する。
//! 両者の接点は、攻撃確定の瞬間に AttackDirector がプレイヤー座標を 1 回読むことだけ。

use std::time::Duration;

use crate::attack::{AttackDirector, AttackState};
use crate::config::EncounterConfig;
use crate::error::ConfigError;
use crate::frame_event::FrameEvent;
use crate::motion::{MotionController, MotionState};
use crate::render_frame::RenderFrame;
use crate::timer::{TimerEvent, TimerQueue, TimerService};

pub struct Encounter {
    config:       EncounterConfig,
    timers:       TimerQueue,
    motion:       MotionController,
    attack:       AttackDirector,
    /// このフレームで発生したイベント（drain_frame_events で取り出す）
    frame_events: Vec<FrameEvent>,
    frame_id:     u64,
    last_frame:   Duration,
    last_render:  RenderFrame,
    shut_down:    bool,
}

impl Encounter {
    /// 設定を検証し、t = 0 で最初の攻撃サイクルを開始する
    pub fn new(config: EncounterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let center = config.world.boss_center();
        let mut timers = TimerQueue::new();
        let motion = MotionController::new(config.motion, center);
        let mut attack = AttackDirector::new(config.attack, center, config.motion.orbit_radius);
        attack.start(&mut timers);

        let mut enc = Self {
            config,
            timers,
            motion,
            attack,
            frame_events: Vec::new(),
            frame_id: 0,
            last_frame: Duration::ZERO,
            last_render: RenderFrame::default(),
            shut_down: false,
        };
        enc.last_render = enc.build_render_frame(Duration::ZERO);
        let bindings = &enc.config().bindings;
        if bindings.is_empty() {
            log::warn!("encounter has no key bindings; all key input will be ignored");
        }
        log::info!(
            "encounter ready: cycle period {:?}, orbit radius {}, {} key bindings",
            enc.config().attack.cycle_period(),
            enc.config().motion.orbit_radius,
            bindings.len()
        );
        Ok(enc)
    }

    pub fn config(&self) -> &EncounterConfig {
        &self.config
    }

    pub fn motion_state(&self) -> &MotionState {
        self.motion.state()
    }

    pub fn attack_state(&self) -> &AttackState {
        self.attack.state()
    }

    pub fn player_position(&self) -> (f32, f32) {
        self.motion.position()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.pending_count()
    }

    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// 未登録キーは無視する
    pub fn key_down(&mut self, key: &str, at: Duration) {
        if self.shut_down {
            return;
        }
        self.run_timers_until(at);
        if let Some(action) = self.config.bindings.resolve(key) {
            self.motion
                .on_key_down(action, &mut self.timers, &mut self.frame_events);
        }
    }

    pub fn key_up(&mut self, key: &str, at: Duration) {
        if self.shut_down {
            return;
        }
        self.run_timers_until(at);
        if let Some(action) = self.config.bindings.resolve(key) {
            self.motion.on_key_up(action);
        }
    }

    /// フォーカス喪失時など、押しっぱなしの旋回入力を解除する
    pub fn release_steering(&mut self, at: Duration) {
        if self.shut_down {
            return;
        }
        self.run_timers_until(at);
        self.motion.release_steering();
    }

    /// 1 描画フレーム: タイマー発火 → 角度積分 → 攻撃進捗サンプル → スナップショット
    pub fn frame(&mut self, now: Duration) -> RenderFrame {
        if self.shut_down {
            return self.last_render.clone();
        }
        self.run_timers_until(now);

        let dt = now.saturating_sub(self.last_frame);
        self.last_frame = self.last_frame.max(now);
        self.frame_id += 1;

        self.motion.tick(dt);
        self.attack.sample(now);

        let frame = self.build_render_frame(now);
        log::trace!(
            "frame {} t={:?} angle={:.3} stage={:?} progress={:.2}",
            self.frame_id,
            now,
            self.motion.state().angle,
            frame.attack_stage,
            frame.attack_progress
        );
        self.last_render = frame.clone();
        frame
    }

    pub fn drain_frame_events(&mut self) -> Vec<FrameEvent> {
        self.frame_events.drain(..).collect()
    }

    /// 保留中のタイマーをすべて取り消す。以後の入力・フレームは no-op。
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        let owned = self.motion.teardown(&mut self.timers) + self.attack.teardown(&mut self.timers);
        let leaked = self.timers.cancel_all();
        if leaked > 0 {
            log::warn!("{} untracked timers dropped at shutdown", leaked);
        }
        self.shut_down = true;
        log::info!(
            "encounter shut down after {} frames ({} timers cancelled)",
            self.frame_id,
            owned + leaked
        );
    }

    /// `until` までに期限が来たタイマーを期限順に所有者へ届ける
    fn run_timers_until(&mut self, until: Duration) {
        while let Some(fired) = self.timers.pop_due(until) {
            match fired.event {
                TimerEvent::DashExpired | TimerEvent::DodgeExpired => {
                    self.motion.on_timer(&fired, &mut self.frame_events);
                }
                TimerEvent::AttackPhase => {
                    let player = self.motion.position();
                    self.attack.on_timer(
                        &fired,
                        player,
                        &mut self.timers,
                        &mut self.frame_events,
                    );
                }
            }
        }
        self.timers.advance_to(until);
    }

    fn build_render_frame(&self, now: Duration) -> RenderFrame {
        let player_position = self.motion.position();
        let motion = self.motion.state();
        let attack = self.attack.state();
        let mut segment_positions = Vec::with_capacity(self.config.attack.arm_segments);
        self.attack
            .segment_positions_into(player_position, &mut segment_positions);

        RenderFrame {
            frame_id: self.frame_id,
            elapsed: now,
            boss_position: self.config.world.boss_center(),
            player_position,
            dash_active: motion.dash_active,
            dodge_active: motion.dodge_active,
            blink_on: attack.blink_on,
            attack_stage: attack.stage,
            attack_progress: attack.progress,
            aim_angle: attack.aim_angle,
            segment_size: self.config.attack.segment_size,
            segment_positions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attack::AttackStage;
    use crate::input::{Action, KeyBindings};
    use crate::config::OrbitIntegration;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn encounter() -> Encounter {
        Encounter::new(EncounterConfig::default()).unwrap()
    }

    /// 16ms 刻みで `from..=to` のフレームを回す
    fn run_frames(enc: &mut Encounter, from: u64, to: u64) -> Vec<RenderFrame> {
        (from..=to).step_by(16).map(|t| enc.frame(ms(t))).collect()
    }

    #[test]
    fn rejects_invalid_config() {
        let mut config = EncounterConfig::default();
        config.attack.total_blinks = 0;
        assert!(Encounter::new(config).is_err());
    }

    #[test]
    fn starts_idle_with_one_armed_attack_timer() {
        let enc = encounter();
        assert_eq!(enc.attack_state().stage, AttackStage::Idle);
        assert_eq!(enc.pending_timers(), 1);
        assert_eq!(enc.player_position(), (300.0, 200.0));
    }

    #[test]
    fn steer_right_twenty_frames() {
        let mut enc = encounter();
        enc.key_down("ArrowRight", ms(0));
        for i in 1..=20 {
            enc.frame(ms(i * 16));
        }
        assert!((enc.motion_state().angle - 1.0).abs() < 1e-4);

        enc.key_up("ArrowRight", ms(400));
        enc.frame(ms(416));
        assert!((enc.motion_state().angle - 1.0).abs() < 1e-4);
    }

    #[test]
    fn custom_bindings_replace_defaults() {
        let mut config = EncounterConfig::default();
        config.bindings = KeyBindings::empty();
        config.bindings.bind("KeyD", Action::SteerRight);
        let mut enc = Encounter::new(config).unwrap();
        assert_eq!(enc.config().bindings.len(), 1);

        enc.key_down("ArrowRight", ms(0));
        enc.frame(ms(16));
        assert_eq!(enc.motion_state().angle, 0.0);

        enc.key_down("KeyD", ms(16));
        enc.frame(ms(32));
        assert!((enc.motion_state().angle - 0.05).abs() < 1e-6);
    }

    #[test]
    fn unbound_encounter_still_runs_the_attack_cycle() {
        let mut config = EncounterConfig::default();
        config.bindings = KeyBindings::empty();
        let mut enc = Encounter::new(config).unwrap();
        assert!(enc.config().bindings.is_empty());

        enc.key_down("Space", ms(0));
        assert!(!enc.motion_state().dash_active);
        assert_eq!(enc.frame(ms(4_000)).attack_stage, AttackStage::Blinking);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let mut enc = encounter();
        enc.key_down("KeyZ", ms(0));
        enc.key_up("F13", ms(1));
        enc.frame(ms(16));
        assert_eq!(*enc.motion_state(), MotionState::default());
        assert!(enc.drain_frame_events().is_empty());
        assert_eq!(enc.pending_timers(), 1);
    }

    #[test]
    fn double_dodge_ends_once_at_first_deadline() {
        let mut enc = encounter();
        enc.key_down("ControlLeft", ms(1_000));
        enc.key_down("ControlLeft", ms(1_100));
        enc.key_up("ControlLeft", ms(1_101));

        let before = enc.frame(ms(1_199));
        assert!(before.dodge_active);
        assert!((before.player_distance() - 150.0).abs() < 1e-3);

        let after = enc.frame(ms(1_200));
        assert!(!after.dodge_active);
        assert!((after.player_distance() - 100.0).abs() < 1e-3);

        run_frames(&mut enc, 1_216, 2_000);
        let events = enc.drain_frame_events();
        let started = events.iter().filter(|e| **e == FrameEvent::DodgeStarted).count();
        let ended = events.iter().filter(|e| **e == FrameEvent::DodgeEnded).count();
        assert_eq!((started, ended), (1, 1));
    }

    #[test]
    fn dash_expires_between_frames_before_the_tick() {
        let mut enc = encounter();
        enc.key_down("ArrowLeft", ms(0));
        enc.key_down("Space", ms(0));
        enc.frame(ms(16));
        assert!((enc.motion_state().angle + 0.15).abs() < 1e-4);

        // 100ms で失効 → このフレームの tick は通常速度
        enc.frame(ms(112));
        assert!(!enc.motion_state().dash_active);
        assert!((enc.motion_state().angle + 0.20).abs() < 1e-4);
    }

    #[test]
    fn render_frame_follows_attack_cycle() {
        let mut enc = encounter();
        let frames = run_frames(&mut enc, 16, 6_992);
        let first_blink = frames
            .iter()
            .find(|f| f.attack_stage == AttackStage::Blinking)
            .unwrap();
        assert!(first_blink.elapsed >= ms(4_000));
        assert_eq!(first_blink.segment_positions.len(), 5);

        for f in &frames {
            match f.attack_stage {
                AttackStage::Idle => {
                    assert!(f.segment_positions.is_empty());
                    assert_eq!(f.attack_progress, 0.0);
                }
                AttackStage::Blinking => assert_eq!(f.attack_progress, 0.0),
                AttackStage::Attacking => {
                    assert!((0.0..=1.0).contains(&f.attack_progress));
                    assert!(!f.blink_on);
                }
            }
        }
        assert!(frames.iter().any(|f| f.blink_on));
        assert!(frames.iter().any(|f| f.attack_stage == AttackStage::Attacking));
        assert_eq!(frames.last().unwrap().attack_stage, AttackStage::Idle);
    }

    #[test]
    fn aim_uses_player_position_at_strike_instant() {
        let mut enc = encounter();
        run_frames(&mut enc, 16, 6_384);
        // 攻撃直前に下側 (π/2) へ移動
        enc.key_down("ArrowRight", ms(6_384));
        let quarter_turn = (std::f32::consts::FRAC_PI_2 / 0.05).round() as u64;
        for i in 1..=quarter_turn {
            enc.frame(ms(6_384) + Duration::from_micros(i * 10));
        }
        enc.key_up("ArrowRight", ms(6_390));
        let aim_at_strike = enc.motion_state().angle;

        let strike = enc.frame(ms(6_400));
        assert_eq!(strike.attack_stage, AttackStage::Attacking);
        assert!((strike.aim_angle - aim_at_strike).abs() < 1e-4);

        // 攻撃中に動いても aim は固定
        enc.key_down("ArrowLeft", ms(6_410));
        let later = run_frames(&mut enc, 6_416, 6_690);
        assert!(later
            .iter()
            .all(|f| (f.aim_angle - aim_at_strike).abs() < 1e-4));
        assert!(later.windows(2).all(|w| w[1].attack_progress >= w[0].attack_progress));
    }

    #[test]
    fn frame_events_are_drained_once() {
        let mut enc = encounter();
        enc.key_down("Space", ms(0));
        run_frames(&mut enc, 16, 4_000);
        let events = enc.drain_frame_events();
        assert_eq!(
            events,
            vec![
                FrameEvent::DashStarted,
                FrameEvent::DashEnded,
                FrameEvent::TelegraphStarted,
            ]
        );
        assert!(enc.drain_frame_events().is_empty());
    }

    #[test]
    fn shutdown_cancels_everything_and_freezes_state() {
        let mut enc = encounter();
        enc.key_down("Space", ms(0));
        enc.key_down("ControlRight", ms(0));
        enc.key_down("ArrowRight", ms(0));
        let last = enc.frame(ms(16));
        assert_eq!(enc.pending_timers(), 3);

        enc.shutdown();
        assert!(enc.is_shut_down());
        assert_eq!(enc.pending_timers(), 0);
        enc.drain_frame_events();

        enc.key_down("ArrowLeft", ms(20));
        let frozen = enc.frame(ms(60_000));
        assert_eq!(frozen, last);
        assert!(enc.drain_frame_events().is_empty());

        // 二重 shutdown は no-op
        enc.shutdown();
        assert_eq!(enc.pending_timers(), 0);
    }

    #[test]
    fn focus_loss_releases_steering_only() {
        let mut enc = encounter();
        enc.key_down("ArrowRight", ms(0));
        enc.key_down("ControlLeft", ms(0));
        enc.release_steering(ms(10));
        enc.frame(ms(16));
        let s = enc.motion_state();
        assert_eq!(s.angle, 0.0);
        assert!(!s.input_right);
        assert!(s.dodge_active);
    }

    #[test]
    fn elapsed_integration_is_frame_rate_independent() {
        let mut config = EncounterConfig::default();
        config.motion.integration = OrbitIntegration::Elapsed { reference_fps: 60.0 };

        let mut fast = Encounter::new(config.clone()).unwrap();
        let mut slow = Encounter::new(config).unwrap();
        fast.key_down("ArrowRight", ms(0));
        slow.key_down("ArrowRight", ms(0));
        for i in 1..=60 {
            fast.frame(ms(i * 10));
        }
        for i in 1..=20 {
            slow.frame(ms(i * 30));
        }
        // 600ms × 60fps × 0.05 = 1.8rad
        assert!((fast.motion_state().angle - 1.8).abs() < 1e-3);
        assert!((slow.motion_state().angle - 1.8).abs() < 1e-3);
    }
}
