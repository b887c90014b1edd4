//! Path: native/orbit_core/src/motion.rs
//! Summary: プレイヤーの周回運動（角度積分・ダッシュ・回避の自己失効モディファイア）
//!
//! ダッシュ / 回避はキー押下のエッジでのみ発動し、専用のタイマーでだけ解除される。
//! 発動中の再押下は無視する（延長も再始動もしない）。キーを離しても短縮されない。

use std::time::Duration;

use crate::config::{MotionParams, OrbitIntegration};
use crate::constants::MAX_FRAME_DT;
use crate::frame_event::FrameEvent;
use crate::input::Action;
use crate::timer::{FiredTimer, TimerEvent, TimerId, TimerService};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotionState {
    /// ラジアン。正規化しない（三角関数で暗黙に周回する）
    pub angle:        f32,
    pub dash_active:  bool,
    pub dodge_active: bool,
    pub input_left:   bool,
    pub input_right:  bool,
}

pub struct MotionController {
    state:       MotionState,
    params:      MotionParams,
    center:      (f32, f32),
    dash_timer:  Option<TimerId>,
    dodge_timer: Option<TimerId>,
}

impl MotionController {
    pub fn new(params: MotionParams, center: (f32, f32)) -> Self {
        Self {
            state: MotionState::default(),
            params,
            center,
            dash_timer: None,
            dodge_timer: None,
        }
    }

    pub fn state(&self) -> &MotionState {
        &self.state
    }

    pub fn on_key_down<T: TimerService>(
        &mut self,
        action: Action,
        timers: &mut T,
        events: &mut Vec<FrameEvent>,
    ) {
        match action {
            Action::SteerLeft => self.state.input_left = true,
            Action::SteerRight => self.state.input_right = true,
            Action::Dash => {
                if self.state.dash_active {
                    return;
                }
                self.state.dash_active = true;
                self.dash_timer =
                    Some(timers.schedule(self.params.dash_duration(), TimerEvent::DashExpired));
                events.push(FrameEvent::DashStarted);
                log::debug!("dash on at {:?}", timers.now());
            }
            Action::Dodge => {
                if self.state.dodge_active {
                    return;
                }
                self.state.dodge_active = true;
                self.dodge_timer =
                    Some(timers.schedule(self.params.dodge_duration(), TimerEvent::DodgeExpired));
                events.push(FrameEvent::DodgeStarted);
                log::debug!("dodge on at {:?}", timers.now());
            }
        }
    }

    /// ダッシュ / 回避は離しても解除しない
    pub fn on_key_up(&mut self, action: Action) {
        match action {
            Action::SteerLeft => self.state.input_left = false,
            Action::SteerRight => self.state.input_right = false,
            Action::Dash | Action::Dodge => {}
        }
    }

    pub fn release_steering(&mut self) {
        self.state.input_left = false;
        self.state.input_right = false;
    }

    pub fn on_timer(&mut self, fired: &FiredTimer, events: &mut Vec<FrameEvent>) {
        match fired.event {
            TimerEvent::DashExpired => {
                if self.dash_timer != Some(fired.id) {
                    log::warn!("stale dash timer {:?} ignored", fired.id);
                    return;
                }
                self.dash_timer = None;
                self.state.dash_active = false;
                events.push(FrameEvent::DashEnded);
                log::debug!("dash off at {:?}", fired.deadline);
            }
            TimerEvent::DodgeExpired => {
                if self.dodge_timer != Some(fired.id) {
                    log::warn!("stale dodge timer {:?} ignored", fired.id);
                    return;
                }
                self.dodge_timer = None;
                self.state.dodge_active = false;
                events.push(FrameEvent::DodgeEnded);
                log::debug!("dodge off at {:?}", fired.deadline);
            }
            TimerEvent::AttackPhase => {}
        }
    }

    /// 現在の角速度（ダッシュ中は倍率適用）
    pub fn speed(&self) -> f32 {
        if self.state.dash_active {
            self.params.base_speed * self.params.dash_multiplier
        } else {
            self.params.base_speed
        }
    }

    /// 1 フレーム分の角度積分。左右同時押しは相殺される。
    pub fn tick(&mut self, dt: Duration) -> (f32, f32) {
        let step = match self.params.integration {
            OrbitIntegration::PerFrame => self.speed(),
            OrbitIntegration::Elapsed { reference_fps } => {
                self.speed() * dt.min(MAX_FRAME_DT).as_secs_f32() * reference_fps
            }
        };
        let dir = self.state.input_right as i8 - self.state.input_left as i8;
        self.state.angle += step * dir as f32;
        self.position()
    }

    pub fn effective_radius(&self) -> f32 {
        if self.state.dodge_active {
            self.params.orbit_radius + self.params.dodge_distance
        } else {
            self.params.orbit_radius
        }
    }

    pub fn position(&self) -> (f32, f32) {
        let r = self.effective_radius();
        (
            self.center.0 + r * self.state.angle.cos(),
            self.center.1 + r * self.state.angle.sin(),
        )
    }

    /// 保留中のタイマーを取り消し、取り消した数を返す
    pub fn teardown<T: TimerService>(&mut self, timers: &mut T) -> usize {
        [self.dash_timer.take(), self.dodge_timer.take()]
            .into_iter()
            .flatten()
            .filter(|&id| timers.cancel(id))
            .count()
    }

    pub fn pending_timers(&self) -> usize {
        self.dash_timer.is_some() as usize + self.dodge_timer.is_some() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::TimerQueue;

    const FRAME: Duration = Duration::from_nanos(16_666_667);

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn controller() -> MotionController {
        MotionController::new(MotionParams::default(), (200.0, 200.0))
    }

    /// `until` までに期限が来たタイマーを発火させる
    fn fire_until(
        c: &mut MotionController,
        q: &mut TimerQueue,
        until: Duration,
        events: &mut Vec<FrameEvent>,
    ) {
        while let Some(fired) = q.pop_due(until) {
            c.on_timer(&fired, events);
        }
        q.advance_to(until);
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn holding_right_for_20_frames_gives_one_radian() {
        let mut c = controller();
        let mut q = TimerQueue::new();
        let mut ev = Vec::new();
        c.on_key_down(Action::SteerRight, &mut q, &mut ev);
        for _ in 0..20 {
            c.tick(FRAME);
        }
        assert!(approx(c.state().angle, 1.0), "angle={}", c.state().angle);
    }

    #[test]
    fn per_frame_step_ignores_frame_duration() {
        let mut c = controller();
        let mut q = TimerQueue::new();
        let mut ev = Vec::new();
        c.on_key_down(Action::SteerLeft, &mut q, &mut ev);
        c.tick(ms(1));
        c.tick(ms(40));
        assert!(approx(c.state().angle, -0.1));
    }

    #[test]
    fn both_directions_cancel_out() {
        let mut c = controller();
        let mut q = TimerQueue::new();
        let mut ev = Vec::new();
        c.on_key_down(Action::SteerLeft, &mut q, &mut ev);
        c.on_key_down(Action::SteerRight, &mut q, &mut ev);
        for _ in 0..10 {
            c.tick(FRAME);
        }
        assert_eq!(c.state().angle, 0.0);

        c.on_key_up(Action::SteerLeft);
        c.tick(FRAME);
        assert!(approx(c.state().angle, 0.05));
    }

    #[test]
    fn dash_multiplies_speed_until_expiry() {
        let mut c = controller();
        let mut q = TimerQueue::new();
        let mut ev = Vec::new();
        c.on_key_down(Action::SteerRight, &mut q, &mut ev);
        c.on_key_down(Action::Dash, &mut q, &mut ev);
        assert!(approx(c.speed(), 0.15));

        c.tick(FRAME);
        assert!(approx(c.state().angle, 0.15));

        fire_until(&mut c, &mut q, ms(100), &mut ev);
        assert!(!c.state().dash_active);
        c.tick(FRAME);
        assert!(approx(c.state().angle, 0.20));
        assert_eq!(ev, vec![FrameEvent::DashStarted, FrameEvent::DashEnded]);
    }

    #[test]
    fn dash_key_up_does_not_shorten_effect() {
        let mut c = controller();
        let mut q = TimerQueue::new();
        let mut ev = Vec::new();
        c.on_key_down(Action::Dash, &mut q, &mut ev);
        c.on_key_up(Action::Dash);
        fire_until(&mut c, &mut q, ms(99), &mut ev);
        assert!(c.state().dash_active);
        fire_until(&mut c, &mut q, ms(100), &mut ev);
        assert!(!c.state().dash_active);
    }

    #[test]
    fn retrigger_while_active_neither_extends_nor_restarts() {
        let mut c = controller();
        let mut q = TimerQueue::new();
        let mut ev = Vec::new();
        c.on_key_down(Action::Dash, &mut q, &mut ev);
        fire_until(&mut c, &mut q, ms(60), &mut ev);
        c.on_key_down(Action::Dash, &mut q, &mut ev);
        assert_eq!(q.pending_count(), 1);

        fire_until(&mut c, &mut q, ms(100), &mut ev);
        assert!(!c.state().dash_active);
        fire_until(&mut c, &mut q, ms(1_000), &mut ev);
        let ended = ev.iter().filter(|e| **e == FrameEvent::DashEnded).count();
        assert_eq!(ended, 1);
    }

    #[test]
    fn dash_can_be_reactivated_after_expiry() {
        let mut c = controller();
        let mut q = TimerQueue::new();
        let mut ev = Vec::new();
        c.on_key_down(Action::Dash, &mut q, &mut ev);
        fire_until(&mut c, &mut q, ms(150), &mut ev);
        c.on_key_down(Action::Dash, &mut q, &mut ev);
        assert!(c.state().dash_active);
        assert_eq!(q.next_deadline(), Some(ms(250)));
    }

    #[test]
    fn dodge_extends_radius_for_its_duration() {
        let mut c = controller();
        let mut q = TimerQueue::new();
        let mut ev = Vec::new();
        assert_eq!(c.effective_radius(), 100.0);

        c.on_key_down(Action::Dodge, &mut q, &mut ev);
        let (x, y) = c.position();
        assert!(approx(x, 350.0) && approx(y, 200.0));

        fire_until(&mut c, &mut q, ms(120), &mut ev);
        c.on_key_down(Action::Dodge, &mut q, &mut ev);
        assert_eq!(c.effective_radius(), 150.0);

        fire_until(&mut c, &mut q, ms(200), &mut ev);
        assert_eq!(c.effective_radius(), 100.0);
        assert_eq!(ev, vec![FrameEvent::DodgeStarted, FrameEvent::DodgeEnded]);
    }

    #[test]
    fn radius_matches_dodge_flag_at_every_sample() {
        let mut c = controller();
        let mut q = TimerQueue::new();
        let mut ev = Vec::new();
        c.on_key_down(Action::SteerRight, &mut q, &mut ev);
        c.on_key_down(Action::Dodge, &mut q, &mut ev);
        for frame in 0..30u64 {
            fire_until(&mut c, &mut q, ms(frame * 16), &mut ev);
            let (x, y) = c.tick(FRAME);
            let dist = ((x - 200.0).powi(2) + (y - 200.0).powi(2)).sqrt();
            let expected = if c.state().dodge_active { 150.0 } else { 100.0 };
            assert!((dist - expected).abs() < 1e-3, "frame {frame}: {dist} vs {expected}");
        }
    }

    #[test]
    fn elapsed_integration_scales_with_time() {
        let params = MotionParams {
            integration: OrbitIntegration::Elapsed { reference_fps: 60.0 },
            ..MotionParams::default()
        };
        let mut c = MotionController::new(params, (0.0, 0.0));
        let mut q = TimerQueue::new();
        let mut ev = Vec::new();
        c.on_key_down(Action::SteerRight, &mut q, &mut ev);

        // 1/30 秒 = 基準 2 フレーム分
        c.tick(Duration::from_secs_f32(1.0 / 30.0));
        assert!(approx(c.state().angle, 0.1));

        // 大きな dt は MAX_FRAME_DT で頭打ち
        c.tick(Duration::from_secs(2));
        assert!(approx(c.state().angle, 0.1 + 0.05 * 3.0));
    }

    #[test]
    fn stale_timer_is_ignored() {
        let mut c = controller();
        let mut q = TimerQueue::new();
        let mut ev = Vec::new();
        c.on_key_down(Action::Dash, &mut q, &mut ev);
        let bogus = FiredTimer {
            id: q.schedule(ms(5), TimerEvent::DashExpired),
            deadline: ms(5),
            event: TimerEvent::DashExpired,
        };
        c.on_timer(&bogus, &mut ev);
        assert!(c.state().dash_active);
    }

    #[test]
    fn teardown_cancels_pending_modifiers() {
        let mut c = controller();
        let mut q = TimerQueue::new();
        let mut ev = Vec::new();
        c.on_key_down(Action::Dash, &mut q, &mut ev);
        c.on_key_down(Action::Dodge, &mut q, &mut ev);
        assert_eq!(c.pending_timers(), 2);
        assert_eq!(c.teardown(&mut q), 2);
        assert_eq!(q.pending_count(), 0);
        assert_eq!(c.pending_timers(), 0);
    }
}
