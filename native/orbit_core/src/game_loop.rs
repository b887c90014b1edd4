//! Path: native/orbit_core/src/game_loop.rs
//! Summary: 固定レートのゲームループスレッド（入力チャネル・pause/resume/stop・描画シンク）
//!
//! ループスレッドが Encounter を単独で所有する。ホスト側とは入力チャネルと
//! GameLoopControl、RenderSink だけでやり取りする。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use crate::clock::Clock;
use crate::constants::FRAME_BUDGET;
use crate::encounter::Encounter;
use crate::frame_event::FrameEvent;
use crate::render_frame::RenderFrame;

/// GameLoop 制御用（pause/resume/stop）
pub struct GameLoopControl {
    paused:  AtomicBool,
    stopped: AtomicBool,
}

impl GameLoopControl {
    pub fn new() -> Self {
        Self {
            paused:  AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        }
    }
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl Default for GameLoopControl {
    fn default() -> Self {
        Self::new()
    }
}

/// ホストからループへ送る入力
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(String),
    KeyUp(String),
    FocusLost,
}

pub trait RenderSink: Send + 'static {
    fn present(&mut self, frame: &RenderFrame, events: &[FrameEvent]);
}

/// 最新フレームを RwLock 越しに公開するシンク。描画スレッドは `latest()` で読む。
#[derive(Clone, Default)]
pub struct SharedFrame(Arc<RwLock<RenderFrame>>);

impl SharedFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> RenderFrame {
        match self.0.read() {
            Ok(guard) => guard.clone(),
            Err(e) => {
                log::error!("shared frame: read lock poisoned: {e:?}");
                e.into_inner().clone()
            }
        }
    }
}

impl RenderSink for SharedFrame {
    fn present(&mut self, frame: &RenderFrame, _events: &[FrameEvent]) {
        match self.0.write() {
            Ok(mut guard) => *guard = frame.clone(),
            Err(e) => log::error!("shared frame: write lock poisoned: {e:?}"),
        }
    }
}

/// `tick` 間隔でフレームを回す。stop されるか入力チャネルが切断されたら
/// Encounter をシャットダウンして返す。
///
/// pause 中はフレームを回さず、止まっていた実時間を時刻から差し引く
/// （再開時にタイマーがまとめて発火しない）。
pub fn run_game_loop<C: Clock, S: RenderSink>(
    mut encounter: Encounter,
    clock: C,
    control: Arc<GameLoopControl>,
    input: Receiver<InputEvent>,
    mut sink: S,
    tick: Duration,
) -> Encounter {
    log::info!("game loop started (tick={:?})", tick);
    let mut next_tick = Instant::now();
    let mut paused_total = Duration::ZERO;
    let mut paused_since: Option<Duration> = None;

    'main: loop {
        next_tick += tick;
        let now = Instant::now();
        if next_tick > now {
            thread::sleep(next_tick - now);
        } else {
            // 大きく遅れたら追いつこうとせず基準を取り直す
            next_tick = now;
        }

        if control.is_stopped() {
            break;
        }

        let wall = clock.now();
        if control.is_paused() {
            paused_since.get_or_insert(wall);
            continue;
        }
        if let Some(since) = paused_since.take() {
            paused_total += wall.saturating_sub(since);
            log::debug!("game loop resumed (paused {:?} total)", paused_total);
        }
        let game_now = wall.saturating_sub(paused_total);

        loop {
            match input.try_recv() {
                Ok(InputEvent::KeyDown(key)) => encounter.key_down(&key, game_now),
                Ok(InputEvent::KeyUp(key)) => encounter.key_up(&key, game_now),
                Ok(InputEvent::FocusLost) => encounter.release_steering(game_now),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::info!("input channel closed, stopping game loop");
                    break 'main;
                }
            }
        }

        let started = Instant::now();
        let frame = encounter.frame(game_now);
        let events = encounter.drain_frame_events();
        sink.present(&frame, &events);

        let spent = started.elapsed();
        if spent > FRAME_BUDGET {
            log::warn!("frame budget exceeded: {:?} (frame {})", spent, frame.frame_id);
        }
    }

    encounter.shutdown();
    log::info!("game loop stopped");
    encounter
}
