//! Path: native/orbit_window/src/lib.rs
//! Summary: winit ホスト（キー入力をゲームループへ転送・最新フレームの受け取り）
//!
//! 描画そのものは範囲外。ウィンドウは入力源と表示リフレッシュの役だけを担い、
//! 攻撃段階をタイトルに出してスナップショットを trace ログに流す。

use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use orbit_core::constants::TICK;
use orbit_core::{
    run_game_loop, AttackStage, Encounter, EncounterConfig, GameLoopControl, InputEvent,
    MonotonicClock, SharedFrame,
};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

/// ループ側のキー割り当てとは別に、ウィンドウ側で処理する一時停止キー
const PAUSE_KEY: KeyCode = KeyCode::KeyP;

pub struct WindowOptions {
    pub title:  String,
    pub width:  u32,
    pub height: u32,
    pub tick:   Duration,
}

impl WindowOptions {
    pub fn for_config(config: &EncounterConfig) -> Self {
        Self {
            title:  "Orbit Arena".to_string(),
            width:  config.world.width.ceil() as u32,
            height: config.world.height.ceil() as u32,
            tick:   TICK,
        }
    }
}

/// winit の KeyCode をキー割り当て表の ID（Debug 名）に変換する
pub fn key_name(code: KeyCode) -> String {
    format!("{code:?}")
}

/// キーイベントをループ入力に変換する。OS のキーリピートは捨てる。
pub fn input_event(code: KeyCode, state: ElementState, repeat: bool) -> Option<InputEvent> {
    if repeat {
        return None;
    }
    let key = key_name(code);
    Some(match state {
        ElementState::Pressed => InputEvent::KeyDown(key),
        ElementState::Released => InputEvent::KeyUp(key),
    })
}

/// 再描画要求をループの tick 間隔に間引く。描画面を持たないので vsync による待ちが無い。
#[derive(Debug, Clone, Copy)]
pub struct RedrawPacer {
    interval: Duration,
    next:     Instant,
}

impl RedrawPacer {
    pub fn new(interval: Duration, start: Instant) -> Self {
        Self { interval, next: start }
    }

    /// 期限に達していれば次の期限を設定して true
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next {
            return false;
        }
        // 遅れた分はまとめず、now を基準に取り直す
        self.next = now + self.interval;
        true
    }

    pub fn next_deadline(&self) -> Instant {
        self.next
    }
}

pub fn run_window(config: EncounterConfig, options: WindowOptions) -> Result<(), String> {
    let encounter = Encounter::new(config).map_err(|e| format!("invalid encounter config: {e}"))?;
    let event_loop = EventLoop::new().map_err(|e| format!("event loop create failed: {e}"))?;

    let control = Arc::new(GameLoopControl::new());
    let frames = SharedFrame::new();
    let (tx, rx) = mpsc::channel();

    let loop_thread = {
        let control = control.clone();
        let frames = frames.clone();
        let tick = options.tick;
        thread::Builder::new()
            .name("orbit-game-loop".to_string())
            .spawn(move || run_game_loop(encounter, MonotonicClock::new(), control, rx, frames, tick))
            .map_err(|e| format!("game loop thread spawn failed: {e}"))?
    };

    let mut app = WindowApp::new(options, tx, control.clone(), frames);
    let result = event_loop
        .run_app(&mut app)
        .map_err(|e| format!("event loop runtime failed: {e}"));

    control.stop();
    drop(app);
    match loop_thread.join() {
        Ok(encounter) => log::info!("game loop joined after {} frames", encounter.frame_id()),
        Err(_) => log::error!("game loop thread panicked"),
    }
    result
}

struct WindowApp {
    options:    WindowOptions,
    window:     Option<Arc<Window>>,
    input:      Sender<InputEvent>,
    control:    Arc<GameLoopControl>,
    frames:     SharedFrame,
    last_stage: Option<AttackStage>,
    last_frame: u64,
    pacer:      RedrawPacer,
}

impl WindowApp {
    fn new(
        options: WindowOptions,
        input: Sender<InputEvent>,
        control: Arc<GameLoopControl>,
        frames: SharedFrame,
    ) -> Self {
        let pacer = RedrawPacer::new(options.tick, Instant::now());
        Self {
            options,
            window: None,
            input,
            control,
            frames,
            last_stage: None,
            last_frame: 0,
            pacer,
        }
    }

    /// ループが終了していれば false
    fn send(&self, event: InputEvent) -> bool {
        if self.input.send(event).is_err() {
            log::error!("game loop is gone, closing window");
            return false;
        }
        true
    }

    fn toggle_pause(&self) {
        if self.control.is_paused() {
            self.control.resume();
            log::info!("resumed");
        } else {
            self.control.pause();
            log::info!("paused");
        }
    }
}

impl ApplicationHandler for WindowApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(self.options.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(self.options.width, self.options.height));
        match event_loop.create_window(attrs) {
            Ok(window) => {
                let window = Arc::new(window);
                window.request_redraw();
                self.window = Some(window);
            }
            Err(e) => {
                log::error!("window creation failed: {e}");
                self.control.stop();
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.control.stop();
                event_loop.exit();
            }
            WindowEvent::Focused(false) => {
                if !self.send(InputEvent::FocusLost) {
                    event_loop.exit();
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                if code == PAUSE_KEY {
                    if event.state == ElementState::Pressed && !event.repeat {
                        self.toggle_pause();
                    }
                    return;
                }
                if let Some(input) = input_event(code, event.state, event.repeat) {
                    if !self.send(input) {
                        event_loop.exit();
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                let Some(window) = self.window.as_ref() else {
                    return;
                };
                let frame = self.frames.latest();
                if frame.frame_id == self.last_frame {
                    return;
                }
                self.last_frame = frame.frame_id;
                if self.last_stage != Some(frame.attack_stage) {
                    self.last_stage = Some(frame.attack_stage);
                    window.set_title(&format!("{} | {:?}", self.options.title, frame.attack_stage));
                }
                log::trace!(
                    "present frame {}: player=({:.1}, {:.1}) dash={} dodge={} blink={} segments={}",
                    frame.frame_id,
                    frame.player_position.0,
                    frame.player_position.1,
                    frame.dash_active,
                    frame.dodge_active,
                    frame.blink_on,
                    frame.segment_positions.len()
                );
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        if self.pacer.poll(Instant::now()) {
            window.request_redraw();
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.pacer.next_deadline()));
    }
}
