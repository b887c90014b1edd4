//! Path: native/orbit_core/src/lib.rs
//! Summary: 周回アリーナのタイミングコア（周回運動・ボス攻撃ステートマシン・フレームループ）

pub mod attack;
pub mod clock;
pub mod config;
pub mod constants;
pub mod encounter;
pub mod error;
pub mod frame_event;
pub mod game_loop;
pub mod input;
pub mod motion;
pub mod render_frame;
pub mod timer;

pub use attack::{AttackDirector, AttackStage, AttackState};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{AttackParams, EncounterConfig, MotionParams, OrbitIntegration, WorldParams};
pub use encounter::Encounter;
pub use error::ConfigError;
pub use frame_event::FrameEvent;
pub use game_loop::{run_game_loop, GameLoopControl, InputEvent, RenderSink, SharedFrame};
pub use input::{Action, KeyBindings};
pub use motion::{MotionController, MotionState};
pub use render_frame::RenderFrame;
pub use timer::{FiredTimer, TimerEvent, TimerId, TimerQueue, TimerService};
