//! Path: native/orbit_core/src/constants.rs
//! Summary: ワールド寸法・移動・攻撃タイミングのデフォルト定数

use std::time::Duration;

// World (px)
pub const WORLD_WIDTH:  f32 = 400.0;
pub const WORLD_HEIGHT: f32 = 400.0;
pub const BOSS_SIZE:    f32 = 50.0;
pub const PLAYER_SIZE:  f32 = 50.0;

// Orbit
pub const ORBIT_RADIUS: f32 = 100.0;
/// 1 フレームあたりの角速度（rad）
pub const BASE_SPEED:   f32 = 0.05;

// Dash: 角速度の一時倍率
pub const DASH_MULTIPLIER:  f32 = 3.0;
pub const DASH_DURATION_MS: u64 = 100;

// Dodge: 軌道半径の一時延長
pub const DODGE_DISTANCE:    f32 = 50.0;
pub const DODGE_DURATION_MS: u64 = 200;

// Boss attack cycle
pub const ATTACK_INTERVAL_MS:  u64 = 3_000;
pub const PRE_ATTACK_DELAY_MS: u64 = 1_000;
pub const BLINK_INTERVAL_MS:   u64 = 600;
pub const TOTAL_BLINKS:        u32 = 2;
pub const ATTACK_DURATION_MS:  u64 = 300;

// 設定で受け付けるタイミングの上限（タイマー期限の加算が溢れない範囲）
pub const MAX_TIMING_MS:   u64 = 3_600_000;
pub const MAX_TOTAL_BLINKS: u32 = 10_000;

// Arm segments
pub const ARM_SEGMENTS:  usize = 5;
pub const SEGMENT_SIZE:  f32 = 20.0;
pub const ATTACK_OFFSET: f32 = 40.0;

/// Elapsed 積分時の基準フレームレート
pub const REFERENCE_FPS: f32 = 60.0;

/// Elapsed 積分で 1 フレームに許す最大 dt（ウィンドウ復帰直後などの大ジャンプ対策）
pub const MAX_FRAME_DT: Duration = Duration::from_millis(50);

/// ゲームループの 1 tick
pub const TICK: Duration = Duration::from_nanos(1_000_000_000 / 60);

/// 1 フレームの処理予算（超過時に warn）
pub const FRAME_BUDGET: Duration = Duration::from_millis(4);
