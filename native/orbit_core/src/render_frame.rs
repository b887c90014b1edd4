//! Path: native/orbit_core/src/render_frame.rs
//! Summary: 描画側へ渡す 1 フレーム分のスナップショット
//!
//! 座標はすべてワールド座標の箱の中心。描画方法はコアの関知するところではない。

use std::time::Duration;

use serde::Serialize;

use crate::attack::AttackStage;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RenderFrame {
    pub frame_id:          u64,
    pub elapsed:           Duration,
    pub boss_position:     (f32, f32),
    pub player_position:   (f32, f32),
    pub dash_active:       bool,
    pub dodge_active:      bool,
    pub blink_on:          bool,
    pub attack_stage:      AttackStage,
    pub attack_progress:   f32,
    pub aim_angle:         f32,
    pub segment_size:      f32,
    /// Blinking（プレビュー）と Attacking のときだけ要素を持つ
    pub segment_positions: Vec<(f32, f32)>,
}

impl RenderFrame {
    /// ボス中心からプレイヤーまでの距離
    pub fn player_distance(&self) -> f32 {
        let dx = self.player_position.0 - self.boss_position.0;
        let dy = self.player_position.1 - self.boss_position.1;
        (dx * dx + dy * dy).sqrt()
    }
}
