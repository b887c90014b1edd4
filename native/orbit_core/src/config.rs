//! Path: native/orbit_core/src/config.rs
//! Summary: エンカウンター設定（ワールド寸法・移動パラメータ・攻撃タイミング・キー割り当て）
//!
//! すべてのフィールドは `#[serde(default)]` なので、ホストは一部だけを指定した
//! JSON/TOML を渡せば残りはデフォルト定数で埋まる。

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::ConfigError;
use crate::input::KeyBindings;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    pub world:    WorldParams,
    pub motion:   MotionParams,
    pub attack:   AttackParams,
    pub bindings: KeyBindings,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldParams {
    pub width:       f32,
    pub height:      f32,
    pub boss_size:   f32,
    pub player_size: f32,
}

impl Default for WorldParams {
    fn default() -> Self {
        Self {
            width:       WORLD_WIDTH,
            height:      WORLD_HEIGHT,
            boss_size:   BOSS_SIZE,
            player_size: PLAYER_SIZE,
        }
    }
}

impl WorldParams {
    /// ボス（= 周回中心）の座標。ワールド中央に固定。
    pub fn boss_center(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }
}

/// 角度積分の方式
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum OrbitIntegration {
    /// 1 tick ごとに `speed` を加算（表示リフレッシュレートに依存）
    #[default]
    PerFrame,
    /// `speed * dt * reference_fps` を加算（reference_fps で PerFrame と一致）
    Elapsed { reference_fps: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionParams {
    pub orbit_radius:      f32,
    pub base_speed:        f32,
    pub dash_multiplier:   f32,
    pub dash_duration_ms:  u64,
    pub dodge_distance:    f32,
    pub dodge_duration_ms: u64,
    pub integration:       OrbitIntegration,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            orbit_radius:      ORBIT_RADIUS,
            base_speed:        BASE_SPEED,
            dash_multiplier:   DASH_MULTIPLIER,
            dash_duration_ms:  DASH_DURATION_MS,
            dodge_distance:    DODGE_DISTANCE,
            dodge_duration_ms: DODGE_DURATION_MS,
            integration:       OrbitIntegration::PerFrame,
        }
    }
}

impl MotionParams {
    pub fn dash_duration(&self) -> Duration {
        Duration::from_millis(self.dash_duration_ms)
    }

    pub fn dodge_duration(&self) -> Duration {
        Duration::from_millis(self.dodge_duration_ms)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackParams {
    /// 攻撃終了（と開始直後）から次の予備動作までの待機
    pub attack_interval_ms:  u64,
    /// 待機明けから点滅開始までの遅延
    pub pre_attack_delay_ms: u64,
    pub blink_interval_ms:   u64,
    /// 点滅回数（ON/OFF で 1 回）
    pub total_blinks:        u32,
    pub attack_duration_ms:  u64,
    pub arm_segments:        usize,
    pub segment_size:        f32,
    pub attack_offset:       f32,
}

impl Default for AttackParams {
    fn default() -> Self {
        Self {
            attack_interval_ms:  ATTACK_INTERVAL_MS,
            pre_attack_delay_ms: PRE_ATTACK_DELAY_MS,
            blink_interval_ms:   BLINK_INTERVAL_MS,
            total_blinks:        TOTAL_BLINKS,
            attack_duration_ms:  ATTACK_DURATION_MS,
            arm_segments:        ARM_SEGMENTS,
            segment_size:        SEGMENT_SIZE,
            attack_offset:       ATTACK_OFFSET,
        }
    }
}

impl AttackParams {
    pub fn attack_interval(&self) -> Duration {
        Duration::from_millis(self.attack_interval_ms)
    }

    pub fn pre_attack_delay(&self) -> Duration {
        Duration::from_millis(self.pre_attack_delay_ms)
    }

    pub fn blink_interval(&self) -> Duration {
        Duration::from_millis(self.blink_interval_ms)
    }

    pub fn attack_duration(&self) -> Duration {
        Duration::from_millis(self.attack_duration_ms)
    }

    /// 点滅フェーズ中のトグル総数
    pub fn total_toggles(&self) -> u32 {
        self.total_blinks.saturating_mul(2)
    }

    /// Idle 開始から次の Idle 開始までの 1 サイクル長。溢れる場合は Duration::MAX。
    pub fn cycle_period(&self) -> Duration {
        self.blink_interval()
            .checked_mul(self.total_toggles())
            .and_then(|blinks| blinks.checked_add(self.attack_interval()))
            .and_then(|d| d.checked_add(self.pre_attack_delay()))
            .and_then(|d| d.checked_add(self.attack_duration()))
            .unwrap_or(Duration::MAX)
    }
}

impl EncounterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.world;
        for (field, value) in [
            ("width", w.width),
            ("height", w.height),
            ("boss_size", w.boss_size),
            ("player_size", w.player_size),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidWorldDimension { field, value });
            }
        }

        let m = &self.motion;
        if !(m.orbit_radius.is_finite() && m.orbit_radius > 0.0) {
            return Err(ConfigError::InvalidOrbitRadius(m.orbit_radius));
        }
        for (field, value) in [
            ("base_speed", m.base_speed),
            ("dash_multiplier", m.dash_multiplier),
            ("dodge_distance", m.dodge_distance),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidMotionValue { field, value });
            }
        }
        for (field, value) in [
            ("motion.dash_duration_ms", m.dash_duration_ms),
            ("motion.dodge_duration_ms", m.dodge_duration_ms),
        ] {
            check_timing(field, value)?;
        }
        if let OrbitIntegration::Elapsed { reference_fps } = m.integration {
            if !(reference_fps.is_finite() && reference_fps > 0.0) {
                return Err(ConfigError::InvalidReferenceFps(reference_fps));
            }
        }

        let a = &self.attack;
        if a.blink_interval_ms == 0 {
            return Err(ConfigError::ZeroAttackTiming { field: "blink_interval_ms" });
        }
        if a.total_blinks == 0 {
            return Err(ConfigError::ZeroAttackTiming { field: "total_blinks" });
        }
        if a.attack_duration_ms == 0 {
            return Err(ConfigError::ZeroAttackTiming { field: "attack_duration_ms" });
        }
        for (field, value) in [
            ("attack.attack_interval_ms", a.attack_interval_ms),
            ("attack.pre_attack_delay_ms", a.pre_attack_delay_ms),
            ("attack.blink_interval_ms", a.blink_interval_ms),
            ("attack.attack_duration_ms", a.attack_duration_ms),
        ] {
            check_timing(field, value)?;
        }
        if a.total_blinks > MAX_TOTAL_BLINKS {
            return Err(ConfigError::TimingOutOfRange {
                field: "attack.total_blinks",
                value: a.total_blinks as u64,
                max:   MAX_TOTAL_BLINKS as u64,
            });
        }
        for (field, value) in [
            ("segment_size", a.segment_size),
            ("attack_offset", a.attack_offset),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidSegmentGeometry { field, value });
            }
        }
        Ok(())
    }
}

fn check_timing(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value > MAX_TIMING_MS {
        return Err(ConfigError::TimingOutOfRange { field, value, max: MAX_TIMING_MS });
    }
    Ok(())
}
