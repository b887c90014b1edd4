//! Path: native/orbit_core/src/error.rs
//! Summary: 設定検証エラー

use thiserror::Error;

/// `EncounterConfig::validate` が返すエラー。
/// タイミング不変条件を壊す値だけを拒否する（実行時のドメイン操作は常に成功する）。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("world.{field} must be positive and finite, got {value}")]
    InvalidWorldDimension { field: &'static str, value: f32 },

    #[error("motion.orbit_radius must be positive and finite, got {0}")]
    InvalidOrbitRadius(f32),

    #[error("motion.{field} must be finite and non-negative, got {value}")]
    InvalidMotionValue { field: &'static str, value: f32 },

    #[error("motion.integration.reference_fps must be positive and finite, got {0}")]
    InvalidReferenceFps(f32),

    #[error("attack.{field} must be greater than zero")]
    ZeroAttackTiming { field: &'static str },

    #[error("{field} must be at most {max}, got {value}")]
    TimingOutOfRange { field: &'static str, value: u64, max: u64 },

    #[error("attack.{field} must be finite and non-negative, got {value}")]
    InvalidSegmentGeometry { field: &'static str, value: f32 },
}
