//! Path: native/orbit_core/src/frame_event.rs
//! Summary: フレーム内で発生したイベント（ホストが毎フレーム drain する）

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameEvent {
    DashStarted,
    DashEnded,
    DodgeStarted,
    DodgeEnded,
    /// Idle → Blinking（予備動作開始）
    TelegraphStarted,
    BlinkToggled { on: bool },
    /// Blinking → Attacking。aim_angle はこの瞬間に確定する
    StrikeStarted { aim_angle: f32 },
    /// Attacking → Idle
    StrikeEnded,
}
