//! Path: native/orbit_core/src/input.rs
//! Summary: 論理アクション（左右旋回・ダッシュ・回避）と生キー ID からの対応表

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// コアが認識する 4 つの論理アクション
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    SteerLeft,
    SteerRight,
    Dash,
    Dodge,
}

/// 生キー ID（winit `KeyCode` の Debug 名）→ 論理アクション
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyBindings {
    map: FxHashMap<String, Action>,
}

impl KeyBindings {
    pub fn empty() -> Self {
        Self { map: FxHashMap::default() }
    }

    /// 既存の割り当ては上書きされる
    pub fn bind(&mut self, key: impl Into<String>, action: Action) -> &mut Self {
        self.map.insert(key.into(), action);
        self
    }

    pub fn unbind(&mut self, key: &str) -> Option<Action> {
        self.map.remove(key)
    }

    /// 未登録のキーは None（呼び出し側で無視する）
    pub fn resolve(&self, key: &str) -> Option<Action> {
        self.map.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut b = Self::empty();
        b.bind("ArrowLeft", Action::SteerLeft)
            .bind("ArrowRight", Action::SteerRight)
            .bind("Space", Action::Dash)
            .bind("ControlLeft", Action::Dodge)
            .bind("ControlRight", Action::Dodge);
        b
    }
}
