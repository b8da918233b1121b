//! Animation sink: best-effort parameter pushes.
//!
//! Хост-движок читает `AnimatorParams` и переносит значения в свой animation graph.
//! Неизвестное имя или несовпадающий тип → `false`, без побочных эффектов.

use bevy::prelude::*;

pub const PARAM_SPEED: &str = "speed";
pub const PARAM_PLAYER_IN_SIGHT: &str = "isPlayerInsight";
pub const PARAM_FROZEN: &str = "isFrozen";
pub const PARAM_PLAYER_CATCH: &str = "playerCatch";

/// Capability-checked sink вместо reflection по именам параметров
pub trait AnimationSink {
    fn try_set_float(&mut self, name: &str, value: f32) -> bool;
    fn try_set_bool(&mut self, name: &str, value: bool) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum AnimParam {
    Float(f32),
    Bool(bool),
}

/// Component: объявленные параметры animation graph'а и их текущие значения
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct AnimatorParams {
    params: Vec<(String, AnimParam)>,
}

impl AnimatorParams {
    pub fn with_float(mut self, name: &str) -> Self {
        self.params.push((name.to_string(), AnimParam::Float(0.0)));
        self
    }

    pub fn with_bool(mut self, name: &str) -> Self {
        self.params.push((name.to_string(), AnimParam::Bool(false)));
        self
    }

    /// Полный набор параметров врага
    pub fn enemy() -> Self {
        Self::default()
            .with_float(PARAM_SPEED)
            .with_bool(PARAM_PLAYER_IN_SIGHT)
            .with_bool(PARAM_FROZEN)
            .with_bool(PARAM_PLAYER_CATCH)
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        self.params.iter().find_map(|(n, p)| match p {
            AnimParam::Float(v) if n == name => Some(*v),
            _ => None,
        })
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.params.iter().find_map(|(n, p)| match p {
            AnimParam::Bool(v) if n == name => Some(*v),
            _ => None,
        })
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut AnimParam> {
        self.params.iter_mut().find(|(n, _)| n == name).map(|(_, p)| p)
    }
}

impl AnimationSink for AnimatorParams {
    fn try_set_float(&mut self, name: &str, value: f32) -> bool {
        match self.slot_mut(name) {
            Some(AnimParam::Float(v)) => {
                *v = value;
                true
            }
            _ => false,
        }
    }

    fn try_set_bool(&mut self, name: &str, value: bool) -> bool {
        match self.slot_mut(name) {
            Some(AnimParam::Bool(v)) => {
                *v = value;
                true
            }
            _ => false,
        }
    }
}
