//! ECS Components для акторов уровня
//!
//! Организация по доменам:
//! - player: наблюдаемый игрок (камера, control lock, фонарик)
//! - enemy: враг (marker, spawn, concealment)
//! - animation: animation sink (best-effort параметры)

pub mod animation;
pub mod enemy;
pub mod player;

// Re-exports для удобного импорта
pub use animation::*;
pub use enemy::*;
pub use player::*;
