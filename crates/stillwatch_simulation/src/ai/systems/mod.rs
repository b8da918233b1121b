//! AI systems (perception → decision → movement)

pub mod animation;
pub mod eviction;
pub mod fsm;
pub mod movement;
pub mod perception;
pub mod reactions;
pub mod steering;

// Re-export all systems
pub use animation::*;
pub use eviction::*;
pub use fsm::*;
pub use movement::*;
pub use perception::*;
pub use reactions::*;
pub use steering::*;
