//! AI components

pub mod eviction;
pub mod fsm;


// Re-export all components
pub use eviction::*;
pub use fsm::*;
