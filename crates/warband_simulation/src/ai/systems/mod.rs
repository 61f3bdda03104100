//! AI systems (perception → decision → execution)

pub mod attack;
pub mod fsm;
pub mod movement;
pub mod perception;
pub mod reactions;

#[cfg(test)]
mod movement_tests;

pub use attack::*;
pub use fsm::*;
pub use movement::*;
pub use perception::*;
pub use reactions::*;
