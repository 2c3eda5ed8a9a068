//! # Engine Crate
//!
//! The stateful heart of the bot. `PositionManager` owns every symbol's
//! rolling market state and its open trade, and `Scheduler` drives it on
//! timers.
//!
//! Each symbol sits behind its own async lock, held across the whole
//! open/close transition including the awaited order call, so two overlapping
//! ticks for one symbol can never both pass admission control.

pub mod error;
pub mod manager;
pub mod scheduler;
pub mod state;

pub use error::EngineError;
pub use manager::{EngineParts, PositionManager};
pub use scheduler::Scheduler;
pub use state::TradingPairState;
