//! # Executor Crate
//!
//! Turns an `OrderRequest` into a fill receipt, either against the exchange or
//! against a paper-trading simulation.
//!
//! ## Architectural Principles
//!
//! - **Execution Abstraction:** the engine only sees the `Executor` trait, so it
//!   is agnostic about whether orders reach a live exchange.
//! - **Bounded calls:** a live order call that outlives its timeout is reported
//!   as a failure; it never blocks the caller indefinitely.
//!
//! ## Public API
//!
//! - `Executor`: The core trait for all execution engines.
//! - `LiveExecutor`: sends market orders through an `ApiClient`.
//! - `SimulatedExecutor`: fills every order at the reference price.
//! - `ExecutorError`: The specific error types that can be returned from this crate.

pub mod error;
pub mod exchange;

pub use error::ExecutorError;
pub use exchange::{Executor, LiveExecutor, SimulatedExecutor};
