//! # Database Crate
//!
//! The trade store: the system's permanent record of every position it has
//! opened and closed, and the source the engine rehydrates from at start-up.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** all storage details live here. The rest of the application
//!   sees the `TradeRepository` trait and nothing else.
//! - **Asynchronous:** file I/O runs on Tokio's blocking pool so a slow disk
//!   never stalls the polling tasks.
//!
//! ## Public API
//!
//! - `TradeRepository`: record, update and load trades.
//! - `CsvTradeRepository`: the CSV-file implementation.
//! - `DbError`: The specific error types that can be returned from this crate.

pub mod error;
pub mod repository;

pub use error::DbError;
pub use repository::{CsvTradeRepository, TradeRepository};
