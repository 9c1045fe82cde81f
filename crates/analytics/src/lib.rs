//! # Stocklens Statistics Engine
//!
//! Descriptive statistics and Pearson correlation over fetched price series.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** no I/O and no knowledge of where the samples came from.
//!   It depends only on `core-types`.
//! - **Explicit edge-case policy:** an empty series has an average and a
//!   standard deviation of `0`, and a constant series correlates at `0`.
//!   Everything else that cannot be computed is an `AnalyticsError`.
//!
//! ## Public API
//!
//! - `StatisticsEngine`: average, standard deviation, correlation, matrix.
//! - `SeriesStats`, `TickerSummary`, `CorrelationReport`, `CorrelationMatrix`:
//!   the result types handed to callers.
//! - `AnalyticsError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use engine::StatisticsEngine;
pub use error::AnalyticsError;
pub use report::{CorrelationMatrix, CorrelationReport, SeriesStats, TickerStats, TickerSummary};
