//! Database-backed repository implementations.

#[cfg(feature = "seaorm")]
pub mod seaorm;
