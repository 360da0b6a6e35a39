//! pharmaguard-common — Shared types and errors used across all PharmaGuard crates.

pub mod error;
pub mod entities;
pub mod report;

// Re-export commonly used types
pub use error::{PharmaGuardError, Result};
pub use entities::{FunctionalEffect, Gene, Phenotype, RiskLabel, Severity, Urgency};
