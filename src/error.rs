//! Error types for LatticeKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using LatticeError
pub type Result<T> = std::result::Result<T, LatticeError>;

/// Unified error type for LatticeKV operations
#[derive(Debug, Error)]
pub enum LatticeError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Schema Errors
    // -------------------------------------------------------------------------
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    // -------------------------------------------------------------------------
    // Collection Errors
    // -------------------------------------------------------------------------
    /// Probing wrapped the whole bucket table without finding a slot.
    /// Unreachable while the load-factor growth policy holds.
    #[error("Collection index full: growth invariant violated")]
    CollectionFull,

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Concurrency Errors
    // -------------------------------------------------------------------------
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}
