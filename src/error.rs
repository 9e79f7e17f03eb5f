//! Error handling for the PIR engine.
//!
//! Every fallible operation returns [`PirError`]. All variants are
//! recoverable by the caller; none terminate the process. The
//! [`InternalInvariant`](PirError::InternalInvariant) variant reports
//! configuration/logic defects (conditions that can only arise from a broken
//! invariant, not from bad caller input) and is kept distinct from the
//! caller-input variants so callers can tell the two apart.

use std::fmt;

/// PIR engine error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PirError {
    /// Absent or malformed input: missing database, invalid parameters,
    /// an element too large to fit a single plaintext.
    InvalidArgument(String),
    /// A parameter update tried to change a structural field (polynomial
    /// degree or ciphertext modulus chain). The prior configuration is
    /// left intact.
    IncompatibleParameters(String),
    /// The encoded database needs more plaintexts than the configured
    /// matrix shape provides.
    CapacityExceeded { required: usize, available: usize },
    /// No usable automorphism key is registered for this client.
    MissingKey { client_id: u32 },
    /// The query does not match the configured dimension layout.
    MalformedQuery(String),
    /// An internal consistency check failed. Indicates a configuration or
    /// logic defect rather than bad caller input.
    InternalInvariant(String),
}

impl fmt::Display for PirError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PirError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            PirError::IncompatibleParameters(msg) => {
                write!(f, "incompatible parameters: {}", msg)
            }
            PirError::CapacityExceeded {
                required,
                available,
            } => write!(
                f,
                "database needs {} plaintexts but the matrix holds {}",
                required, available
            ),
            PirError::MissingKey { client_id } => {
                write!(f, "no usable automorphism key for client {}", client_id)
            }
            PirError::MalformedQuery(msg) => write!(f, "malformed query: {}", msg),
            PirError::InternalInvariant(msg) => write!(f, "internal invariant violated: {}", msg),
        }
    }
}

impl std::error::Error for PirError {}

/// Result type for PIR operations.
pub type Result<T> = std::result::Result<T, PirError>;
