//! cube-pir: server engine for multi-dimensional PIR with compressed
//! query expansion.
//!
//! A client fetches one element of a server-held database by index without
//! the server learning which index was requested. The server never decrypts
//! anything: it expands a compressed encrypted query into per-dimension
//! one-hot selection vectors via Galois automorphisms and folds the database
//! matrix against them, one dimension at a time.
//!
//! Key components:
//! - Database encoding: raw bytes packed into plaintext polynomials that
//!   exactly fill the configured d-dimensional matrix
//! - Query expansion: binary expansion by repeated doubling, using
//!   automorphisms and negacyclic shifts
//! - Dimension reduction: frequency-domain multiply-accumulate, with
//!   bit-decomposition re-seeding the next dimension
//!
//! All encryption-scheme arithmetic sits behind the [`Evaluator`] trait;
//! the crate ships a non-encrypting [`CleartextEvaluator`] reference backend
//! for tests and protocol debugging.

pub mod error;
pub mod he;
pub mod params;
pub mod pir;

pub use error::{PirError, Result};
pub use he::{Ciphertext, CleartextEvaluator, Evaluator, GaloisKey, Plaintext};
pub use params::{EncryptionParams, PirParams};
pub use pir::{
    decompose_to_plaintexts, encode_database, expand_query, expansion_ratio, PirQuery, PirReply,
    PirServer,
};
