//! Homomorphic-encryption backend seam.
//!
//! The engine treats the encryption scheme as an external collaborator: key
//! generation, encryption, decryption, and the transform kernels live behind
//! the [`Evaluator`] trait, and the engine only moves [`Plaintext`] and
//! [`Ciphertext`] values through it. [`CleartextEvaluator`] is the crate's
//! own non-encrypting reference implementation, used by the test suite.

mod cleartext;
mod evaluator;
mod types;

pub use cleartext::CleartextEvaluator;
pub use evaluator::Evaluator;
pub use types::{Ciphertext, GaloisKey, Plaintext, CIPHERTEXT_SIZE};
