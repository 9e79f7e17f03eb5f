//! The homomorphic-evaluation seam.
//!
//! The PIR engine performs no encryption-scheme arithmetic of its own; every
//! homomorphic operation goes through this trait. A production deployment
//! implements it over a real HE library; the crate ships
//! [`CleartextEvaluator`](super::CleartextEvaluator) as a non-encrypting
//! reference implementation for tests and protocol debugging.

use crate::error::Result;

use super::types::{Ciphertext, GaloisKey, Plaintext};

/// Homomorphic operations the engine consumes.
///
/// Implementations must honor the domain tags on [`Ciphertext`] and
/// [`Plaintext`]: frequency-domain operations reject time-domain inputs and
/// vice versa, reporting an internal-invariant error rather than computing
/// garbage.
pub trait Evaluator {
    /// Encode raw coefficients (values below the plaintext modulus) into a
    /// time-domain plaintext.
    fn encode(&self, coeffs: Vec<u64>) -> Result<Plaintext>;

    /// Homomorphic addition. Both inputs must share a domain.
    fn add(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext>;

    /// Ciphertext × plaintext multiplication in the frequency domain.
    fn multiply_plain_ntt(&self, ct: &Ciphertext, pt: &Plaintext) -> Result<Ciphertext>;

    /// Apply the Galois automorphism X ↦ X^`galois_elt` using `key`.
    /// Time domain only.
    fn apply_galois(&self, ct: &Ciphertext, galois_elt: usize, key: &GaloisKey)
        -> Result<Ciphertext>;

    /// Multiply by X^`shift` (negacyclic coefficient rotation: wrapping past
    /// degree N flips the sign). Time domain only.
    fn multiply_power_of_x(&self, ct: &Ciphertext, shift: usize) -> Result<Ciphertext>;

    /// Transform a ciphertext into the frequency domain, in place.
    fn transform_to_ntt(&self, ct: &mut Ciphertext) -> Result<()>;

    /// Transform a ciphertext out of the frequency domain, in place.
    fn transform_from_ntt(&self, ct: &mut Ciphertext) -> Result<()>;

    /// Transform a plaintext into the frequency domain, in place.
    fn transform_plain_to_ntt(&self, pt: &mut Plaintext) -> Result<()>;
}
