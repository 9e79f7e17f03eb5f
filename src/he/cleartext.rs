//! Cleartext reference backend.
//!
//! Models "encryption" as the identity map: a ciphertext carries the message
//! polynomial in its first component and zeros in its second, and every
//! homomorphic operation is the corresponding exact negacyclic polynomial
//! operation mod each chain modulus. Frequency-domain transforms only flip
//! the domain tag — with exact arithmetic the evaluation basis is
//! irrelevant, so the tag is pure bookkeeping here.
//!
//! This backend implements no cryptography. It exists so the protocol
//! engine can be exercised end-to-end (expansion, reduction, decomposition)
//! and decoded with ordinary integer arithmetic, and it doubles as
//! executable documentation of the [`Evaluator`] contract.

use crate::error::{PirError, Result};
use crate::params::EncryptionParams;

use super::evaluator::Evaluator;
use super::types::{Ciphertext, GaloisKey, Plaintext, CIPHERTEXT_SIZE};

/// Non-encrypting [`Evaluator`] over exact negacyclic arithmetic.
#[derive(Clone, Debug)]
pub struct CleartextEvaluator {
    degree: usize,
    moduli: Vec<u64>,
}

impl CleartextEvaluator {
    /// Build an evaluator from the structural encryption parameters.
    pub fn new(params: &EncryptionParams) -> Self {
        Self {
            degree: params.poly_degree,
            moduli: params.coeff_modulus.clone(),
        }
    }

    /// "Encrypt" a time-domain plaintext: the message polynomial becomes the
    /// first component, the second component is zero.
    pub fn encrypt(&self, pt: &Plaintext) -> Ciphertext {
        debug_assert!(!pt.is_ntt_form());
        let n = self.degree;
        let mut first = Vec::with_capacity(self.moduli.len() * n);
        for &q in &self.moduli {
            first.extend(pt.data().iter().map(|&c| c % q));
        }
        let second = vec![0u64; self.moduli.len() * n];
        let mut components = Vec::with_capacity(CIPHERTEXT_SIZE);
        components.push(first);
        components.push(second);
        Ciphertext::new(components, false)
    }

    /// "Decrypt" a time-domain ciphertext: read the message back from the
    /// first component under the first chain modulus.
    pub fn decrypt(&self, ct: &Ciphertext) -> Vec<u64> {
        debug_assert!(!ct.is_ntt_form());
        ct.components()[0][..self.degree].to_vec()
    }

    fn check_shape(&self, ct: &Ciphertext) -> Result<()> {
        let expected = self.moduli.len() * self.degree;
        if ct.components().iter().any(|c| c.len() != expected) {
            return Err(PirError::InternalInvariant(format!(
                "ciphertext component length does not match {} residues of degree {}",
                self.moduli.len(),
                self.degree
            )));
        }
        Ok(())
    }

    fn require_time_domain(ct: &Ciphertext, op: &str) -> Result<()> {
        if ct.is_ntt_form() {
            return Err(PirError::InternalInvariant(format!(
                "{} requires a time-domain ciphertext",
                op
            )));
        }
        Ok(())
    }
}

impl Evaluator for CleartextEvaluator {
    fn encode(&self, coeffs: Vec<u64>) -> Result<Plaintext> {
        if coeffs.len() != self.degree {
            return Err(PirError::InvalidArgument(format!(
                "expected {} coefficients, got {}",
                self.degree,
                coeffs.len()
            )));
        }
        Ok(Plaintext::new(coeffs))
    }

    fn add(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext> {
        if a.is_ntt_form() != b.is_ntt_form() || a.size() != b.size() {
            return Err(PirError::InternalInvariant(
                "addition of mismatched ciphertexts".into(),
            ));
        }
        self.check_shape(a)?;
        self.check_shape(b)?;
        let n = self.degree;
        let components = a
            .components()
            .iter()
            .zip(b.components())
            .map(|(ca, cb)| {
                let mut out = Vec::with_capacity(ca.len());
                for (j, &q) in self.moduli.iter().enumerate() {
                    for i in 0..n {
                        out.push(mod_add(ca[j * n + i], cb[j * n + i], q));
                    }
                }
                out
            })
            .collect();
        Ok(Ciphertext::new(components, a.is_ntt_form()))
    }

    fn multiply_plain_ntt(&self, ct: &Ciphertext, pt: &Plaintext) -> Result<Ciphertext> {
        if !ct.is_ntt_form() || !pt.is_ntt_form() {
            return Err(PirError::InternalInvariant(
                "frequency-domain multiply on time-domain input".into(),
            ));
        }
        self.check_shape(ct)?;
        if pt.data().len() != self.degree {
            return Err(PirError::InternalInvariant(
                "plaintext length does not match the polynomial degree".into(),
            ));
        }
        let n = self.degree;
        let components = ct
            .components()
            .iter()
            .map(|comp| {
                let mut out = Vec::with_capacity(comp.len());
                for (j, &q) in self.moduli.iter().enumerate() {
                    let lifted: Vec<u64> = pt.data().iter().map(|&c| c % q).collect();
                    out.extend(negacyclic_mul(&comp[j * n..(j + 1) * n], &lifted, q));
                }
                out
            })
            .collect();
        Ok(Ciphertext::new(components, true))
    }

    fn apply_galois(
        &self,
        ct: &Ciphertext,
        galois_elt: usize,
        _key: &GaloisKey,
    ) -> Result<Ciphertext> {
        Self::require_time_domain(ct, "automorphism")?;
        self.check_shape(ct)?;
        let n = self.degree;
        let components = ct
            .components()
            .iter()
            .map(|comp| {
                let mut out = Vec::with_capacity(comp.len());
                for (j, &q) in self.moduli.iter().enumerate() {
                    out.extend(apply_automorphism(&comp[j * n..(j + 1) * n], galois_elt, q));
                }
                out
            })
            .collect();
        Ok(Ciphertext::new(components, false))
    }

    fn multiply_power_of_x(&self, ct: &Ciphertext, shift: usize) -> Result<Ciphertext> {
        Self::require_time_domain(ct, "negacyclic rotation")?;
        self.check_shape(ct)?;
        let n = self.degree;
        let components = ct
            .components()
            .iter()
            .map(|comp| {
                let mut out = Vec::with_capacity(comp.len());
                for (j, &q) in self.moduli.iter().enumerate() {
                    out.extend(negacyclic_shift(&comp[j * n..(j + 1) * n], shift, q));
                }
                out
            })
            .collect();
        Ok(Ciphertext::new(components, false))
    }

    fn transform_to_ntt(&self, ct: &mut Ciphertext) -> Result<()> {
        Self::require_time_domain(ct, "forward transform")?;
        ct.set_ntt_form(true);
        Ok(())
    }

    fn transform_from_ntt(&self, ct: &mut Ciphertext) -> Result<()> {
        if !ct.is_ntt_form() {
            return Err(PirError::InternalInvariant(
                "inverse transform requires a frequency-domain ciphertext".into(),
            ));
        }
        ct.set_ntt_form(false);
        Ok(())
    }

    fn transform_plain_to_ntt(&self, pt: &mut Plaintext) -> Result<()> {
        if pt.is_ntt_form() {
            return Err(PirError::InternalInvariant(
                "forward transform on a frequency-domain plaintext".into(),
            ));
        }
        pt.set_ntt_form(true);
        Ok(())
    }
}

#[inline]
fn mod_add(a: u64, b: u64, q: u64) -> u64 {
    ((a as u128 + b as u128) % q as u128) as u64
}

#[inline]
fn mod_sub(a: u64, b: u64, q: u64) -> u64 {
    if a >= b {
        a - b
    } else {
        q - b + a
    }
}

#[inline]
fn mod_mul(a: u64, b: u64, q: u64) -> u64 {
    ((a as u128 * b as u128) % q as u128) as u64
}

/// Schoolbook negacyclic convolution: a · b mod (X^n + 1) mod q.
fn negacyclic_mul(a: &[u64], b: &[u64], q: u64) -> Vec<u64> {
    let n = a.len();
    let mut out = vec![0u64; n];
    for (i, &ai) in a.iter().enumerate() {
        if ai == 0 {
            continue;
        }
        for (j, &bj) in b.iter().enumerate() {
            if bj == 0 {
                continue;
            }
            let prod = mod_mul(ai, bj, q);
            let idx = i + j;
            if idx < n {
                out[idx] = mod_add(out[idx], prod, q);
            } else {
                // X^n = -1
                out[idx - n] = mod_sub(out[idx - n], prod, q);
            }
        }
    }
    out
}

/// Multiply by X^shift mod (X^n + 1): rotate coefficients, flipping the sign
/// on wraparound.
fn negacyclic_shift(a: &[u64], shift: usize, q: u64) -> Vec<u64> {
    let n = a.len();
    let shift = shift % (2 * n);
    let mut out = vec![0u64; n];
    for (i, &coeff) in a.iter().enumerate() {
        if coeff == 0 {
            continue;
        }
        let raw = (i + shift) % (2 * n);
        if raw < n {
            out[raw] = mod_add(out[raw], coeff, q);
        } else {
            out[raw - n] = mod_sub(out[raw - n], coeff, q);
        }
    }
    out
}

/// Apply X ↦ X^g mod (X^n + 1): coefficient i moves to g·i mod 2n, negated
/// when the exponent lands past degree n.
fn apply_automorphism(a: &[u64], g: usize, q: u64) -> Vec<u64> {
    let n = a.len();
    let two_n = 2 * n;
    let mut out = vec![0u64; n];
    for (i, &coeff) in a.iter().enumerate() {
        if coeff == 0 {
            continue;
        }
        let raw = (g * i) % two_n;
        if raw < n {
            out[raw] = mod_add(out[raw], coeff, q);
        } else {
            out[raw - n] = mod_sub(out[raw - n], coeff, q);
        }
    }
    out
}
