//! Oblivious query expansion.
//!
//! Turns one compressed ciphertext into a one-hot selection vector of width
//! `m` without learning the selected index. The client encrypts X^k for
//! target index k; binary expansion by repeated doubling then produces `m`
//! ciphertexts where entry k holds the constant `2^⌈log2 m⌉` and every other
//! entry holds zero. The client divides the scale back out (for power-of-two
//! dimension sizes the scale is exactly `m`).
//!
//! Each doubling level `i` splits every ciphertext c into an even child
//! `c + τ_{g_i}(c)` and an odd child built from the negacyclic shifts
//! `c · X^{-2^i}` and `τ_{g_i}(c) · X^{-2^i·g_i}`, where the automorphism
//! exponent is `g_i = N/2^i + 1`. The automorphism flips the sign of exactly
//! the coefficients whose index has bit `i` set, so the even child keeps the
//! half of the candidates with that query bit clear and the odd child keeps
//! the other half, shifted down to restart the recursion at bit `i+1`.

use crate::error::{PirError, Result};
use crate::he::{Ciphertext, Evaluator, GaloisKey};
use crate::params::{ceil_log2, EncryptionParams};

/// Expand one compressed ciphertext into `m` one-hot ciphertexts.
///
/// Requires `1 <= m <= N`. When `m` is not a power of two, the final
/// doubling level handles the slots past `m - 2^(logm-1)` by plain doubling
/// (no shifted child is produced for them; those children would fall past
/// the truncation point anyway), which keeps every surviving slot on the
/// same `2^logm` scale.
pub fn expand_query<E: Evaluator>(
    evaluator: &E,
    enc_params: &EncryptionParams,
    key: &GaloisKey,
    encrypted: &Ciphertext,
    m: usize,
) -> Result<Vec<Ciphertext>> {
    let n = enc_params.poly_degree;
    if m == 0 || m > n {
        return Err(PirError::MalformedQuery(format!(
            "expansion width {} is outside 1..={}",
            m, n
        )));
    }
    if m == 1 {
        return Ok(vec![encrypted.clone()]);
    }

    let logm = ceil_log2(m as u64);
    let galois_elts: Vec<usize> = (0..logm).map(|i| (n >> i) + 1).collect();

    let mut current = vec![encrypted.clone()];
    for i in 0..logm - 1 {
        // X^{-2^i} as a positive exponent mod 2N.
        let index_raw = 2 * n - (1 << i);
        let index = (index_raw * galois_elts[i]) % (2 * n);

        let mut evens = Vec::with_capacity(current.len());
        let mut odds = Vec::with_capacity(current.len());
        for ct in &current {
            let rotated = evaluator.apply_galois(ct, galois_elts[i], key)?;
            evens.push(evaluator.add(ct, &rotated)?);

            let shifted = evaluator.multiply_power_of_x(ct, index_raw)?;
            let rotated_shifted = evaluator.multiply_power_of_x(&rotated, index)?;
            odds.push(evaluator.add(&shifted, &rotated_shifted)?);
        }
        evens.append(&mut odds);
        current = evens;
    }

    // Final level. Slots at or past `m - 2^(logm-1)` have no live shifted
    // child, so they are doubled in place instead of branched.
    let last = logm - 1;
    let index_raw = 2 * n - (1 << last);
    let index = (index_raw * galois_elts[last]) % (2 * n);
    let corner_from = m - (1 << last);

    let mut evens = Vec::with_capacity(current.len());
    let mut odds = Vec::with_capacity(corner_from);
    for (a, ct) in current.iter().enumerate() {
        if a >= corner_from {
            evens.push(evaluator.add(ct, ct)?);
        } else {
            let rotated = evaluator.apply_galois(ct, galois_elts[last], key)?;
            evens.push(evaluator.add(ct, &rotated)?);

            let shifted = evaluator.multiply_power_of_x(ct, index_raw)?;
            let rotated_shifted = evaluator.multiply_power_of_x(&rotated, index)?;
            odds.push(evaluator.add(&shifted, &rotated_shifted)?);
        }
    }
    evens.append(&mut odds);

    if evens.len() != m {
        return Err(PirError::InternalInvariant(format!(
            "expansion produced {} ciphertexts for width {}",
            evens.len(),
            m
        )));
    }
    Ok(evens)
}
