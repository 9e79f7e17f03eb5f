//! Ciphertext decomposition.
//!
//! Between recursion dimensions, every reduced ciphertext is re-encoded as
//! plaintexts so it can be selected against again: each coefficient is
//! split into `⌈log2 t⌉`-bit chunks by shift-and-mask, producing, per
//! polynomial component and per chain modulus `q_j`,
//! `⌈⌊log2 q_j⌋ / ⌈log2 t⌉⌉` plaintexts. The chunks recompose as
//! `Σ chunk_k · 2^(k·⌈log2 t⌉)`, which the client applies in reverse when
//! unpeeling the reply.

use crate::error::{PirError, Result};
use crate::he::{Ciphertext, Plaintext, CIPHERTEXT_SIZE};
use crate::params::{floor_log2, EncryptionParams};

/// Plaintexts produced per modulus: ⌈⌊log2 q⌋ / exp⌉.
fn per_modulus_ratio(q: u64, exp: usize) -> usize {
    (floor_log2(q) + exp - 1) / exp
}

/// Number of plaintexts one fresh ciphertext decomposes into.
///
/// `PirParams::expansion_ratio` must equal this value; the server checks the
/// equality once at configure time.
pub fn expansion_ratio(enc_params: &EncryptionParams) -> usize {
    let exp = enc_params.logt();
    let per_component: usize = enc_params
        .coeff_modulus
        .iter()
        .map(|&q| per_modulus_ratio(q, exp))
        .sum();
    CIPHERTEXT_SIZE * per_component
}

/// Decompose a time-domain ciphertext into plaintext chunks.
///
/// Output order: components outermost, then chain moduli, then chunk index
/// from least-significant upward.
pub fn decompose_to_plaintexts(
    enc_params: &EncryptionParams,
    ct: &Ciphertext,
) -> Result<Vec<Plaintext>> {
    if ct.is_ntt_form() {
        return Err(PirError::InternalInvariant(
            "decomposition requires a time-domain ciphertext".into(),
        ));
    }

    let n = enc_params.poly_degree;
    let exp = enc_params.logt();
    let mask = enc_params.plain_modulus - 1;
    let chain_len = enc_params.coeff_modulus.len();

    let mut result = Vec::new();
    for component in ct.components() {
        if component.len() != chain_len * n {
            return Err(PirError::InternalInvariant(format!(
                "ciphertext component holds {} values, expected {} residues of degree {}",
                component.len(),
                chain_len,
                n
            )));
        }
        for (j, &q) in enc_params.coeff_modulus.iter().enumerate() {
            let poly = &component[j * n..(j + 1) * n];
            let ratio = per_modulus_ratio(q, exp);
            let mut shift = 0;
            for _ in 0..ratio {
                let coeffs: Vec<u64> = poly.iter().map(|&c| (c >> shift) & mask).collect();
                result.push(Plaintext::new(coeffs));
                shift += exp;
            }
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    const N: usize = 32;
    const Q: u64 = 1 << 40;

    fn test_enc_params() -> EncryptionParams {
        EncryptionParams {
            poly_degree: N,
            plain_modulus: 1 << 20,
            coeff_modulus: vec![Q],
        }
    }

    fn random_ciphertext(rng: &mut ChaCha20Rng) -> Ciphertext {
        let components = (0..CIPHERTEXT_SIZE)
            .map(|_| (0..N).map(|_| rng.gen_range(0..Q)).collect())
            .collect();
        Ciphertext::new(components, false)
    }

    #[test]
    fn ratio_matches_derived_constant() {
        let enc = test_enc_params();
        // 40-bit modulus, 20-bit chunks: 2 chunks per component.
        assert_eq!(expansion_ratio(&enc), 4);

        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let ct = random_ciphertext(&mut rng);
        let plaintexts = decompose_to_plaintexts(&enc, &ct).unwrap();
        assert_eq!(plaintexts.len(), expansion_ratio(&enc));
    }

    #[test]
    fn chunks_recompose_exactly() {
        let enc = test_enc_params();
        let exp = enc.logt();
        let per_component = expansion_ratio(&enc) / CIPHERTEXT_SIZE;

        let mut rng = ChaCha20Rng::seed_from_u64(13);
        let ct = random_ciphertext(&mut rng);
        let plaintexts = decompose_to_plaintexts(&enc, &ct).unwrap();

        for (c, component) in ct.components().iter().enumerate() {
            for i in 0..N {
                let recomposed: u64 = (0..per_component)
                    .map(|k| plaintexts[c * per_component + k].data()[i] << (k * exp))
                    .sum();
                assert_eq!(recomposed, component[i]);
            }
        }
    }

    #[test]
    fn chunk_values_stay_below_the_mask() {
        let enc = test_enc_params();
        let mut rng = ChaCha20Rng::seed_from_u64(17);
        let ct = random_ciphertext(&mut rng);
        for pt in decompose_to_plaintexts(&enc, &ct).unwrap() {
            assert!(pt.data().iter().all(|&c| c < enc.plain_modulus));
        }
    }

    #[test]
    fn frequency_domain_input_is_rejected() {
        let enc = test_enc_params();
        let mut rng = ChaCha20Rng::seed_from_u64(19);
        let mut ct = random_ciphertext(&mut rng);
        ct.set_ntt_form(true);
        assert!(matches!(
            decompose_to_plaintexts(&enc, &ct),
            Err(PirError::InternalInvariant(_))
        ));
    }
}
