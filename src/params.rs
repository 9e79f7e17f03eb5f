//! Parameter sets for the PIR engine.
//!
//! Two parameter groups exist: [`EncryptionParams`] mirrors the encryption
//! scheme's shape (polynomial degree, plaintext modulus, ciphertext modulus
//! chain) and [`PirParams`] describes the protocol layout (the dimension
//! vector and the decomposition expansion ratio).
//!
//! The polynomial degree and the modulus chain are *structural*: automorphism
//! keys and ciphertexts issued under them stop making sense if they change,
//! so a running server refuses to alter them (see
//! [`PirServer::configure`](crate::pir::PirServer::configure)). The plaintext
//! modulus and the PIR layout may be replaced freely.

use serde::{Deserialize, Serialize};

use crate::error::{PirError, Result};

/// Encryption-scheme parameters the engine operates under.
///
/// The engine never instantiates the scheme itself; these values only steer
/// the encoding, expansion, and decomposition arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionParams {
    /// Polynomial degree N (power of two).
    pub poly_degree: usize,

    /// Plaintext modulus t.
    pub plain_modulus: u64,

    /// Ciphertext modulus chain, one entry per residue modulus.
    pub coeff_modulus: Vec<u64>,
}

impl EncryptionParams {
    /// Bit width of a plaintext coefficient: ⌈log2(t)⌉.
    pub fn logt(&self) -> usize {
        ceil_log2(self.plain_modulus)
    }

    /// Whether `other` agrees on the structural fields (degree and chain).
    pub fn structural_eq(&self, other: &EncryptionParams) -> bool {
        self.poly_degree == other.poly_degree && self.coeff_modulus == other.coeff_modulus
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<()> {
        if !self.poly_degree.is_power_of_two() {
            return Err(PirError::InvalidArgument(format!(
                "polynomial degree {} is not a power of two",
                self.poly_degree
            )));
        }
        if self.plain_modulus < 2 {
            return Err(PirError::InvalidArgument(
                "plaintext modulus must be at least 2".into(),
            ));
        }
        if self.coeff_modulus.is_empty() {
            return Err(PirError::InvalidArgument(
                "ciphertext modulus chain is empty".into(),
            ));
        }
        for &q in &self.coeff_modulus {
            if q <= self.plain_modulus {
                return Err(PirError::InvalidArgument(format!(
                    "ciphertext modulus {} does not exceed the plaintext modulus {}",
                    q, self.plain_modulus
                )));
            }
        }
        Ok(())
    }
}

/// Protocol layout parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PirParams {
    /// Per-dimension sizes of the database matrix. The product is the total
    /// number of plaintext slots.
    pub nvec: Vec<usize>,

    /// Number of plaintexts one ciphertext decomposes into. Must equal the
    /// value derived from the encryption parameters; checked at configure
    /// time, not per call.
    pub expansion_ratio: usize,
}

impl PirParams {
    /// Total number of plaintext slots in the matrix: ∏ nvec[i].
    pub fn total_plaintexts(&self) -> usize {
        self.nvec.iter().product()
    }

    /// Check the layout against a set of encryption parameters.
    pub fn validate(&self, enc: &EncryptionParams) -> Result<()> {
        if self.nvec.is_empty() {
            return Err(PirError::InvalidArgument(
                "dimension vector is empty".into(),
            ));
        }
        for &n_i in &self.nvec {
            if n_i == 0 || n_i > enc.poly_degree {
                return Err(PirError::InvalidArgument(format!(
                    "dimension size {} is outside 1..={}",
                    n_i, enc.poly_degree
                )));
            }
        }
        let derived = crate::pir::expansion_ratio(enc);
        if self.expansion_ratio != derived {
            return Err(PirError::InvalidArgument(format!(
                "expansion ratio {} does not match the value {} derived from the \
                 encryption parameters",
                self.expansion_ratio, derived
            )));
        }
        Ok(())
    }
}

/// ⌈log2(x)⌉ for x ≥ 1.
pub(crate) fn ceil_log2(x: u64) -> usize {
    debug_assert!(x >= 1);
    if x <= 1 {
        0
    } else {
        64 - (x - 1).leading_zeros() as usize
    }
}

/// ⌊log2(x)⌋ for x ≥ 1.
pub(crate) fn floor_log2(x: u64) -> usize {
    debug_assert!(x >= 1);
    63 - x.leading_zeros() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_enc_params() -> EncryptionParams {
        EncryptionParams {
            poly_degree: 64,
            plain_modulus: 1 << 20,
            coeff_modulus: vec![1 << 40],
        }
    }

    #[test]
    fn valid_params_pass() {
        let enc = test_enc_params();
        assert!(enc.validate().is_ok());
        assert_eq!(enc.logt(), 20);

        let pir = PirParams {
            nvec: vec![4, 4],
            expansion_ratio: crate::pir::expansion_ratio(&enc),
        };
        assert!(pir.validate(&enc).is_ok());
        assert_eq!(pir.total_plaintexts(), 16);
    }

    #[test]
    fn non_power_of_two_degree_rejected() {
        let mut enc = test_enc_params();
        enc.poly_degree = 100;
        assert!(matches!(enc.validate(), Err(PirError::InvalidArgument(_))));
    }

    #[test]
    fn small_coeff_modulus_rejected() {
        let mut enc = test_enc_params();
        enc.coeff_modulus = vec![1 << 10];
        assert!(enc.validate().is_err());
    }

    #[test]
    fn expansion_ratio_mismatch_rejected() {
        let enc = test_enc_params();
        let pir = PirParams {
            nvec: vec![4, 4],
            expansion_ratio: crate::pir::expansion_ratio(&enc) + 1,
        };
        assert!(pir.validate(&enc).is_err());
    }

    #[test]
    fn oversized_dimension_rejected() {
        let enc = test_enc_params();
        let pir = PirParams {
            nvec: vec![128],
            expansion_ratio: crate::pir::expansion_ratio(&enc),
        };
        assert!(pir.validate(&enc).is_err());
    }

    #[test]
    fn structural_eq_ignores_plain_modulus() {
        let a = test_enc_params();
        let mut b = a.clone();
        b.plain_modulus = 786433;
        assert!(a.structural_eq(&b));

        b.poly_degree = 128;
        assert!(!a.structural_eq(&b));
    }

    #[test]
    fn log2_helpers() {
        assert_eq!(ceil_log2(1), 0);
        assert_eq!(ceil_log2(2), 1);
        assert_eq!(ceil_log2(3), 2);
        assert_eq!(ceil_log2(1 << 20), 20);
        assert_eq!(ceil_log2(786433), 20);
        assert_eq!(floor_log2(1), 0);
        assert_eq!(floor_log2(786433), 19);
        assert_eq!(floor_log2(1 << 40), 40);
    }
}
