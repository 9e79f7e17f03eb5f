//! Plaintext, ciphertext, and key types shared with the HE backend.
//!
//! The engine tracks a *domain tag* on plaintexts and ciphertexts: values
//! live either in the time (coefficient) domain or in the frequency (NTT)
//! domain. Backends may re-represent the underlying data when transforming;
//! the engine reads coefficients only while a value is in the time domain,
//! and mixing domains in an operation is an internal-invariant error.

use serde::{Deserialize, Serialize};

/// Number of polynomial components in a freshly encrypted ciphertext.
pub const CIPHERTEXT_SIZE: usize = 2;

/// Polynomial of degree < N over the plaintext modulus.
///
/// In the time domain this holds exactly N coefficients. After
/// [`Evaluator::transform_plain_to_ntt`](super::Evaluator::transform_plain_to_ntt)
/// the layout is backend-defined and opaque to the engine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plaintext {
    coeffs: Vec<u64>,
    ntt_form: bool,
}

impl Plaintext {
    /// Create a time-domain plaintext from coefficients.
    pub fn new(coeffs: Vec<u64>) -> Self {
        Self {
            coeffs,
            ntt_form: false,
        }
    }

    /// The all-`1` padding plaintext of length `n`.
    pub fn ones(n: usize) -> Self {
        Self::new(vec![1; n])
    }

    /// Underlying data (coefficients in the time domain).
    pub fn data(&self) -> &[u64] {
        &self.coeffs
    }

    /// Mutable underlying data. Intended for backend transforms.
    pub fn data_mut(&mut self) -> &mut Vec<u64> {
        &mut self.coeffs
    }

    /// Whether the plaintext is in the frequency domain.
    pub fn is_ntt_form(&self) -> bool {
        self.ntt_form
    }

    /// Set the domain tag.
    ///
    /// **Warning**: only backends flip this, and only together with the
    /// matching data transform.
    pub fn set_ntt_form(&mut self, ntt_form: bool) {
        self.ntt_form = ntt_form;
    }
}

/// Encrypted polynomial vector.
///
/// Each component holds `chain_len * N` values in modulus-major layout:
/// component `i`, residue `j` occupies `data[i][j*N..(j+1)*N]`. A fresh
/// encryption has [`CIPHERTEXT_SIZE`] components.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    components: Vec<Vec<u64>>,
    ntt_form: bool,
}

impl Ciphertext {
    /// Create a ciphertext from raw components.
    pub fn new(components: Vec<Vec<u64>>, ntt_form: bool) -> Self {
        Self {
            components,
            ntt_form,
        }
    }

    /// Number of polynomial components.
    pub fn size(&self) -> usize {
        self.components.len()
    }

    /// All components.
    pub fn components(&self) -> &[Vec<u64>] {
        &self.components
    }

    /// Mutable components. Intended for backend transforms.
    pub fn components_mut(&mut self) -> &mut [Vec<u64>] {
        &mut self.components
    }

    /// Whether the ciphertext is in the frequency domain.
    pub fn is_ntt_form(&self) -> bool {
        self.ntt_form
    }

    /// Set the domain tag.
    ///
    /// **Warning**: only backends flip this, and only together with the
    /// matching data transform.
    pub fn set_ntt_form(&mut self, ntt_form: bool) {
        self.ntt_form = ntt_form;
    }
}

/// Opaque automorphism (Galois) key material.
///
/// The engine never inspects the contents; it only hands the blob back to
/// the backend when applying an automorphism. Versioning against the live
/// parameter set happens in the server's key store, not here.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GaloisKey {
    data: Vec<u8>,
}

impl GaloisKey {
    /// Wrap backend key material.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Backend key material.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}
