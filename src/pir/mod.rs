//! Multi-dimensional PIR protocol engine.
//!
//! The database is encoded as plaintexts filling a d-dimensional matrix
//! shaped by `nvec`. A query carries one compressed ciphertext per
//! dimension; the server expands each into a one-hot selection vector of
//! `n_i` ciphertexts, collapses the matrix along that dimension with
//! frequency-domain multiply-accumulate, and re-encodes the surviving
//! ciphertexts as plaintexts to feed the next dimension. The ciphertexts
//! left after the last dimension are the reply.
//!
//! # Example
//!
//! ```ignore
//! use cube_pir::{CleartextEvaluator, EncryptionParams, PirParams, PirServer};
//!
//! let enc = EncryptionParams {
//!     poly_degree: 4096,
//!     plain_modulus: 1 << 20,
//!     coeff_modulus: vec![1 << 40],
//! };
//! let pir = PirParams {
//!     nvec: vec![32, 32],
//!     expansion_ratio: cube_pir::expansion_ratio(&enc),
//! };
//! let mut server = PirServer::new(CleartextEvaluator::new(&enc), enc, pir)?;
//!
//! server.load_database_bytes(&raw, element_count, element_size)?;
//! server.preprocess()?;
//! server.register_key(client_id, galois_key);
//!
//! let reply = server.answer(&query, client_id)?;
//! ```

mod decompose;
mod encode_db;
mod expand;
mod server;

pub use decompose::{decompose_to_plaintexts, expansion_ratio};
pub use encode_db::{
    bytes_to_coeffs, coefficients_per_element, coeffs_to_bytes, elements_per_plaintext,
    encode_database, plaintexts_per_database,
};
pub use expand::expand_query;
pub use server::{PirQuery, PirReply, PirServer};
