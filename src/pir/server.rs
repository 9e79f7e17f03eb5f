//! The PIR server engine.
//!
//! [`PirServer`] owns the encoded database, the per-client automorphism key
//! registry, and the derived frequency-domain cache, and drives the
//! per-dimension expand → multiply-accumulate → decompose recursion that
//! turns a compressed query into a reply.
//!
//! Mutating operations (`configure`, `load_database`, `preprocess`,
//! `register_key`) take `&mut self`; [`answer`](PirServer::answer) takes
//! `&self` and keeps all intermediate state private to the call, so replies
//! for different clients may run concurrently once the database is
//! preprocessed.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PirError, Result};
use crate::he::{Ciphertext, Evaluator, GaloisKey, Plaintext};
use crate::params::{EncryptionParams, PirParams};

use super::decompose::{decompose_to_plaintexts, expansion_ratio};
use super::encode_db::encode_database;
use super::expand::expand_query;

/// Compressed client query: one ciphertext per database dimension.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PirQuery {
    /// Dimension ciphertexts, in matrix order.
    pub cts: Vec<Ciphertext>,
}

/// Server reply: the ciphertexts produced by the final recursion dimension.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PirReply {
    /// Reply ciphertexts, still encrypted; decryption happens at the client.
    pub cts: Vec<Ciphertext>,
}

/// Per-client automorphism keys, tagged with the parameter version they
/// were issued for.
#[derive(Default)]
struct KeyStore {
    entries: HashMap<u32, KeyEntry>,
}

struct KeyEntry {
    key: GaloisKey,
    version: u64,
}

impl KeyStore {
    fn register(&mut self, client_id: u32, key: GaloisKey, version: u64) {
        self.entries.insert(client_id, KeyEntry { key, version });
    }

    /// A key is usable only while its tag matches the live parameter
    /// version; anything else reads as not registered.
    fn lookup(&self, client_id: u32, version: u64) -> Result<&GaloisKey> {
        match self.entries.get(&client_id) {
            Some(entry) if entry.version == version => Ok(&entry.key),
            _ => Err(PirError::MissingKey { client_id }),
        }
    }

    fn retag(&mut self, version: u64) {
        for entry in self.entries.values_mut() {
            entry.version = version;
        }
    }
}

/// Multi-dimensional PIR server over an [`Evaluator`] backend.
pub struct PirServer<E: Evaluator> {
    evaluator: E,
    enc_params: EncryptionParams,
    pir_params: PirParams,
    version: u64,
    db: Option<Vec<Plaintext>>,
    /// Frequency-domain view of `db`. Derived, never a source of truth:
    /// dropped whenever the database or the parameters change.
    ntt_cache: Option<Vec<Plaintext>>,
    keys: KeyStore,
}

impl<E: Evaluator> PirServer<E> {
    /// Create a server with an initial configuration.
    pub fn new(evaluator: E, enc_params: EncryptionParams, pir_params: PirParams) -> Result<Self> {
        enc_params.validate()?;
        pir_params.validate(&enc_params)?;
        Ok(Self {
            evaluator,
            enc_params,
            pir_params,
            version: 1,
            db: None,
            ntt_cache: None,
            keys: KeyStore::default(),
        })
    }

    /// The backend evaluator.
    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Current encryption parameters.
    pub fn enc_params(&self) -> &EncryptionParams {
        &self.enc_params
    }

    /// Current PIR layout parameters.
    pub fn pir_params(&self) -> &PirParams {
        &self.pir_params
    }

    /// The encoded database, if one is loaded.
    pub fn database(&self) -> Option<&[Plaintext]> {
        self.db.as_deref()
    }

    /// Whether the frequency-domain cache is live.
    pub fn is_preprocessed(&self) -> bool {
        self.ntt_cache.is_some()
    }

    /// Replace the configuration.
    ///
    /// Only the plaintext modulus and the PIR layout may change; a different
    /// polynomial degree or modulus chain fails with
    /// `IncompatibleParameters` and leaves the prior configuration intact.
    /// On success the parameter version advances, the frequency-domain cache
    /// is dropped, and all registered keys are re-tagged to the new version
    /// (the permitted changes never invalidate automorphism keys).
    pub fn configure(&mut self, enc_params: EncryptionParams, pir_params: PirParams) -> Result<()> {
        if !self.enc_params.structural_eq(&enc_params) {
            return Err(PirError::IncompatibleParameters(
                "polynomial degree and modulus chain are fixed for the server's lifetime".into(),
            ));
        }
        enc_params.validate()?;
        pir_params.validate(&enc_params)?;

        self.enc_params = enc_params;
        self.pir_params = pir_params;
        self.version += 1;
        self.ntt_cache = None;
        self.keys.retag(self.version);
        info!(version = self.version, "parameters updated");
        Ok(())
    }

    /// Install a pre-encoded database, replacing any prior one.
    pub fn load_database(&mut self, db: Vec<Plaintext>) -> Result<()> {
        let expected = self.pir_params.total_plaintexts();
        if db.len() != expected {
            return Err(PirError::InvalidArgument(format!(
                "database holds {} plaintexts but the matrix needs exactly {}",
                db.len(),
                expected
            )));
        }
        for pt in &db {
            if pt.is_ntt_form() || pt.data().len() != self.enc_params.poly_degree {
                return Err(PirError::InvalidArgument(
                    "database plaintexts must be in the time domain with N coefficients".into(),
                ));
            }
        }
        info!(plaintexts = db.len(), "database replaced");
        self.db = Some(db);
        self.ntt_cache = None;
        Ok(())
    }

    /// Encode raw element bytes and install them as the database.
    pub fn load_database_bytes(
        &mut self,
        bytes: &[u8],
        ele_num: usize,
        ele_size: usize,
    ) -> Result<()> {
        let db = encode_database(
            &self.evaluator,
            &self.enc_params,
            &self.pir_params,
            bytes,
            ele_num,
            ele_size,
        )?;
        self.load_database(db)
    }

    /// Build the frequency-domain cache of the database.
    ///
    /// Idempotent: a second call with a live cache is a no-op. The stored
    /// time-domain database is left untouched.
    pub fn preprocess(&mut self) -> Result<()> {
        let db = self
            .db
            .as_ref()
            .ok_or_else(|| PirError::InvalidArgument("no database loaded".into()))?;
        if self.ntt_cache.is_some() {
            return Ok(());
        }
        let mut cache = db.clone();
        for pt in &mut cache {
            self.evaluator.transform_plain_to_ntt(pt)?;
        }
        debug!(
            plaintexts = cache.len(),
            "database transformed to frequency domain"
        );
        self.ntt_cache = Some(cache);
        Ok(())
    }

    /// Register (or replace) a client's automorphism key, stamped with the
    /// current parameter version.
    pub fn register_key(&mut self, client_id: u32, key: GaloisKey) {
        self.keys.register(client_id, key, self.version);
    }

    /// Expand one dimension ciphertext into `m` one-hot ciphertexts using
    /// the client's registered key.
    pub fn expand_query(
        &self,
        encrypted: &Ciphertext,
        m: usize,
        client_id: u32,
    ) -> Result<Vec<Ciphertext>> {
        let key = self.keys.lookup(client_id, self.version)?;
        expand_query(&self.evaluator, &self.enc_params, key, encrypted, m)
    }

    /// Compute the reply for a query. The hot path.
    ///
    /// Walks the dimensions in order: expand the dimension ciphertext,
    /// reduce the current virtual database against the expanded selection
    /// vector, then decompose the results into the next dimension's virtual
    /// database. The stored database is never mutated; when the cache is
    /// cold, the first dimension works on a transformed copy.
    pub fn answer(&self, query: &PirQuery, client_id: u32) -> Result<PirReply> {
        let nvec = &self.pir_params.nvec;
        if query.cts.len() != nvec.len() {
            return Err(PirError::MalformedQuery(format!(
                "query has {} dimensions, layout has {}",
                query.cts.len(),
                nvec.len()
            )));
        }
        let db = self
            .db
            .as_ref()
            .ok_or_else(|| PirError::InvalidArgument("no database loaded".into()))?;

        let mut product = self.pir_params.total_plaintexts();
        let mut carry: Option<Vec<Plaintext>> = None;

        for (i, (&n_i, ct)) in nvec.iter().zip(&query.cts).enumerate() {
            let mut expanded = self.expand_query(ct, n_i, client_id)?;
            for ct in &mut expanded {
                self.evaluator.transform_to_ntt(ct)?;
            }

            // The virtual database for this dimension, in frequency domain.
            let virtual_db: Cow<'_, [Plaintext]> = match carry.take() {
                Some(mut plaintexts) => {
                    for pt in &mut plaintexts {
                        self.evaluator.transform_plain_to_ntt(pt)?;
                    }
                    Cow::Owned(plaintexts)
                }
                None => match &self.ntt_cache {
                    Some(cache) => Cow::Borrowed(cache.as_slice()),
                    None => {
                        let mut plaintexts = db.clone();
                        for pt in &mut plaintexts {
                            self.evaluator.transform_plain_to_ntt(pt)?;
                        }
                        Cow::Owned(plaintexts)
                    }
                },
            };

            product /= n_i;
            debug!(
                dimension = i,
                width = n_i,
                columns = product,
                "reducing dimension"
            );
            let mut intermediate = self.reduce_dimension(&expanded, &virtual_db, product)?;
            for ct in &mut intermediate {
                self.evaluator.transform_from_ntt(ct)?;
            }

            if i == nvec.len() - 1 {
                return Ok(PirReply { cts: intermediate });
            }

            let ratio = self.pir_params.expansion_ratio;
            let mut next = Vec::with_capacity(ratio * product);
            for ct in &intermediate {
                let plaintexts = decompose_to_plaintexts(&self.enc_params, ct)?;
                if plaintexts.len() != ratio {
                    return Err(PirError::InternalInvariant(format!(
                        "ciphertext decomposed into {} plaintexts, expansion ratio is {}",
                        plaintexts.len(),
                        ratio
                    )));
                }
                next.extend(plaintexts);
            }
            product *= ratio;
            carry = Some(next);
        }

        Err(PirError::InternalInvariant(
            "reply recursion ended without reaching the final dimension".into(),
        ))
    }

    /// Collapse one dimension: for each of the `product` columns, the
    /// homomorphic inner product of the expanded selection vector with the
    /// column's plaintexts.
    fn reduce_dimension(
        &self,
        expanded: &[Ciphertext],
        virtual_db: &[Plaintext],
        product: usize,
    ) -> Result<Vec<Ciphertext>> {
        let n_i = expanded.len();
        if virtual_db.len() != n_i * product {
            return Err(PirError::InternalInvariant(format!(
                "virtual database holds {} plaintexts, dimension needs {} x {}",
                virtual_db.len(),
                n_i,
                product
            )));
        }

        let mut result = Vec::with_capacity(product);
        for k in 0..product {
            let mut acc = self
                .evaluator
                .multiply_plain_ntt(&expanded[0], &virtual_db[k])?;
            for j in 1..n_i {
                let term = self
                    .evaluator
                    .multiply_plain_ntt(&expanded[j], &virtual_db[k + j * product])?;
                acc = self.evaluator.add(&acc, &term)?;
            }
            result.push(acc);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::he::CleartextEvaluator;

    const N: usize = 64;

    fn test_enc_params() -> EncryptionParams {
        EncryptionParams {
            poly_degree: N,
            plain_modulus: 1 << 20,
            coeff_modulus: vec![1 << 40],
        }
    }

    fn test_server() -> PirServer<CleartextEvaluator> {
        let enc = test_enc_params();
        let pir = PirParams {
            nvec: vec![4, 4],
            expansion_ratio: expansion_ratio(&enc),
        };
        let ev = CleartextEvaluator::new(&enc);
        PirServer::new(ev, enc, pir).unwrap()
    }

    fn monomial_query(server: &PirServer<CleartextEvaluator>, indices: &[usize]) -> PirQuery {
        let cts = indices
            .iter()
            .map(|&k| {
                let mut coeffs = vec![0u64; N];
                coeffs[k] = 1;
                server.evaluator().encrypt(&Plaintext::new(coeffs))
            })
            .collect();
        PirQuery { cts }
    }

    #[test]
    fn answer_requires_a_database() {
        let mut server = test_server();
        server.register_key(0, GaloisKey::default());
        let query = monomial_query(&server, &[0, 0]);
        assert!(matches!(
            server.answer(&query, 0),
            Err(PirError::InvalidArgument(_))
        ));
    }

    #[test]
    fn answer_rejects_wrong_dimension_count() {
        let mut server = test_server();
        server.register_key(0, GaloisKey::default());
        server.load_database_bytes(&[0u8; 50], 10, 5).unwrap();
        let query = monomial_query(&server, &[0]);
        assert!(matches!(
            server.answer(&query, 0),
            Err(PirError::MalformedQuery(_))
        ));
    }

    #[test]
    fn unregistered_client_is_missing_key() {
        let mut server = test_server();
        server.load_database_bytes(&[0u8; 50], 10, 5).unwrap();
        let query = monomial_query(&server, &[0, 0]);
        assert_eq!(
            server.answer(&query, 42),
            Err(PirError::MissingKey { client_id: 42 })
        );
    }

    #[test]
    fn preprocess_is_idempotent() {
        let mut server = test_server();
        server.load_database_bytes(&[1u8; 50], 10, 5).unwrap();

        assert!(!server.is_preprocessed());
        server.preprocess().unwrap();
        assert!(server.is_preprocessed());
        server.preprocess().unwrap();
        assert!(server.is_preprocessed());
    }

    #[test]
    fn preprocess_without_database_fails() {
        let mut server = test_server();
        assert!(matches!(
            server.preprocess(),
            Err(PirError::InvalidArgument(_))
        ));
    }

    #[test]
    fn database_replacement_invalidates_the_cache() {
        let mut server = test_server();
        server.load_database_bytes(&[1u8; 50], 10, 5).unwrap();
        server.preprocess().unwrap();
        assert!(server.is_preprocessed());

        server.load_database_bytes(&[2u8; 50], 10, 5).unwrap();
        assert!(!server.is_preprocessed());
    }

    #[test]
    fn load_database_rejects_wrong_shape() {
        let mut server = test_server();
        let short = vec![Plaintext::ones(N); 15];
        assert!(matches!(
            server.load_database(short),
            Err(PirError::InvalidArgument(_))
        ));
    }

    #[test]
    fn configure_rejects_structural_change() {
        let mut server = test_server();
        let before = server.enc_params().clone();

        let mut enc = test_enc_params();
        enc.poly_degree = 128;
        let pir = PirParams {
            nvec: vec![4, 4],
            expansion_ratio: expansion_ratio(&enc),
        };
        assert!(matches!(
            server.configure(enc, pir),
            Err(PirError::IncompatibleParameters(_))
        ));
        assert_eq!(server.enc_params(), &before);
    }

    #[test]
    fn configure_retags_registered_keys() {
        let mut server = test_server();
        server.register_key(7, GaloisKey::default());

        // Changing the plaintext modulus is allowed and must not strand
        // existing automorphism keys.
        let mut enc = test_enc_params();
        enc.plain_modulus = 786433;
        let pir = PirParams {
            nvec: vec![4, 4],
            expansion_ratio: expansion_ratio(&enc),
        };
        server.configure(enc, pir).unwrap();

        server.load_database_bytes(&[0u8; 50], 10, 5).unwrap();
        let query = monomial_query(&server, &[0, 0]);
        assert!(server.answer(&query, 7).is_ok());
    }

    #[test]
    fn configure_drops_the_cache() {
        let mut server = test_server();
        server.load_database_bytes(&[1u8; 50], 10, 5).unwrap();
        server.preprocess().unwrap();

        let enc = test_enc_params();
        let pir = PirParams {
            nvec: vec![2, 8],
            expansion_ratio: expansion_ratio(&enc),
        };
        server.configure(enc, pir).unwrap();
        assert!(!server.is_preprocessed());
    }
}
