//! Database encoding for PIR.
//!
//! Packs raw database bytes into plaintext polynomials that exactly fill the
//! configured multi-dimensional matrix.
//!
//! # Packing format
//!
//! With `logt = ⌈log2(t)⌉`, every plaintext coefficient holds one `logt`-bit
//! chunk of the element byte stream, MSB-first and in stream order. Each
//! plaintext packs a whole number of elements
//! (`elements_per_plaintext * ele_size` bytes) and starts a fresh bit
//! stream, so chunks never straddle plaintexts. A final partial chunk is
//! left-shifted to sit in the high bits of its coefficient.
//!
//! Every coefficient beyond the real data holds the value `1` — never `0` —
//! whether it pads out a partial plaintext or fills a whole matrix slot.
//! Client decoders rely on the sentinel to strip trailing padding, so the
//! choice is part of the wire contract.

use tracing::info;

use crate::error::{PirError, Result};
use crate::he::{Evaluator, Plaintext};
use crate::params::{EncryptionParams, PirParams};

/// Number of coefficients one element occupies: ⌈8·ele_size / logt⌉.
pub fn coefficients_per_element(logt: usize, ele_size: usize) -> usize {
    (8 * ele_size + logt - 1) / logt
}

/// Number of whole elements that fit in one plaintext.
///
/// Fails with `InvalidArgument` if a single element needs more than N
/// coefficients: elements are never split across plaintexts.
pub fn elements_per_plaintext(logt: usize, poly_degree: usize, ele_size: usize) -> Result<usize> {
    let coeff_per_element = coefficients_per_element(logt, ele_size);
    if coeff_per_element > poly_degree {
        return Err(PirError::InvalidArgument(format!(
            "an element of {} bytes needs {} coefficients but the polynomial degree is {}",
            ele_size, coeff_per_element, poly_degree
        )));
    }
    Ok(poly_degree / coeff_per_element)
}

/// Number of plaintexts the real data occupies.
pub fn plaintexts_per_database(
    logt: usize,
    poly_degree: usize,
    ele_num: usize,
    ele_size: usize,
) -> Result<usize> {
    let per_plaintext = elements_per_plaintext(logt, poly_degree, ele_size)?;
    Ok((ele_num + per_plaintext - 1) / per_plaintext)
}

/// Slice a byte stream into `logt`-bit coefficient chunks, MSB-first.
pub fn bytes_to_coeffs(logt: usize, bytes: &[u8]) -> Vec<u64> {
    if bytes.is_empty() {
        return Vec::new();
    }
    let size_out = (bytes.len() * 8 + logt - 1) / logt;
    let mut output = vec![0u64; size_out];

    let mut idx = 0;
    let mut room = logt;
    for &byte in bytes {
        // Widened so a full-byte shift stays in range.
        let mut src = byte as u64;
        let mut rest = 8;
        while rest > 0 {
            if room == 0 {
                idx += 1;
                room = logt;
            }
            let shift = rest.min(room);
            output[idx] = (output[idx] << shift) | (src >> (8 - shift));
            src = (src << shift) & 0xFF;
            room -= shift;
            rest -= shift;
        }
    }
    // Left-align a trailing partial chunk.
    output[idx] <<= room;
    output
}

/// Inverse of [`bytes_to_coeffs`]: reassemble `num_bytes` bytes from
/// `logt`-bit coefficient chunks. This is what a client-side decoder runs
/// after stripping trailing padding.
pub fn coeffs_to_bytes(logt: usize, coeffs: &[u64], num_bytes: usize) -> Vec<u8> {
    let mut output = vec![0u8; num_bytes];

    let mut idx = 0;
    let mut room = 8usize;
    for &coeff in coeffs {
        if idx >= num_bytes {
            break;
        }
        let mut rest = logt;
        while rest > 0 && idx < num_bytes {
            let shift = rest.min(room);
            let chunk = (coeff >> (rest - shift)) & ((1u64 << shift) - 1);
            // Widened so a full-byte shift stays in range.
            output[idx] = (((output[idx] as u64) << shift) | chunk) as u8;
            room -= shift;
            rest -= shift;
            if room == 0 {
                idx += 1;
                room = 8;
            }
        }
    }
    if idx < num_bytes && room < 8 {
        output[idx] <<= room;
    }
    output
}

/// Encode `ele_num` elements of `ele_size` bytes into exactly
/// `product(nvec)` plaintexts.
///
/// Fails with `CapacityExceeded` when the real data alone needs more
/// plaintexts than the matrix provides.
pub fn encode_database<E: Evaluator>(
    evaluator: &E,
    enc_params: &EncryptionParams,
    pir_params: &PirParams,
    bytes: &[u8],
    ele_num: usize,
    ele_size: usize,
) -> Result<Vec<Plaintext>> {
    if ele_num == 0 || ele_size == 0 {
        return Err(PirError::InvalidArgument(
            "database must contain at least one element of nonzero size".into(),
        ));
    }
    if bytes.len() != ele_num * ele_size {
        return Err(PirError::InvalidArgument(format!(
            "{} bytes do not hold {} elements of {} bytes",
            bytes.len(),
            ele_num,
            ele_size
        )));
    }

    let n = enc_params.poly_degree;
    let logt = enc_params.logt();

    let ele_per_ptxt = elements_per_plaintext(logt, n, ele_size)?;
    let total = plaintexts_per_database(logt, n, ele_num, ele_size)?;
    let matrix_plaintexts = pir_params.total_plaintexts();
    if total > matrix_plaintexts {
        return Err(PirError::CapacityExceeded {
            required: total,
            available: matrix_plaintexts,
        });
    }

    let bytes_per_ptxt = ele_per_ptxt * ele_size;
    let coeff_per_ptxt = ele_per_ptxt * coefficients_per_element(logt, ele_size);

    let mut result = Vec::with_capacity(matrix_plaintexts);
    let mut offset = 0;
    for _ in 0..total {
        let process = bytes_per_ptxt.min(bytes.len() - offset);
        let mut coeffs = bytes_to_coeffs(logt, &bytes[offset..offset + process]);
        offset += process;

        if coeffs.len() > coeff_per_ptxt {
            return Err(PirError::InternalInvariant(format!(
                "packed {} coefficients into a plaintext sized for {}",
                coeffs.len(),
                coeff_per_ptxt
            )));
        }

        coeffs.resize(n, 1);
        result.push(evaluator.encode(coeffs)?);
    }

    let padding = matrix_plaintexts - result.len();
    info!(
        elements = ele_num,
        real_plaintexts = total,
        padding_plaintexts = padding,
        "database encoded"
    );
    for _ in 0..padding {
        result.push(evaluator.encode(vec![1; n])?);
    }

    Ok(result)
}
