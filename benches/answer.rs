//! Reply-computation benchmark over the cleartext reference backend.
//!
//! Measures the full expand → reduce → decompose path. Absolute numbers are
//! dominated by the backend's schoolbook polynomial arithmetic; the value
//! here is tracking relative regressions in the engine's orchestration.

use criterion::{criterion_group, criterion_main, Criterion};

use cube_pir::pir::expansion_ratio;
use cube_pir::{
    CleartextEvaluator, EncryptionParams, GaloisKey, PirParams, PirQuery, PirServer, Plaintext,
};

fn bench_answer(c: &mut Criterion) {
    let enc = EncryptionParams {
        poly_degree: 256,
        plain_modulus: 1 << 20,
        coeff_modulus: vec![1 << 40],
    };
    let pir = PirParams {
        nvec: vec![8, 8],
        expansion_ratio: expansion_ratio(&enc),
    };
    let ev = CleartextEvaluator::new(&enc);
    let mut server = PirServer::new(ev, enc, pir).unwrap();

    let ele_num = 1000;
    let ele_size = 5;
    let bytes: Vec<u8> = (0..ele_num * ele_size).map(|i| (i % 251) as u8).collect();
    server.load_database_bytes(&bytes, ele_num, ele_size).unwrap();
    server.preprocess().unwrap();
    server.register_key(0, GaloisKey::default());

    let mut coeffs = vec![0u64; 256];
    coeffs[3] = 1;
    let ct = server.evaluator().encrypt(&Plaintext::new(coeffs));
    let query = PirQuery {
        cts: vec![ct.clone(), ct],
    };

    let mut group = c.benchmark_group("answer");
    group.sample_size(10);
    group.bench_function("nvec_8x8_n256", |b| {
        b.iter(|| server.answer(&query, 0).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_answer);
criterion_main!(benches);
