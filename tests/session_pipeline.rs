use approx::assert_abs_diff_eq;
use ckks_similarity::{
    Ciphertext, CkksError, NULL_SIMILARITY, ParametersLiteral, Session, SimilarityMatrix,
    similarity::{ErrorStats, dot_product, normalize},
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

fn session(log_slots: u32) -> Session {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    Session::builder()
        .parameters(ParametersLiteral::new(log_slots))
        .seed(42)
        .build()
        .unwrap()
}

fn random_unit_vectors(count: usize, len: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| normalize(&(0..len).map(|_| rng.random_range(-1.0..1.0)).collect::<Vec<f64>>()))
        .collect()
}

#[test]
fn encrypt_decrypt_round_trip() {
    let session = session(6);
    let (encryption, decryption, _) = session.into_contexts();
    let vectors = vec![
        (0..64).map(|i| (i as f64 - 32.0) / 10.0).collect::<Vec<_>>(),
        vec![0.25, -0.5],
        vec![],
    ];

    let cts = encryption.batch_encrypt(&vectors);
    let decrypted = decryption.batch_decrypt(&cts);
    assert_eq!(decrypted.len(), vectors.len());

    for (values, slots) in vectors.iter().zip(&decrypted) {
        let slots = slots.as_ref().unwrap();
        assert_eq!(slots.len(), 64);
        for (i, &v) in values.iter().enumerate() {
            assert_abs_diff_eq!(slots[i], v, epsilon = 1e-4);
        }
        for &padding in &slots[values.len()..] {
            assert_abs_diff_eq!(padding, 0.0, epsilon = 1e-4);
        }
    }
}

#[test]
fn empty_batch_encrypts_to_empty() {
    let (encryption, decryption, _) = session(4).into_contexts();
    assert!(encryption.batch_encrypt(&[]).is_empty());
    assert!(decryption.batch_decrypt(&[]).is_empty());
}

#[test]
fn batch_keeps_positions_around_a_failure() {
    let session = session(5);
    let mut encryption = session.encryption_context();
    let mut decryption = session.decryption_context();

    let mut vectors = random_unit_vectors(6, 20, 1);
    vectors[3][7] = f64::NAN;

    let (cts, failures) = encryption.batch_encrypt_report(&vectors);
    assert_eq!(cts.len(), 6);
    assert_eq!(cts.iter().filter(|ct| ct.is_none()).count(), 1);
    assert!(cts[3].is_none());
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, 3);
    assert!(matches!(failures[0].1, CkksError::EncodingError { .. }));

    let batched = decryption.batch_decrypt(&cts);
    assert!(batched[3].is_none());
    for (i, values) in vectors.iter().enumerate().filter(|(i, _)| *i != 3) {
        let single = encryption.encrypt(values).unwrap();
        let single = decryption.decrypt(&single).unwrap();
        let batch = batched[i].as_ref().unwrap();
        for j in 0..values.len() {
            assert_abs_diff_eq!(batch[j], single[j], epsilon = 2e-4);
            assert_abs_diff_eq!(batch[j], values[j], epsilon = 1e-4);
        }
    }
}

#[test]
fn oversized_vector_fails_only_its_slot() {
    let (encryption, _, _) = session(3).into_contexts();
    let (cts, failures) = encryption.batch_encrypt_report(&[vec![1.0; 8], vec![1.0; 9]]);
    assert!(cts[0].is_some());
    assert!(cts[1].is_none());
    assert_eq!(failures[0].0, 1);
}

#[test]
fn encrypted_dot_product_matches_plaintext() {
    let session = session(6);
    let (encryption, decryption, evaluation) = session.into_contexts();

    let queries = random_unit_vectors(3, 64, 2);
    let references = random_unit_vectors(4, 64, 3);

    let cts = encryption.batch_encrypt(&queries);
    let products = evaluation.batch_dot_product(&cts, &references).unwrap();
    assert!(products.is_complete());
    assert!(products.first_error().is_none());

    let encrypted = decryption.extract_similarities(&products.results);
    let expected = SimilarityMatrix::compute(&queries, &references);
    assert_eq!(encrypted.shape(), (3, 4));

    for (q, query) in queries.iter().enumerate() {
        for (r, reference) in references.iter().enumerate() {
            let cell = encrypted.get(q, r).unwrap();
            assert_abs_diff_eq!(cell, dot_product(query, reference), epsilon = 1e-4);
        }
    }
    let stats = ErrorStats::between(&encrypted, &expected);
    assert_eq!(stats.count, 12);
    assert!(stats.max_abs < 1e-4);
}

#[test]
fn missing_rows_yield_sentinels() {
    let (encryption, decryption, evaluation) = session(4).into_contexts();
    let references = random_unit_vectors(2, 16, 4);

    let mut cts = encryption.batch_encrypt(&random_unit_vectors(3, 16, 5));
    cts[1] = None;

    let products = evaluation.batch_dot_product(&cts, &references).unwrap();
    assert!(products.results[1].iter().all(Option::is_none));
    assert!(products.results[0].iter().all(Option::is_some));
    assert!(products.is_complete());

    let (matrix, error) = products.into_parts();
    assert!(error.is_none());
    let similarities = decryption.extract_similarities(&matrix);
    assert_eq!(similarities.cells()[1], vec![None, None]);
    assert_eq!(similarities.missing_count(), 2);
    assert_eq!(similarities.into_rows()[1], vec![NULL_SIMILARITY; 2]);
    assert!(decryption.extract_similarities(&[]).is_empty());
}

#[test]
fn oversized_plaintext_is_a_shape_error() {
    let (encryption, _, evaluation) = session(3).into_contexts();
    let cts = encryption.batch_encrypt(&[vec![0.5; 8]]);
    let result = evaluation.batch_dot_product(&cts, &[vec![1.0; 8], vec![1.0; 9]]);
    assert!(matches!(result, Err(CkksError::InvalidInputShape { .. })));
}

#[test]
fn dot_product_at_level_zero_is_depth_exhausted() {
    let session = session(3);
    let mut encryption = session.encryption_context();
    let mut evaluation = session.evaluation_context();

    let ct = encryption.encrypt(&[0.5; 8]).unwrap();
    let bottom = evaluation.evaluator().drop_level(&ct, ct.level()).unwrap();
    assert!(matches!(
        evaluation.dot_product(&bottom, &[1.0; 8]),
        Err(CkksError::DepthExhausted {
            required: 1,
            available: 0
        })
    ));

    let products = evaluation
        .batch_dot_product(&[Some(bottom)], &[vec![1.0; 8]])
        .unwrap();
    assert!(!products.is_complete());
    assert_eq!(products.failures[0].0, (0, 0));
    assert!(matches!(
        products.first_error(),
        Some(CkksError::DepthExhausted { .. })
    ));
}

#[test]
fn malformed_ciphertext_fails_its_cells_without_panicking() {
    let (encryption, _, evaluation) = session(3).into_contexts();
    let mut cts = encryption.batch_encrypt(&[vec![0.5; 8], vec![0.25; 8]]);
    cts[0] = Some(Ciphertext {
        components: Vec::new(),
        scale: 1.0,
    });

    let products = evaluation.batch_dot_product(&cts, &[vec![1.0; 8]]).unwrap();
    assert_eq!(products.failures.len(), 1);
    assert_eq!(products.failures[0].0, (0, 0));
    assert!(matches!(
        products.first_error(),
        Some(CkksError::DegreeMismatch { .. })
    ));
    assert!(products.results[1][0].is_some());
}
