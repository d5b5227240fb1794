//! Matches noisy query names against a reference list without revealing
//! the queries to the evaluating side.
//!
//! Run with `RUST_LOG=debug` to see the pipeline's tracing output.

use ckks_similarity::{
    Session, SimilarityMatrix,
    compression::{Filter, SpectralCompressor},
    similarity::{ErrorStats, normalize},
};
use tracing_subscriber::EnvFilter;

const LOG_SLOTS: u32 = 8;
const FEATURES: usize = 256;

/// Hashed character-bigram counts, normalised to unit length.
fn vectorize(name: &str) -> Vec<f64> {
    let mut features = vec![0.0; FEATURES];
    let chars: Vec<char> = format!(" {} ", name.to_lowercase()).chars().collect();
    for pair in chars.windows(2) {
        let hash = (pair[0] as usize).wrapping_mul(31).wrapping_add(pair[1] as usize);
        features[hash % FEATURES] += 1.0;
    }
    normalize(&features)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let references = ["Ada Lovelace", "Alan Turing", "Grace Hopper", "Edsger Dijkstra"];
    let queries = ["alan turnig", "grace hoper", "Ada King Lovelace"];

    let reference_vectors: Vec<Vec<f64>> = references.iter().map(|n| vectorize(n)).collect();
    let query_vectors: Vec<Vec<f64>> = queries.iter().map(|n| vectorize(n)).collect();

    println!("🔐 Creating session with {} slots", 1usize << LOG_SLOTS);
    let session = Session::builder().log_slots(LOG_SLOTS).build()?;
    let (encryption, decryption, evaluation) = session.into_contexts();

    let cts = encryption.batch_encrypt(&query_vectors);
    println!("✅ Encrypted {} queries", cts.iter().flatten().count());

    let products = evaluation.batch_dot_product(&cts, &reference_vectors)?;
    if let Some(error) = products.first_error() {
        println!("⚠️  Some dot products failed: {error}");
    }
    let encrypted = decryption.extract_similarities(&products.results);
    let plain = SimilarityMatrix::compute(&query_vectors, &reference_vectors);

    for (row, query) in queries.iter().enumerate() {
        match encrypted.best_match(row) {
            Some((col, score)) => {
                println!("🔎 {query:<20} → {:<16} ({score:.4})", references[col])
            }
            None => println!("🔎 {query:<20} → no result"),
        }
    }

    let stats = ErrorStats::between(&encrypted, &plain);
    println!(
        "\n📊 Encrypted vs plaintext: rmse {:.2e}, max {:.2e} over {} cells",
        stats.rmse, stats.max_abs, stats.count
    );

    // Spectral compression trades accuracy for fewer values.
    let compressor = SpectralCompressor::new(Filter::LowPass { cutoff: 64 });
    let compressed_refs = compressor.compress_batch(&reference_vectors)?;
    let compressed_queries = compressor.compress_batch(&query_vectors)?;
    println!(
        "\n🗜️  Compressed {FEATURES} → {} values (ratio {:.2})",
        compressed_refs[0].len(),
        compressor.compression_ratio(FEATURES)?
    );
    let compressed = SimilarityMatrix::compute(&compressed_queries, &compressed_refs);
    let drift = ErrorStats::between(&compressed, &plain);
    println!("📉 Compression drift: mae {:.4}, max {:.4}", drift.mae, drift.max_abs);

    Ok(())
}
