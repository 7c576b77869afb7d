use rand::random;
use tracing_subscriber::EnvFilter;

/// Install a test subscriber once, honouring `RUST_LOG`
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Deterministic keys, distinct for distinct indices
#[allow(dead_code)]
pub fn generate_test_items(count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| format!("test_item_{:06}", i).into_bytes())
        .collect()
}

/// Random keys that can not collide with [`generate_test_items`]
#[allow(dead_code)]
pub fn generate_random_items(count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|_| format!("random_{:016x}", random::<u64>()).into_bytes())
        .collect()
}
