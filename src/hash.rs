use crate::error::{FilterError, Result};
use fnv::FnvHasher;
use murmur3::murmur3_x64_128;
use std::hash::Hasher;
use std::io::Cursor;

/// Seed passed to the hash function by every filter in the crate.
pub const HASH_SEED: u32 = 42;

/// Positions are derived from two 32 bit halves of one hash, so a bit vector
/// can not be addressed beyond the 32 bit range.
pub const MAX_BIT_VECTOR_SIZE: usize = u32::MAX as usize;

/// A type alias for the 64 bit keyed hash used by all filters.
///
/// **Parameters:**
///
/// - `key: &[u8]`
///   - A byte slice representing the item to be hashed.
/// - `seed: u32`
///   - Hash seed. Filters always pass [`HASH_SEED`].
///
/// **Returns:**
///
/// - `u64`
///   - A hash value, expected to be deterministic for identical `(key, seed)`
///     and uniformly distributed over all 64 bits.
///
/// **Usage:**
///
/// The hash is computed once per key; [`positions`] splits it into two halves
/// and combines them into `num_hashes` bit positions (double hashing).
pub type HashFunction = fn(&[u8], u32) -> u64;

/// Murmur3 x64 128, truncated to its low 64 bits.
pub fn default_hash_function(key: &[u8], seed: u32) -> u64 {
    let mut cursor = Cursor::new(key);
    murmur3_x64_128(&mut cursor, seed).expect("Failed to compute Murmur3 hash")
        as u64
}

/// FNV-1a 64 over the little endian seed followed by the key.
pub fn fnv_hash64(key: &[u8], seed: u32) -> u64 {
    let mut hasher = FnvHasher::default();
    hasher.write(&seed.to_le_bytes());
    hasher.write(key);
    hasher.finish()
}

/// Derives `num_hashes` positions in `[0, bit_vector_size)` for `key`.
///
/// The hash `H` is split into its high half `a` and low half `b`, and the
/// `i`-th position (1 based) is `(a + b * i) mod m`. The arithmetic is done in
/// unsigned 64 bit space so every position is non-negative by construction.
pub fn positions(
    key: &[u8],
    num_hashes: usize,
    bit_vector_size: usize,
    hash_function: HashFunction,
) -> Vec<u32> {
    let h = hash_function(key, HASH_SEED);
    let a = h >> 32;
    let b = h & 0xFFFF_FFFF;
    let m = bit_vector_size as u64;

    (1..=num_hashes as u64)
        .map(|i| (a.wrapping_add(b.wrapping_mul(i)) % m) as u32)
        .collect()
}

/// `m = ceil(n * ln(p) / -(ln 2)^2)`, rejecting sizes the index derivation
/// can not address.
pub fn optimal_bit_vector_size(n: usize, fpr: f64) -> Result<usize> {
    let ln2 = std::f64::consts::LN_2;
    let size = ((-(n as f64) * fpr.ln()) / (ln2 * ln2)).ceil();
    if !size.is_finite() || size > MAX_BIT_VECTOR_SIZE as f64 {
        return Err(FilterError::Overflow {
            requested: size,
            max: MAX_BIT_VECTOR_SIZE,
        });
    }
    Ok((size as usize).max(1))
}

/// `k = ceil((m / n) * ln 2)`, never less than one.
pub fn optimal_num_hashes(n: usize, m: usize) -> usize {
    let k = ((m as f64 / n as f64) * std::f64::consts::LN_2).ceil() as usize;
    k.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_are_deterministic() {
        let first = positions(b"alma", 7, 14_378, default_hash_function);
        let second = positions(b"alma", 7, 14_378, default_hash_function);
        assert_eq!(first, second);
        assert_eq!(first.len(), 7);
    }

    #[test]
    fn test_positions_stay_in_range() {
        for m in [1usize, 2, 3, 17, 1024, 999_983] {
            for i in 0..200u32 {
                let key = i.to_be_bytes();
                for idx in positions(&key, 9, m, default_hash_function) {
                    assert!((idx as usize) < m, "{idx} out of range for m={m}");
                }
            }
        }
    }

    #[test]
    fn test_positions_follow_double_hashing() {
        fn fixed(_: &[u8], _: u32) -> u64 {
            (3u64 << 32) | 5
        }
        // a = 3, b = 5: 3 + 5i mod 11 for i = 1..=4
        assert_eq!(positions(b"x", 4, 11, fixed), vec![8, 2, 7, 1]);
    }

    #[test]
    fn test_hash_seed_matters() {
        assert_ne!(
            default_hash_function(b"korte", HASH_SEED),
            default_hash_function(b"korte", HASH_SEED + 1)
        );
        assert_ne!(fnv_hash64(b"korte", 1), fnv_hash64(b"korte", 2));
    }

    #[test]
    fn test_optimal_parameters() {
        let m = optimal_bit_vector_size(1000, 0.001).unwrap();
        assert_eq!(m, 14_378);
        assert_eq!(optimal_num_hashes(1000, m), 10);
    }

    #[test]
    fn test_optimal_size_overflow() {
        let err = optimal_bit_vector_size(usize::MAX / 2, 1e-9).unwrap_err();
        assert!(matches!(err, FilterError::Overflow { .. }));
    }
}
