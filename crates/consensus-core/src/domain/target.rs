//! # Target Derivation
//!
//! Maps a difficulty integer to the 256-bit ceiling a block hash must fall
//! under: `target = 2^(256 - difficulty)`, big-endian, 32 bytes.
//!
//! ## Boundary Behavior
//!
//! - `difficulty = 0`: `2^256` needs 33 bytes. The leading 32 bytes are kept,
//!   giving `0x01 00 .. 00` (= `2^248`). Existing chains depend on this, so it
//!   is preserved even though it breaks monotonicity between 0 and 1.
//! - `difficulty > 256`: no 256-bit hash can qualify; the target is all zeros.

use primitive_types::U256;

/// A 32-byte big-endian proof-of-work target.
pub type Target = [u8; 32];

/// Compute `2^(256 - difficulty)` as a 32-byte big-endian target.
pub fn target_for(difficulty: u64) -> Target {
    let mut target = [0u8; 32];
    match difficulty {
        0 => {
            // Leading bytes of the 33-byte encoding of 2^256.
            target[0] = 0x01;
        }
        d if d > 256 => {}
        d => {
            let value = U256::one() << (256 - d) as usize;
            value.to_big_endian(&mut target);
        }
    }
    target
}

/// Byte-lexicographic `hash < target`, stopping at the first differing byte.
///
/// Public validity check, so no constant-time requirement.
pub fn hash_less_than(hash: &[u8; 32], target: &Target) -> bool {
    for (h, t) in hash.iter().zip(target.iter()) {
        if h < t {
            return true;
        }
        if h > t {
            return false;
        }
    }
    false
}

/// Whether `hash` satisfies the target derived from `difficulty`.
#[inline]
pub fn meets_difficulty(hash: &[u8; 32], difficulty: u64) -> bool {
    hash_less_than(hash, &target_for(difficulty))
}
