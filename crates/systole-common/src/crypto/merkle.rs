//! Binary Merkle tree over ledger entry hashes
//!
//! Used for cheap external auditing: a single root digest summarizes the
//! whole chain without re-walking it. Levels with an odd node count pad by
//! duplicating the last hash.

/// Hash size in bytes (BLAKE3 output)
pub const HASH_SIZE: usize = 32;

/// Hash two child nodes to create their parent
#[inline]
pub fn hash_pair(left: &[u8; HASH_SIZE], right: &[u8; HASH_SIZE]) -> [u8; HASH_SIZE] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(left);
    hasher.update(right);
    *hasher.finalize().as_bytes()
}

/// Hash raw data to create a leaf hash
#[inline]
pub fn hash_leaf(data: &[u8]) -> [u8; HASH_SIZE] {
    *blake3::hash(data).as_bytes()
}

/// Compute the Merkle root over a sequence of leaf hashes
///
/// Returns `None` for an empty input. A single leaf is its own root.
pub fn merkle_root(leaves: &[[u8; HASH_SIZE]]) -> Option<[u8; HASH_SIZE]> {
    if leaves.is_empty() {
        return None;
    }

    let mut level: Vec<[u8; HASH_SIZE]> = leaves.to_vec();
    while level.len() > 1 {
        if level.len() % 2 == 1 {
            // Odd node count: duplicate the last hash
            let last = *level.last().expect("level is non-empty");
            level.push(last);
        }
        level = level
            .chunks_exact(2)
            .map(|pair| hash_pair(&pair[0], &pair[1]))
            .collect();
    }

    Some(level[0])
}
