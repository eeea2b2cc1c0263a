use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::key::Key;

pub fn stable_hash_with(f: impl FnOnce(&mut DefaultHasher)) -> u64 {
    let mut hasher = DefaultHasher::new();
    f(&mut hasher);
    hasher.finish()
}

pub fn stable_hash_key(seed: u64, key: &Key) -> u64 {
    stable_hash_with(|hasher| {
        seed.hash(hasher);
        key.hash(hasher);
    })
}
