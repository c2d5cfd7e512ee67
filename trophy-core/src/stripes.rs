use std::hash::{DefaultHasher, Hash, Hasher};
use tokio::sync::{Mutex, MutexGuard};

/// Fixed set of async locks selected by hashing a key.
///
/// Two equal keys always map to the same lock, distinct keys may share one.
pub struct Stripes {
    locks: Box<[Mutex<()>]>,
}

impl Stripes {
    pub const DEFAULT_COUNT: usize = 64;

    pub fn new(count: usize) -> Self {
        Self {
            locks: (0..count.max(1)).map(|_| Mutex::new(())).collect(),
        }
    }

    pub fn index(&self, key: &impl Hash) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.locks.len() as u64) as usize
    }

    pub async fn lock(&self, key: &impl Hash) -> MutexGuard<'_, ()> {
        self.locks[self.index(key)].lock().await
    }
}

impl Default for Stripes {
    fn default() -> Self {
        Self::new(Self::DEFAULT_COUNT)
    }
}
