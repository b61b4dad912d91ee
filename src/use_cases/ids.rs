use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out player ids as `offset + players spawned so far`.
///
/// The counter never goes back down when players leave, so an id is never shared
/// by two live players even when joins race each other.
#[derive(Debug)]
pub struct PlayerIdAllocator {
    next: AtomicU64,
}

impl PlayerIdAllocator {
    pub fn new(offset: u64) -> Self {
        Self {
            next: AtomicU64::new(offset),
        }
    }

    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}
