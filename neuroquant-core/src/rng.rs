//! Deterministic RNG hierarchy.
//!
//! A master seed expands into one sub-seed per `(run_id, episode)` pair via
//! BLAKE3, so episode randomness does not depend on the order in which
//! episodes are scheduled across threads.

use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RngHierarchy {
    master_seed: u64,
}

impl RngHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Derive the sub-seed for one episode of a run.
    pub fn sub_seed(&self, run_id: &str, episode: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(run_id.as_bytes());
        hasher.update(&episode.to_le_bytes());
        let hash = hasher.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(head)
    }

    pub fn rng_for(&self, run_id: &str, episode: u64) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(run_id, episode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn sub_seeds_are_deterministic() {
        let h = RngHierarchy::new(42);
        assert_eq!(h.sub_seed("run-a", 0), h.sub_seed("run-a", 0));
    }

    #[test]
    fn episodes_and_runs_get_distinct_seeds() {
        let h = RngHierarchy::new(42);
        assert_ne!(h.sub_seed("run-a", 0), h.sub_seed("run-a", 1));
        assert_ne!(h.sub_seed("run-a", 0), h.sub_seed("run-b", 0));
    }

    #[test]
    fn derivation_order_independent() {
        let h = RngHierarchy::new(7);
        let forward: Vec<u64> = (0..4).map(|e| h.sub_seed("r", e)).collect();
        let mut backward: Vec<u64> = (0..4).rev().map(|e| h.sub_seed("r", e)).collect();
        backward.reverse();
        assert_eq!(forward, backward);
    }

    #[test]
    fn master_seed_changes_output() {
        assert_ne!(
            RngHierarchy::new(42).sub_seed("r", 0),
            RngHierarchy::new(43).sub_seed("r", 0)
        );
    }

    #[test]
    fn rng_streams_replay() {
        let h = RngHierarchy::new(1);
        let draw = || -> Vec<u32> {
            h.rng_for("r", 3)
                .sample_iter(rand::distributions::Standard)
                .take(5)
                .collect()
        };
        let (a, b) = (draw(), draw());
        assert_eq!(a, b);
    }
}
