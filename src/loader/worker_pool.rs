//! Bounded worker pools for metadata reads.

use std::sync::Arc;

use log::info;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

use crate::config::LoaderConfig;

/// Share of the available cores a pool may occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyTier {
    Low,
    #[default]
    Medium,
    High,
    Highest,
}

impl ConcurrencyTier {
    fn core_fraction(self) -> (usize, usize) {
        match self {
            ConcurrencyTier::Low => (1, 4),
            ConcurrencyTier::Medium => (1, 2),
            ConcurrencyTier::High => (3, 4),
            ConcurrencyTier::Highest => (1, 1),
        }
    }

    /// Worker count for `available_cores`, never below `minimum_workers`.
    pub fn worker_count(self, available_cores: usize, minimum_workers: usize) -> usize {
        let (numerator, denominator) = self.core_fraction();
        (available_cores * numerator / denominator).max(minimum_workers.max(1))
    }
}

pub fn available_cores() -> usize {
    std::thread::available_parallelism()
        .map(|count| count.get())
        .unwrap_or(1)
}

/// Interactive and background pools. They never share a queue, so a bulk
/// library scan cannot hold up a user-initiated load.
#[derive(Debug, Clone)]
pub struct WorkerPools {
    interactive: Arc<ThreadPool>,
    background: Arc<ThreadPool>,
}

fn build_pool(name: &'static str, workers: usize) -> Result<ThreadPool, ThreadPoolBuildError> {
    ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(move |index| format!("{name}-{index}"))
        .build()
}

impl WorkerPools {
    pub fn new(config: &LoaderConfig) -> Result<Self, ThreadPoolBuildError> {
        let cores = available_cores();
        let interactive_workers = config
            .interactive_tier
            .worker_count(cores, config.minimum_workers);
        let background_workers = config
            .background_tier
            .worker_count(cores, config.minimum_workers);
        info!(
            "WorkerPools: {} interactive / {} background workers on {} core(s)",
            interactive_workers, background_workers, cores
        );
        Ok(Self {
            interactive: Arc::new(build_pool("trackdeck-interactive", interactive_workers)?),
            background: Arc::new(build_pool("trackdeck-background", background_workers)?),
        })
    }

    pub fn interactive(&self) -> Arc<ThreadPool> {
        Arc::clone(&self.interactive)
    }

    pub fn background(&self) -> Arc<ThreadPool> {
        Arc::clone(&self.background)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConcurrencyTier, WorkerPools};
    use crate::config::LoaderConfig;

    #[test]
    fn test_tiers_scale_with_cores() {
        assert_eq!(ConcurrencyTier::Low.worker_count(16, 4), 4);
        assert_eq!(ConcurrencyTier::Medium.worker_count(16, 4), 8);
        assert_eq!(ConcurrencyTier::High.worker_count(16, 4), 12);
        assert_eq!(ConcurrencyTier::Highest.worker_count(16, 4), 16);
    }

    #[test]
    fn test_minimum_workers_is_a_floor() {
        assert_eq!(ConcurrencyTier::Highest.worker_count(2, 4), 4);
        assert_eq!(ConcurrencyTier::Low.worker_count(1, 0), 1);
    }

    #[test]
    fn test_pools_are_independent() {
        let config = LoaderConfig {
            interactive_tier: ConcurrencyTier::Highest,
            background_tier: ConcurrencyTier::Low,
            minimum_workers: 2,
        };
        let pools = WorkerPools::new(&config).expect("pools should build");
        assert!(pools.interactive().current_num_threads() >= 2);
        assert!(pools.background().current_num_threads() >= 2);
        assert!(
            pools.interactive().current_num_threads()
                >= pools.background().current_num_threads()
        );
    }
}
