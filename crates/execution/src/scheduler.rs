//! Worker pool sizing and the parallel executor.

use crate::ExecutionError;
use cuke_core::{ConfigError, Configuration};
use std::num::NonZeroUsize;
use tracing::debug;

/// Key selecting how the pool is sized.
pub const STRATEGY_KEY: &str = "strategy";
/// Factor applied to the processor count by the dynamic strategy.
pub const DYNAMIC_FACTOR_KEY: &str = "dynamic.factor";
/// Pool size used by the fixed strategy.
pub const FIXED_PARALLELISM_KEY: &str = "fixed.parallelism";
/// Upper bound on the pool size, whatever the strategy.
pub const MAX_POOL_SIZE_KEY: &str = "max-pool-size";

/// Pool size cap when `max-pool-size` is not set.
pub const DEFAULT_MAX_POOL_SIZE: usize = 256;

/// How the worker pool is sized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParallelStrategy {
    /// `factor` times the available processors
    Dynamic {
        /// Multiplier, strictly positive
        factor: f64,
    },
    /// A fixed number of workers
    Fixed {
        /// Number of workers
        parallelism: NonZeroUsize,
    },
}

/// Parallel executor settings, read from the parallel-scoped configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParallelConfig {
    /// Pool sizing strategy
    pub strategy: ParallelStrategy,
    /// The pool never grows past this
    pub max_pool_size: NonZeroUsize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            strategy: ParallelStrategy::Dynamic { factor: 1.0 },
            max_pool_size: NonZeroUsize::new(DEFAULT_MAX_POOL_SIZE).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl ParallelConfig {
    /// Read settings from a view already scoped to the parallel prefix.
    pub fn from_configuration(scoped: &Configuration) -> Result<Self, ConfigError> {
        let strategy = match scoped.get(STRATEGY_KEY).map(|s| s.trim().to_ascii_lowercase()) {
            None => Self::dynamic(scoped)?,
            Some(s) if s == "dynamic" => Self::dynamic(scoped)?,
            Some(s) if s == "fixed" => {
                let parallelism = scoped
                    .get_usize(FIXED_PARALLELISM_KEY)?
                    .ok_or_else(|| ConfigError::MissingValue {
                        key: scoped.qualify(FIXED_PARALLELISM_KEY),
                    })?;
                ParallelStrategy::Fixed {
                    parallelism: positive(scoped, FIXED_PARALLELISM_KEY, parallelism)?,
                }
            }
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: scoped.qualify(STRATEGY_KEY),
                    value: other,
                    expected: "'dynamic' or 'fixed'",
                })
            }
        };

        let max_pool_size = match scoped.get_usize(MAX_POOL_SIZE_KEY)? {
            Some(max) => positive(scoped, MAX_POOL_SIZE_KEY, max)?,
            None => Self::default().max_pool_size,
        };
        Ok(Self {
            strategy,
            max_pool_size,
        })
    }

    fn dynamic(scoped: &Configuration) -> Result<ParallelStrategy, ConfigError> {
        let factor = scoped.get_f64(DYNAMIC_FACTOR_KEY)?.unwrap_or(1.0);
        if !factor.is_finite() || factor <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: scoped.qualify(DYNAMIC_FACTOR_KEY),
                value: factor.to_string(),
                expected: "a positive number",
            });
        }
        Ok(ParallelStrategy::Dynamic { factor })
    }

    /// Number of workers given `available` processors.
    ///
    /// Never zero, never above `max_pool_size`.
    pub fn parallelism(&self, available: usize) -> usize {
        let wanted = match self.strategy {
            ParallelStrategy::Dynamic { factor } => ((available as f64 * factor) as usize).max(1),
            ParallelStrategy::Fixed { parallelism } => parallelism.get(),
        };
        wanted.min(self.max_pool_size.get())
    }
}

fn positive(scoped: &Configuration, key: &str, value: usize) -> Result<NonZeroUsize, ConfigError> {
    NonZeroUsize::new(value).ok_or_else(|| ConfigError::InvalidValue {
        key: scoped.qualify(key),
        value: value.to_string(),
        expected: "a positive integer",
    })
}

/// Number of processors available to this process.
pub fn available_processors() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Executes subtrees on a bounded work-stealing pool.
#[derive(Debug)]
pub struct ParallelExecutor {
    pool: rayon::ThreadPool,
}

impl ParallelExecutor {
    /// Build an executor from a view scoped to the parallel prefix.
    pub fn new(scoped: &Configuration) -> Result<Self, ExecutionError> {
        let config = ParallelConfig::from_configuration(scoped)?;
        Self::with_config(config)
    }

    /// Build an executor from explicit settings.
    pub fn with_config(config: ParallelConfig) -> Result<Self, ExecutionError> {
        let parallelism = config.parallelism(available_processors());
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(parallelism)
            .thread_name(|i| format!("cucumber-worker-{}", i))
            .build()?;
        debug!("Started worker pool with {} thread(s)", parallelism);
        Ok(Self { pool })
    }

    /// Number of worker threads.
    pub fn parallelism(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `op` inside the pool.
    pub(crate) fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        self.pool.install(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cuke_core::PARALLEL_CONFIG_PREFIX;

    fn scoped(pairs: &[(&str, &str)]) -> Configuration {
        Configuration::from_pairs(
            pairs
                .iter()
                .map(|(k, v)| (format!("{}{}", PARALLEL_CONFIG_PREFIX, k), v.to_string())),
        )
        .scoped(PARALLEL_CONFIG_PREFIX)
    }

    #[test]
    fn test_default_is_dynamic() {
        let config = ParallelConfig::from_configuration(&scoped(&[])).unwrap();
        assert_eq!(config, ParallelConfig::default());
        assert_eq!(config.parallelism(8), 8);
    }

    #[test]
    fn test_dynamic_factor() {
        let config = ParallelConfig::from_configuration(&scoped(&[("dynamic.factor", "0.5")])).unwrap();
        assert_eq!(config.parallelism(8), 4);
        assert_eq!(config.parallelism(1), 1);

        let err = ParallelConfig::from_configuration(&scoped(&[("dynamic.factor", "0")])).unwrap_err();
        assert!(err.to_string().contains("cucumber.execution.parallel.config.dynamic.factor"));
    }

    #[test]
    fn test_fixed_parallelism() {
        let config = ParallelConfig::from_configuration(&scoped(&[
            ("strategy", "Fixed"),
            ("fixed.parallelism", "3"),
        ]))
        .unwrap();
        assert_eq!(config.parallelism(64), 3);

        assert!(matches!(
            ParallelConfig::from_configuration(&scoped(&[("strategy", "fixed")])),
            Err(ConfigError::MissingValue { .. })
        ));
        assert!(matches!(
            ParallelConfig::from_configuration(&scoped(&[
                ("strategy", "fixed"),
                ("fixed.parallelism", "0"),
            ])),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_pool_size_is_capped() {
        let huge_fixed = ParallelConfig::from_configuration(&scoped(&[
            ("strategy", "fixed"),
            ("fixed.parallelism", "1000000000"),
        ]))
        .unwrap();
        assert_eq!(huge_fixed.parallelism(8), DEFAULT_MAX_POOL_SIZE);

        let huge_factor =
            ParallelConfig::from_configuration(&scoped(&[("dynamic.factor", "1e9")])).unwrap();
        assert_eq!(huge_factor.parallelism(8), DEFAULT_MAX_POOL_SIZE);

        let capped = ParallelConfig::from_configuration(&scoped(&[
            ("strategy", "fixed"),
            ("fixed.parallelism", "64"),
            ("max-pool-size", "4"),
        ]))
        .unwrap();
        assert_eq!(capped.parallelism(8), 4);

        assert!(matches!(
            ParallelConfig::from_configuration(&scoped(&[("max-pool-size", "0")])),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_unknown_strategy() {
        assert!(matches!(
            ParallelConfig::from_configuration(&scoped(&[("strategy", "custom")])),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_executor_pool_size() {
        let executor = ParallelExecutor::new(&scoped(&[
            ("strategy", "fixed"),
            ("fixed.parallelism", "2"),
        ]))
        .unwrap();
        assert_eq!(executor.parallelism(), 2);
    }
}
