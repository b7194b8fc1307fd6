//! Backend configuration.
//!
//! Settings can be given in code or read from the environment:
//!
//! - `STRIDED_BLAS_ROTG`: complex `rotg` strategy (`lapack` or `phase-of-a`)
//! - `STRIDED_BLAS_THREADS`: worker count for batched GEMM (`parallel` feature)

use crate::rotation::RotgStrategy;
use crate::{BlasError, Result};

pub const ENV_ROTG: &str = "STRIDED_BLAS_ROTG";
pub const ENV_THREADS: &str = "STRIDED_BLAS_THREADS";

/// Settings of a [`ReferenceBackend`](crate::ReferenceBackend).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlasConfig {
    pub rotg: RotgStrategy,
    /// Number of workers; `1` keeps every kernel on the calling thread.
    pub threads: usize,
}

impl Default for BlasConfig {
    fn default() -> Self {
        BlasConfig {
            rotg: RotgStrategy::Lapack,
            threads: 1,
        }
    }
}

impl BlasConfig {
    /// Defaults overridden by `STRIDED_BLAS_ROTG` and `STRIDED_BLAS_THREADS`.
    ///
    /// Unset or empty variables keep the default; unparsable ones are a
    /// parameter error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), with variables taken from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = BlasConfig::default();
        if let Some(v) = lookup(ENV_ROTG).filter(|v| !v.trim().is_empty()) {
            config.rotg = RotgStrategy::from_name(&v)?;
        }
        if let Some(v) = lookup(ENV_THREADS).filter(|v| !v.trim().is_empty()) {
            config.threads = parse_threads(&v)?;
        }
        Ok(config)
    }

    pub fn with_rotg(mut self, rotg: RotgStrategy) -> Self {
        self.rotg = rotg;
        self
    }

    /// Set the worker count; `0` is clamped to `1`.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }
}

fn parse_threads(v: &str) -> Result<usize> {
    match v.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(BlasError::parameter("threads", v)),
    }
}
