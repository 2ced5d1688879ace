//! Cooperative cancellation and deadlines for RQA runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::primitives::errors::{Result, RqaError};

/// Shared flag a caller flips to abandon an in-flight run.
///
/// Clones observe the same flag. Compute units check it between blocks, so a
/// block that already started runs to completion but its output is dropped.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token in the non-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Returns `true` once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Combined cancellation token and deadline checked before each block.
#[derive(Debug, Clone, Default)]
pub struct RunGuard {
    /// Optional caller-held cancellation token.
    pub cancellation: Option<CancellationToken>,

    /// Optional wall-clock deadline.
    pub deadline: Option<Instant>,
}

impl RunGuard {
    /// Create a guard from its parts.
    pub fn new(cancellation: Option<CancellationToken>, deadline: Option<Instant>) -> Self {
        Self {
            cancellation,
            deadline,
        }
    }

    /// Fail with `Cancelled` or `DeadlineExceeded` if the run must stop.
    #[inline]
    pub fn check(&self) -> Result<()> {
        if self
            .cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
        {
            return Err(RqaError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(RqaError::DeadlineExceeded);
        }
        Ok(())
    }
}
