// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded pool of backend connection permits.
//!
//! A request borrows one permit per generation call; the permit returns
//! to the pool on drop, including on panics and cancellations. When the
//! pool is exhausted the caller waits up to the per-attempt timeout.

use std::sync::Arc;
use std::time::Duration;

use plaza_core::PlazaError;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counting-semaphore pool bounding concurrent backend calls.
#[derive(Debug, Clone)]
pub struct BackendPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl BackendPool {
    pub fn new(size: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// Borrow a permit, waiting up to `timeout`.
    pub async fn acquire(&self, timeout: Duration) -> Result<OwnedSemaphorePermit, PlazaError> {
        match tokio::time::timeout(timeout, Arc::clone(&self.permits).acquire_owned()).await {
            Ok(Ok(permit)) => Ok(permit),
            Ok(Err(_)) => Err(PlazaError::Internal(
                "backend pool semaphore closed".to_string(),
            )),
            Err(_) => Err(PlazaError::GenerationTimeout { duration: timeout }),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Permits currently free (for monitoring and tests).
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}
