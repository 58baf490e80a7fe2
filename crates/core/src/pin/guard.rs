//! Single-flight latch for authorization calls.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Latch allowing at most one authorization request in flight.
///
/// Clones share the same latch, so every trigger source (auto-submit, confirm
/// button, re-entrant redraw) can hold a handle and still collapse into one
/// network call.
#[derive(Debug, Clone, Default)]
pub struct SingleFlightGuard {
    in_flight: Arc<AtomicBool>,
}

impl SingleFlightGuard {
    /// Creates a released guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the latch. Returns false if it is already held.
    pub fn try_acquire(&self) -> bool {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Releases the latch.
    pub fn release(&self) {
        self.in_flight.store(false, Ordering::Release);
    }

    /// Returns true while a request is in flight.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Takes the latch and returns a permit that releases it on drop.
    ///
    /// Dropping covers every exit path: normal return, early `?`, panic
    /// unwinding and a cancelled future.
    #[must_use]
    pub fn acquire_permit(&self) -> Option<FlightPermit> {
        self.try_acquire().then(|| FlightPermit {
            guard: self.clone(),
        })
    }

    /// Runs `f` only if the latch is free, holding it until `f` settles.
    ///
    /// Returns `None` without calling `f` when another request is in flight.
    pub async fn run<F, Fut, T>(&self, f: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _permit = self.acquire_permit()?;
        Some(f().await)
    }
}

/// Proof that the holder owns the single-flight latch.
#[derive(Debug)]
pub struct FlightPermit {
    guard: SingleFlightGuard,
}

impl Drop for FlightPermit {
    fn drop(&mut self) {
        self.guard.release();
    }
}
