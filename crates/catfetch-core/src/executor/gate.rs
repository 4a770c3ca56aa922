//! Admission gate: counting semaphore over simultaneous body transfers.
//!
//! Also records how many slots are held right now and the highest number
//! ever held at once, so callers can check the ceiling was honoured.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    ceiling: usize,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

/// One held slot. Released when dropped.
#[derive(Debug)]
pub struct Slot {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for Slot {
    fn drop(&mut self) {
        // Runs before the permit field is dropped, so the counter never exceeds the permits held.
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

impl AdmissionGate {
    /// Gate admitting at most `ceiling` holders (minimum 1).
    pub fn new(ceiling: usize) -> Self {
        let ceiling = ceiling.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(ceiling)),
            ceiling,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wait for a free slot.
    pub async fn acquire(&self) -> Result<Slot, AcquireError> {
        let permit = Arc::clone(&self.semaphore).acquire_owned().await?;
        let now = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(now, Ordering::AcqRel);
        Ok(Slot {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Slots held right now.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Highest number of slots held at once since the gate was created.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }
}
