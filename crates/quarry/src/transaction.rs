use std::sync::{Condvar, Mutex};

use quarry_core::{Error, Result};

use crate::Database;

#[derive(Debug)]
struct SlotState {
    active: usize,
    /// Zero means unbounded.
    max: usize,
    /// When full: block until a slot frees, or fail fast.
    block: bool,
}

/// Bounded count of concurrently open transactions.
#[derive(Debug)]
pub(crate) struct TxSlots {
    state: Mutex<SlotState>,
    freed: Condvar,
}

impl TxSlots {
    pub(crate) fn unbounded() -> Self {
        Self {
            state: Mutex::new(SlotState {
                active: 0,
                max: 0,
                block: true,
            }),
            freed: Condvar::new(),
        }
    }

    pub(crate) fn configure(&self, max: usize, block: bool) {
        let mut state = self.state.lock().unwrap();
        state.max = max;
        state.block = block;
        self.freed.notify_all();
    }

    pub(crate) fn acquire(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        loop {
            if state.max == 0 || state.active < state.max {
                state.active += 1;
                return Ok(());
            }
            if !state.block {
                return Err(Error::TransactionLimit);
            }
            state = self.freed.wait(state).unwrap();
        }
    }

    pub(crate) fn release(&self) {
        let mut state = self.state.lock().unwrap();
        state.active = state.active.saturating_sub(1);
        self.freed.notify_one();
    }
}

/// An open transaction tied to its [`Database`].
///
/// Commit and rollback consume the transaction; dropping one that was
/// neither committed nor rolled back issues a rollback. Either way the
/// transaction slot is released exactly once.
#[derive(Debug)]
pub struct Transaction<'db> {
    db: &'db Database,
    done: bool,
}

impl<'db> Transaction<'db> {
    pub(crate) fn new(db: &'db Database) -> Self {
        Self { db, done: false }
    }

    pub fn commit(mut self) -> Result<()> {
        tracing::debug!("commit transaction");
        self.done = true;
        self.db.connection().commit()
    }

    pub fn rollback(mut self) -> Result<()> {
        tracing::debug!("rollback transaction");
        self.done = true;
        self.db.connection().rollback()
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.done {
            tracing::debug!("rollback abandoned transaction");
            let _ = self.db.connection().rollback();
        }
        self.db.slots().release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_slots_never_block() {
        let slots = TxSlots::unbounded();
        for _ in 0..64 {
            slots.acquire().unwrap();
        }
    }

    #[test]
    fn fail_fast_when_full() {
        let slots = TxSlots::unbounded();
        slots.configure(1, false);
        slots.acquire().unwrap();
        assert!(slots.acquire().unwrap_err().is_transaction_limit());

        slots.release();
        slots.acquire().unwrap();
    }

    #[test]
    fn blocking_acquire_waits_for_release() {
        use std::sync::Arc;

        let slots = Arc::new(TxSlots::unbounded());
        slots.configure(1, true);
        slots.acquire().unwrap();

        let shared = slots.clone();
        let waiter = std::thread::spawn(move || {
            shared.acquire().unwrap();
            shared.release();
        });

        std::thread::sleep(std::time::Duration::from_millis(20));
        slots.release();
        waiter.join().unwrap();
    }
}
