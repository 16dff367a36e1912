pub mod peterson;

/// Mutex built from plain shared memory, released when its guard drops.
///
/// 1. Mutual Exclusion - spinlocks on shared variables in the mutex to guarantee only one enters the critical section.
/// 2. No Deadlock - whoever spins is only blocked by a party that is guaranteed to make progress.
pub trait Mutex: Sized {
    // &mut guarantees no double acquire within the same scope, at compile time
    fn acquire(&mut self) -> MutexGuard<'_, Self>;
    // Only called by MutexGuard::drop
    fn release(&mut self);
}

#[derive(Debug)]
pub struct MutexGuard<'a, M: Mutex> {
    pub(crate) mutex: &'a mut M,
}

impl<M: Mutex> Drop for MutexGuard<'_, M> {
    fn drop(&mut self) {
        self.mutex.release()
    }
}
