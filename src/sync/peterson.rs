use super::{Mutex, MutexGuard};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// One of the two fixed participants of a [`TwoPartyLock`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Zero,
    One,
}

impl Role {
    pub fn index(self) -> usize {
        match self {
            Role::Zero => 0,
            Role::One => 1,
        }
    }

    pub fn other(self) -> Role {
        match self {
            Role::Zero => Role::One,
            Role::One => Role::Zero,
        }
    }

    fn favored_bit(self) -> bool {
        self == Role::One
    }
}

/// Peterson's lock: mutual exclusion for exactly two parties out of two intent
/// flags and a favoring variable.
///
/// Every access is `SeqCst`. The algorithm reads the other party's flag after
/// writing its own, which is a store-load pair that weaker orderings are free
/// to reorder.
#[derive(Default, Debug)]
pub struct TwoPartyLock {
    wants: [AtomicBool; 2],
    // false favors Role::Zero, true favors Role::One
    favored: AtomicBool,
}

impl TwoPartyLock {
    /// Creates a lock and the only two handles that may ever touch it.
    pub fn split() -> (Arc<TwoPartyLock>, Party, Party) {
        let lock = Arc::new(TwoPartyLock::default());
        let zero = Party {
            lock: lock.clone(),
            role: Role::Zero,
        };
        let one = Party {
            lock: lock.clone(),
            role: Role::One,
        };
        (lock, zero, one)
    }

    /// Whether `role` has declared intent, i.e. is spinning or inside.
    pub fn wants(&self, role: Role) -> bool {
        self.wants[role.index()].load(Ordering::SeqCst)
    }

    pub fn favored(&self) -> Role {
        if self.favored.load(Ordering::SeqCst) {
            Role::One
        } else {
            Role::Zero
        }
    }

    fn enter(&self, role: Role) {
        let other = role.other();
        self.wants[role.index()].store(true, Ordering::SeqCst);
        self.favored.store(other.favored_bit(), Ordering::SeqCst);
        while self.wants[other.index()].load(Ordering::SeqCst)
            && self.favored.load(Ordering::SeqCst) == other.favored_bit()
        {
            std::hint::spin_loop()
        }
    }

    fn exit(&self, role: Role) {
        self.wants[role.index()].store(false, Ordering::SeqCst)
    }
}

/// A [`TwoPartyLock`] seen through one fixed role. Not `Clone`, so each role
/// has exactly one owner for the lifetime of the lock.
#[derive(Debug)]
pub struct Party {
    lock: Arc<TwoPartyLock>,
    role: Role,
}

impl Party {
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn lock(&self) -> &TwoPartyLock {
        &self.lock
    }
}

impl Mutex for Party {
    fn acquire(&mut self) -> MutexGuard<'_, Self> {
        self.lock.enter(self.role);
        MutexGuard { mutex: self }
    }
    fn release(&mut self) {
        self.lock.exit(self.role)
    }
}
