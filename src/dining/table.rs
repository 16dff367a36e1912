use super::{
    philosopher::{Phase, Philosopher},
    seating::{ConfigError, SeatingPlan},
};
use crate::sync::peterson::{Party, Role, TwoPartyLock};
use std::sync::{
    atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering},
    Arc,
};

/// Cooperative cancellation: raised once by the controller, polled by every
/// philosopher between cycles.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    /// Returns whether this call was the one that raised it.
    pub fn raise(&self) -> bool {
        !self.0.swap(true, Ordering::Release)
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Per-seat meal counters and current phases, readable by anyone at any time.
///
/// Slot `i` is only written by philosopher `i`; readers get a point-in-time
/// snapshot with no consistency across seats.
#[derive(Debug)]
pub struct Ledger {
    meals: Box<[AtomicU64]>,
    phases: Box<[AtomicU8]>,
}

impl Ledger {
    pub fn new(n: usize) -> Self {
        Self {
            meals: (0..n).map(|_| AtomicU64::new(0)).collect(),
            phases: (0..n)
                .map(|_| AtomicU8::new(Phase::Thinking as u8))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.meals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meals.is_empty()
    }

    pub fn meals(&self) -> Vec<u64> {
        self.meals.iter().map(|m| m.load(Ordering::Relaxed)).collect()
    }

    pub fn phases(&self) -> Vec<Phase> {
        self.phases
            .iter()
            .map(|p| Phase::from_u8(p.load(Ordering::Relaxed)))
            .collect()
    }

    // Single writer per slot, so no read-modify-write is needed
    pub(crate) fn record_meal(&self, seat: usize) -> u64 {
        let meals = self.meals[seat].load(Ordering::Relaxed) + 1;
        self.meals[seat].store(meals, Ordering::Relaxed);
        meals
    }

    pub(crate) fn set_phase(&self, seat: usize, phase: Phase) {
        self.phases[seat].store(phase as u8, Ordering::Relaxed)
    }
}

/// A resource shared by exactly two neighbouring philosophers.
#[derive(Debug)]
pub struct Fork {
    id: usize,
    lock: Arc<TwoPartyLock>,
}

impl Fork {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn lock(&self) -> &Arc<TwoPartyLock> {
        &self.lock
    }

    /// Either neighbour is holding it or waiting for it.
    pub fn in_use(&self) -> bool {
        self.lock.wants(Role::Zero) || self.lock.wants(Role::One)
    }
}

/// Owns the forks, the philosophers and the state they share.
#[derive(Debug)]
pub struct Table {
    plan: SeatingPlan,
    forks: Vec<Fork>,
    philosophers: Vec<Philosopher>,
    ledger: Arc<Ledger>,
    stop: StopSignal,
}

impl Table {
    /// Lays one fork per seat and hands each philosopher the two parties the
    /// plan assigns it.
    pub fn new(plan: SeatingPlan) -> Result<Self, ConfigError> {
        plan.validate()?;
        let n = plan.len();
        let ledger = Arc::new(Ledger::new(n));

        let mut forks = Vec::with_capacity(n);
        let mut parties: Vec<[Option<Party>; 2]> = Vec::with_capacity(n);
        for id in 0..n {
            let (lock, zero, one) = TwoPartyLock::split();
            forks.push(Fork { id, lock });
            parties.push([Some(zero), Some(one)]);
        }

        let mut take = |fork: usize, role: Role| {
            parties[fork][role.index()]
                .take()
                .ok_or(ConfigError::RoleClaims {
                    fork,
                    role,
                    claims: 2,
                })
        };
        let mut philosophers = Vec::with_capacity(n);
        for seat in plan.seats() {
            let left = take(seat.left, seat.left_role)?;
            let right = take(seat.right, seat.right_role)?;
            philosophers.push(Philosopher::new(*seat, left, right, ledger.clone()));
        }

        Ok(Self {
            plan,
            forks,
            philosophers,
            ledger,
            stop: StopSignal::default(),
        })
    }

    pub fn plan(&self) -> &SeatingPlan {
        &self.plan
    }

    pub fn forks(&self) -> &[Fork] {
        &self.forks
    }

    pub fn philosophers(&self) -> &[Philosopher] {
        &self.philosophers
    }

    /// Moves the philosophers out, e.g. onto their own threads.
    pub fn take_philosophers(&mut self) -> Vec<Philosopher> {
        std::mem::take(&mut self.philosophers)
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    pub fn stop(&self) -> bool {
        self.stop.raise()
    }

    pub fn meals(&self) -> Vec<u64> {
        self.ledger.meals()
    }
}
