use super::{
    seating::{Order, Seat},
    table::{Ledger, StopSignal},
    workload::Workload,
};
use crate::sync::{peterson::Party, Mutex};
use std::sync::Arc;
use tracing::debug;

/// Where a philosopher is in its cycle.
///
/// `Thinking -> AcquiringFirst -> AcquiringSecond -> Eating -> Releasing ->
/// Thinking`, leaving for `Stopped` from `Thinking` once the stop signal is
/// seen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    Thinking = 0,
    AcquiringFirst = 1,
    AcquiringSecond = 2,
    Eating = 3,
    Releasing = 4,
    Stopped = 5,
}

impl Phase {
    pub(crate) fn from_u8(v: u8) -> Phase {
        match v {
            0 => Phase::Thinking,
            1 => Phase::AcquiringFirst,
            2 => Phase::AcquiringSecond,
            3 => Phase::Eating,
            4 => Phase::Releasing,
            _ => Phase::Stopped,
        }
    }
}

/// One actor in the ring. Owns the handles to its two forks and nothing else.
#[derive(Debug)]
pub struct Philosopher {
    seat: Seat,
    left: Party,
    right: Party,
    ledger: Arc<Ledger>,
}

impl Philosopher {
    pub(crate) fn new(seat: Seat, left: Party, right: Party, ledger: Arc<Ledger>) -> Self {
        Self {
            seat,
            left,
            right,
            ledger,
        }
    }

    pub fn seat(&self) -> &Seat {
        &self.seat
    }

    pub fn id(&self) -> usize {
        self.seat.id
    }

    /// Cycles until `stop` is raised, returning the number of meals eaten.
    ///
    /// The signal is only checked between cycles, so a cycle in flight when
    /// it is raised still completes.
    pub fn run<W: Workload + ?Sized>(&mut self, workload: &W, stop: &StopSignal) -> u64 {
        let mut meals = 0;
        loop {
            self.enter(Phase::Thinking);
            if stop.is_raised() {
                break;
            }
            workload.think(self.seat.id);
            self.dine(workload);
            meals += 1;
        }
        self.enter(Phase::Stopped);
        meals
    }

    fn dine<W: Workload + ?Sized>(&mut self, workload: &W) {
        let seat = self.seat;
        let ledger = &self.ledger;
        let (first, second) = match seat.order {
            Order::LeftFirst => (&mut self.left, &mut self.right),
            Order::RightFirst => (&mut self.right, &mut self.left),
        };
        let [(first_fork, _), (second_fork, _)] = seat.pickup();

        ledger.set_phase(seat.id, Phase::AcquiringFirst);
        debug!(seat = seat.id, fork = first_fork, "picking up first fork");
        let first = first.acquire();

        ledger.set_phase(seat.id, Phase::AcquiringSecond);
        debug!(seat = seat.id, fork = second_fork, "picking up second fork");
        let second = second.acquire();

        ledger.set_phase(seat.id, Phase::Eating);
        debug!(seat = seat.id, first_fork, second_fork, "eating");
        workload.eat(seat.id);
        // Only ever written here, while both forks are held
        let total = ledger.record_meal(seat.id);

        ledger.set_phase(seat.id, Phase::Releasing);
        debug!(seat = seat.id, meals = total, "done eating");
        drop(second);
        drop(first);
    }

    fn enter(&self, phase: Phase) {
        self.ledger.set_phase(self.seat.id, phase);
        debug!(seat = self.seat.id, ?phase);
    }
}

#[cfg(test)]
mod tests {
    use crate::dining::{
        philosopher::Phase,
        seating::{Seat, SeatingPlan},
        table::{Ledger, StopSignal, Table},
        workload::{Idle, Workload},
    };
    use crate::sync::peterson::TwoPartyLock;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };

    #[test]
    fn phase_round_trips_through_u8() {
        for phase in [
            Phase::Thinking,
            Phase::AcquiringFirst,
            Phase::AcquiringSecond,
            Phase::Eating,
            Phase::Releasing,
            Phase::Stopped,
        ] {
            assert_eq!(Phase::from_u8(phase as u8), phase);
        }
    }

    #[test]
    fn stops_before_first_cycle() {
        let mut table = Table::new(SeatingPlan::ring(3).unwrap()).unwrap();
        let stop = table.stop_signal().clone();
        stop.raise();
        let mut philosophers = table.take_philosophers();
        assert_eq!(philosophers[1].run(&Idle, &stop), 0);
        assert_eq!(table.ledger().phases()[1], Phase::Stopped);
        assert_eq!(table.ledger().meals(), vec![0, 0, 0]);
    }

    /// Raises the stop signal after `limit` meals and checks, from inside the
    /// protected section, that both forks are claimed by this seat.
    struct Probe {
        limit: usize,
        eaten: AtomicUsize,
        stop: StopSignal,
        seat: Seat,
        locks: Vec<Arc<TwoPartyLock>>,
        held: Mutex<Vec<(bool, bool)>>,
        ledger: Arc<Ledger>,
    }

    impl Workload for Probe {
        fn think(&self, seat: usize) {
            assert_eq!(self.ledger.phases()[seat], Phase::Thinking);
        }
        fn eat(&self, seat: usize) {
            assert_eq!(seat, self.seat.id);
            assert_eq!(self.ledger.phases()[seat], Phase::Eating);
            self.held.lock().unwrap().push((
                self.locks[self.seat.left].wants(self.seat.left_role),
                self.locks[self.seat.right].wants(self.seat.right_role),
            ));
            if self.eaten.fetch_add(1, Ordering::SeqCst) + 1 >= self.limit {
                self.stop.raise();
            }
        }
    }

    #[test]
    fn single_philosopher_counts_meals() {
        let mut table = Table::new(SeatingPlan::ring(4).unwrap()).unwrap();
        let stop = table.stop_signal().clone();
        let mut philosophers = table.take_philosophers();
        let probe = Probe {
            limit: 7,
            eaten: AtomicUsize::new(0),
            stop: stop.clone(),
            seat: *philosophers[0].seat(),
            locks: table.forks().iter().map(|f| f.lock().clone()).collect(),
            held: Mutex::new(Vec::new()),
            ledger: table.ledger().clone(),
        };

        // Neighbours never run, so the forks are always free
        assert_eq!(philosophers[0].run(&probe, &stop), 7);
        assert_eq!(table.ledger().meals(), vec![7, 0, 0, 0]);
        assert_eq!(table.ledger().phases()[0], Phase::Stopped);
        assert_eq!(*probe.held.lock().unwrap(), vec![(true, true); 7]);

        // Both forks are released afterwards
        assert!(table.forks().iter().all(|fork| !fork.in_use()));
    }
}
