//! Seating plan: which forks each philosopher touches, the role it plays on
//! each of them and the order it picks them up in.
//!
//! Fork `k` sits between philosopher `k` (for whom it is the left fork, role
//! [`Role::Zero`]) and philosopher `k - 1 mod n` (right fork, role
//! [`Role::One`]). Exactly one philosopher picks up its right fork first; the
//! waits-for graph then cannot close around the ring.

use crate::sync::peterson::Role;
use thiserror::Error;

/// Setup-time contract violations. None of these can occur once a plan exists.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("a ring needs at least 2 philosophers, got {n}")]
    TooFewPhilosophers { n: usize },

    #[error("exactly one philosopher must pick up its right fork first, found {count}")]
    ReversedCount { count: usize },

    #[error("seat {seat} is out of range for {n} philosophers")]
    SeatOutOfRange { seat: usize, n: usize },

    #[error("seat {seat} is listed at position {position}")]
    SeatMisplaced { seat: usize, position: usize },

    #[error("seat {seat} must hold fork {seat} on its left and the next fork on its right")]
    NotAdjacent { seat: usize },

    #[error("fork {fork} has {claims} claimants for role {role:?}, expected 1")]
    RoleClaims {
        fork: usize,
        role: Role,
        claims: usize,
    },
}

/// Pick-up order of a philosopher's two forks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    LeftFirst,
    /// The single philosopher that breaks the circular wait.
    RightFirst,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Seat {
    pub id: usize,
    pub left: usize,
    pub right: usize,
    pub left_role: Role,
    pub right_role: Role,
    pub order: Order,
}

impl Seat {
    pub fn new(id: usize, n: usize, order: Order) -> Self {
        Self {
            id,
            left: id,
            right: (id + 1) % n,
            left_role: Role::Zero,
            right_role: Role::One,
            order,
        }
    }

    pub fn is_reversed(&self) -> bool {
        self.order == Order::RightFirst
    }

    /// Forks in the order they are picked up. Release runs backwards.
    pub fn pickup(&self) -> [(usize, Role); 2] {
        let left = (self.left, self.left_role);
        let right = (self.right, self.right_role);
        match self.order {
            Order::LeftFirst => [left, right],
            Order::RightFirst => [right, left],
        }
    }
}

/// Immutable assignment table for a ring of philosophers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeatingPlan {
    seats: Vec<Seat>,
}

impl SeatingPlan {
    /// The conventional plan: philosopher 0 is the reversed one.
    pub fn ring(n: usize) -> Result<Self, ConfigError> {
        Self::with_reversed(n, &[0])
    }

    pub fn with_reversed(n: usize, reversed: &[usize]) -> Result<Self, ConfigError> {
        if n < 2 {
            return Err(ConfigError::TooFewPhilosophers { n });
        }
        if let Some(&seat) = reversed.iter().find(|&&seat| seat >= n) {
            return Err(ConfigError::SeatOutOfRange { seat, n });
        }
        let seats = (0..n)
            .map(|id| {
                let order = if reversed.contains(&id) {
                    Order::RightFirst
                } else {
                    Order::LeftFirst
                };
                Seat::new(id, n, order)
            })
            .collect();
        Self::from_seats(seats)
    }

    pub fn from_seats(seats: Vec<Seat>) -> Result<Self, ConfigError> {
        let plan = Self { seats };
        plan.validate()?;
        Ok(plan)
    }

    /// Checks the table independently of how it was built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let n = self.seats.len();
        if n < 2 {
            return Err(ConfigError::TooFewPhilosophers { n });
        }
        for (position, seat) in self.seats.iter().enumerate() {
            if seat.id >= n {
                return Err(ConfigError::SeatOutOfRange { seat: seat.id, n });
            }
            if seat.id != position {
                return Err(ConfigError::SeatMisplaced {
                    seat: seat.id,
                    position,
                });
            }
            if seat.left != seat.id || seat.right != (seat.id + 1) % n {
                return Err(ConfigError::NotAdjacent { seat: seat.id });
            }
        }

        let mut claims = vec![[0usize; 2]; n];
        for seat in &self.seats {
            claims[seat.left][seat.left_role.index()] += 1;
            claims[seat.right][seat.right_role.index()] += 1;
        }
        for (fork, per_role) in claims.iter().enumerate() {
            for role in [Role::Zero, Role::One] {
                let claims = per_role[role.index()];
                if claims != 1 {
                    return Err(ConfigError::RoleClaims { fork, role, claims });
                }
            }
        }

        let count = self.seats.iter().filter(|s| s.is_reversed()).count();
        if count != 1 {
            return Err(ConfigError::ReversedCount { count });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn reversed(&self) -> Option<usize> {
        self.seats.iter().find(|s| s.is_reversed()).map(|s| s.id)
    }
}

#[cfg(test)]
mod tests {
    use crate::dining::seating::{ConfigError, Order, Seat, SeatingPlan};
    use crate::sync::peterson::Role;

    #[test]
    fn ring_of_five() {
        let plan = SeatingPlan::ring(5).unwrap();
        assert_eq!(plan.len(), 5);
        assert_eq!(plan.reversed(), Some(0));

        let seats = plan.seats();
        assert_eq!(seats[0].pickup(), [(1, Role::One), (0, Role::Zero)]);
        assert_eq!(seats[1].pickup(), [(1, Role::Zero), (2, Role::One)]);
        assert_eq!(seats[4].pickup(), [(4, Role::Zero), (0, Role::One)]);
        assert!(seats[1..].iter().all(|s| s.order == Order::LeftFirst));
    }

    #[test]
    fn every_fork_has_one_party_per_role() {
        for n in 2..=9 {
            let plan = SeatingPlan::ring(n).unwrap();
            for fork in 0..n {
                let zero: Vec<_> = plan
                    .seats()
                    .iter()
                    .filter(|s| s.left == fork && s.left_role == Role::Zero)
                    .map(|s| s.id)
                    .collect();
                let one: Vec<_> = plan
                    .seats()
                    .iter()
                    .filter(|s| s.right == fork && s.right_role == Role::One)
                    .map(|s| s.id)
                    .collect();
                assert_eq!(zero, vec![fork]);
                assert_eq!(one, vec![(fork + n - 1) % n]);
            }
        }
    }

    #[test]
    fn two_philosophers_share_both_forks() {
        let plan = SeatingPlan::ring(2).unwrap();
        let seats = plan.seats();
        assert_eq!((seats[0].left, seats[0].right), (0, 1));
        assert_eq!((seats[1].left, seats[1].right), (1, 0));
        assert!(seats[0].is_reversed());
        assert!(!seats[1].is_reversed());
    }

    #[test]
    fn rejects_wrong_reversed_count() {
        assert_eq!(
            SeatingPlan::with_reversed(5, &[]),
            Err(ConfigError::ReversedCount { count: 0 })
        );
        assert_eq!(
            SeatingPlan::with_reversed(5, &[1, 3]),
            Err(ConfigError::ReversedCount { count: 2 })
        );
        assert_eq!(
            SeatingPlan::with_reversed(5, &[5]),
            Err(ConfigError::SeatOutOfRange { seat: 5, n: 5 })
        );
        assert_eq!(SeatingPlan::with_reversed(5, &[3]).unwrap().reversed(), Some(3));
    }

    #[test]
    fn rejects_too_few() {
        assert_eq!(
            SeatingPlan::ring(1),
            Err(ConfigError::TooFewPhilosophers { n: 1 })
        );
        assert_eq!(
            SeatingPlan::ring(0),
            Err(ConfigError::TooFewPhilosophers { n: 0 })
        );
    }

    #[test]
    fn rejects_broken_tables() {
        let good = || SeatingPlan::ring(4).unwrap().seats().to_vec();

        let mut seats = good();
        seats[2].left_role = Role::One;
        assert_eq!(
            SeatingPlan::from_seats(seats),
            Err(ConfigError::RoleClaims {
                fork: 2,
                role: Role::Zero,
                claims: 0
            })
        );

        let mut seats = good();
        seats[1].right = 3;
        assert_eq!(
            SeatingPlan::from_seats(seats),
            Err(ConfigError::NotAdjacent { seat: 1 })
        );

        let mut seats = good();
        seats.swap(1, 2);
        assert_eq!(
            SeatingPlan::from_seats(seats),
            Err(ConfigError::SeatMisplaced {
                seat: 2,
                position: 1
            })
        );

        let mut seats = good();
        seats[0] = Seat::new(0, 4, Order::LeftFirst);
        assert_eq!(
            SeatingPlan::from_seats(seats),
            Err(ConfigError::ReversedCount { count: 0 })
        );
    }
}
