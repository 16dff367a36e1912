//! Dining philosophers over a ring of Peterson locks.
//!
//! Every fork is guarded by a [`TwoPartyLock`](crate::sync::peterson::TwoPartyLock)
//! shared by its two neighbours, each with a fixed role. One philosopher picks
//! up its forks in the opposite order to everyone else, which rules out a
//! circular wait.
pub mod dinner;
pub mod philosopher;
pub mod seating;
pub mod table;
pub mod workload;

pub use dinner::{Dinner, Report, SeatReport};
pub use philosopher::{Phase, Philosopher};
pub use seating::{ConfigError, Order, Seat, SeatingPlan};
pub use table::{Fork, Ledger, StopSignal, Table};
pub use workload::{Idle, Pace, Workload};
