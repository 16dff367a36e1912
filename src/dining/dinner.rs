//! Runs a [`Table`] with one OS thread per philosopher.

use super::{
    philosopher::Phase,
    table::{Fork, Ledger, StopSignal, Table},
    workload::Workload,
};
use anyhow::{bail, Context, Result};
use std::{
    fmt,
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};
use tracing::{info, warn};

/// Ratio of most to least meals under which a run counts as evenly shared.
/// Empirical, not something the algorithm guarantees.
pub const EQUITABLE_RATIO: f64 = 2.0;

const JOIN_POLL: Duration = Duration::from_millis(5);

/// A dinner in progress.
#[derive(Debug)]
pub struct Dinner {
    table: Table,
    ledger: Arc<Ledger>,
    stop: StopSignal,
    handles: Vec<JoinHandle<u64>>,
    started: Instant,
}

impl Dinner {
    pub fn start<W: Workload + 'static>(mut table: Table, workload: Arc<W>) -> Result<Self> {
        let stop = table.stop_signal().clone();
        let philosophers = table.take_philosophers();
        let started = Instant::now();
        info!(
            philosophers = philosophers.len(),
            reversed = ?table.plan().reversed(),
            "dinner starts"
        );

        let mut handles = Vec::with_capacity(philosophers.len());
        for mut philosopher in philosophers {
            let id = philosopher.id();
            let workload = workload.clone();
            let signal = stop.clone();
            let handle = thread::Builder::new()
                .name(format!("philosopher-{id}"))
                .spawn(move || philosopher.run(&*workload, &signal))
                .with_context(|| format!("spawning philosopher {id}"));
            match handle {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Don't leave the ones already seated spinning forever
                    stop.raise();
                    return Err(e);
                }
            }
        }

        Ok(Self {
            ledger: table.ledger().clone(),
            table,
            stop,
            handles,
            started,
        })
    }

    pub fn meals(&self) -> Vec<u64> {
        self.ledger.meals()
    }

    pub fn phases(&self) -> Vec<Phase> {
        self.ledger.phases()
    }

    pub fn forks(&self) -> &[Fork] {
        self.table.forks()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Polls the meal counters until `done` holds or `timeout` passes.
    pub fn wait_for<F: Fn(&[u64]) -> bool>(&self, timeout: Duration, done: F) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if done(&self.meals()) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(JOIN_POLL);
        }
    }

    /// The signal every philosopher polls, e.g. for an interrupt handler.
    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    /// Sleeps until `duration` has passed since the start or the stop signal
    /// is raised, whichever comes first. Returns whether the time ran out.
    pub fn run_for(&self, duration: Duration) -> bool {
        let deadline = self.started + duration;
        loop {
            if self.stop.is_raised() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep(JOIN_POLL.min(deadline - now));
        }
    }

    pub fn stop(&self) {
        if self.stop.raise() {
            info!(elapsed = ?self.elapsed(), "stop signal raised");
        }
    }

    /// Stops the dinner and waits up to `timeout` for every philosopher to
    /// finish its current cycle. A philosopher still running after that is
    /// treated as stuck.
    pub fn finish(self, timeout: Duration) -> Result<Report> {
        self.stop();
        let deadline = Instant::now() + timeout;
        while self.handles.iter().any(|h| !h.is_finished()) && Instant::now() < deadline {
            thread::sleep(JOIN_POLL);
        }

        let stalled: Vec<usize> = self
            .handles
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.is_finished())
            .map(|(i, _)| i)
            .collect();
        if !stalled.is_empty() {
            let phases = self.phases();
            for &seat in &stalled {
                warn!(seat, phase = ?phases[seat], "philosopher did not stop");
            }
            bail!("philosophers {stalled:?} did not stop within {timeout:?}");
        }

        let mut returned = Vec::with_capacity(self.handles.len());
        for (seat, handle) in self.handles.into_iter().enumerate() {
            match handle.join() {
                Ok(meals) => returned.push(meals),
                Err(_) => bail!("philosopher {seat} panicked"),
            }
        }
        let meals = self.ledger.meals();
        debug_assert_eq!(returned, meals);

        let report = Report {
            seats: self
                .table
                .plan()
                .seats()
                .iter()
                .zip(&meals)
                .map(|(seat, &meals)| SeatReport {
                    seat: seat.id,
                    reversed: seat.is_reversed(),
                    meals,
                })
                .collect(),
            elapsed: self.started.elapsed(),
        };
        info!(
            total = report.total(),
            elapsed = ?report.elapsed,
            "dinner finished without deadlock"
        );
        Ok(report)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeatReport {
    pub seat: usize,
    pub reversed: bool,
    pub meals: u64,
}

/// End-of-run statistics.
#[derive(Clone, Debug)]
pub struct Report {
    pub seats: Vec<SeatReport>,
    pub elapsed: Duration,
}

impl Report {
    pub fn meals(&self) -> Vec<u64> {
        self.seats.iter().map(|s| s.meals).collect()
    }

    pub fn total(&self) -> u64 {
        self.seats.iter().map(|s| s.meals).sum()
    }

    pub fn max(&self) -> u64 {
        self.seats.iter().map(|s| s.meals).max().unwrap_or(0)
    }

    pub fn min(&self) -> u64 {
        self.seats.iter().map(|s| s.meals).min().unwrap_or(0)
    }

    pub fn mean(&self) -> f64 {
        if self.seats.is_empty() {
            return 0.0;
        }
        self.total() as f64 / self.seats.len() as f64
    }

    /// Most over fewest meals, `None` if someone never ate.
    pub fn ratio(&self) -> Option<f64> {
        match self.min() {
            0 => None,
            min => Some(self.max() as f64 / min as f64),
        }
    }

    pub fn is_equitable(&self) -> bool {
        self.ratio().is_some_and(|r| r < EQUITABLE_RATIO)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const BAR: u64 = 30;
        let max = self.max().max(1);
        for s in &self.seats {
            let kind = if s.reversed { "reversed" } else { "standard" };
            let bar = "#".repeat((s.meals * BAR / max) as usize);
            writeln!(
                f,
                "  philosopher {} ({kind:>8}): {:4} meals  {bar}",
                s.seat, s.meals
            )?;
        }
        writeln!(f)?;
        writeln!(f, "  total meals:   {}", self.total())?;
        writeln!(f, "  elapsed:       {:.2}s", self.elapsed.as_secs_f64())?;
        writeln!(f, "  mean per seat: {:.1}", self.mean())?;
        writeln!(f, "  max:           {}", self.max())?;
        writeln!(f, "  min:           {}", self.min())?;
        match self.ratio() {
            Some(ratio) => {
                let verdict = if self.is_equitable() {
                    "equitable"
                } else {
                    "unbalanced"
                };
                writeln!(f, "  max/min ratio: {ratio:.2} ({verdict})")
            }
            None => writeln!(f, "  max/min ratio: n/a (someone never ate)"),
        }
    }
}
