use rand::Rng;
use std::time::Duration;

/// The unsynchronized (`think`) and protected (`eat`) work a philosopher does
/// each cycle. Has no bearing on correctness.
pub trait Workload: Send + Sync {
    fn think(&self, seat: usize);
    fn eat(&self, seat: usize);
}

/// No work at all, so the forks are contended as hard as possible.
#[derive(Clone, Copy, Debug, Default)]
pub struct Idle;

impl Workload for Idle {
    fn think(&self, _seat: usize) {}
    fn eat(&self, _seat: usize) {}
}

/// Sleeps for nominal durations.
///
/// Thinking is skewed per seat (`0.5`, `0.75` or `1.0` times `think`,
/// repeating every three seats) so neighbours fall out of lock-step, and every
/// sleep is scaled by a uniform factor in `[1 - jitter, 1 + jitter]`.
#[derive(Clone, Copy, Debug)]
pub struct Pace {
    pub think: Duration,
    pub eat: Duration,
    pub jitter: f64,
}

impl Default for Pace {
    fn default() -> Self {
        Self {
            think: Duration::from_millis(300),
            eat: Duration::from_millis(300),
            jitter: 0.0,
        }
    }
}

impl Pace {
    pub fn new(think: Duration, eat: Duration) -> Self {
        Self {
            think,
            eat,
            jitter: 0.0,
        }
    }

    /// Out-of-range jitter is clamped into `[0, 0.99]`; NaN means none.
    pub fn with_jitter(self, jitter: f64) -> Self {
        let jitter = if jitter.is_nan() {
            0.0
        } else {
            jitter.clamp(0.0, 0.99)
        };
        Self { jitter, ..self }
    }

    pub fn think_time(&self, seat: usize) -> Duration {
        self.think.mul_f64(0.5 + (seat % 3) as f64 * 0.25)
    }

    fn jittered(&self, d: Duration) -> Duration {
        if self.jitter <= 0.0 {
            return d;
        }
        let factor = rand::thread_rng().gen_range(1.0 - self.jitter..=1.0 + self.jitter);
        d.mul_f64(factor)
    }
}

impl Workload for Pace {
    fn think(&self, seat: usize) {
        std::thread::sleep(self.jittered(self.think_time(seat)))
    }
    fn eat(&self, _seat: usize) {
        std::thread::sleep(self.jittered(self.eat))
    }
}
