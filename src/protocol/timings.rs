//! Wall-clock measurements returned alongside round results.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyGenTimings {
    pub mkckks: Duration,
    pub ecdh: Duration,
    pub total: Duration,
}

/// Per-client cost of one round. `total` covers key generation as well as
/// share preparation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientTimings {
    pub keygen: KeyGenTimings,
    pub encrypt: Duration,
    pub mask_gen: Duration,
    pub total: Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerTimings {
    pub aggregate: Duration,
    pub decode: Duration,
    pub total: Duration,
}

/// Runs `f` and returns its output with the elapsed time.
pub(crate) fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let out = f();
    (out, start.elapsed())
}

pub fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1e3
}
