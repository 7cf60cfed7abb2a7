use std::cell::Cell;

thread_local! {
    static STATS: Cell<EngineStats> = const { Cell::new(EngineStats::ZERO) };
}

/// Per-thread engine counters. Cheap to read; used by tests and devtools.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Writes that changed a value (and therefore notified).
    pub writes: u64,
    /// Writes dropped because the candidate equalled the current value.
    pub suppressed_writes: u64,
    /// Individual subscriber invocations.
    pub notifications: u64,
    /// Derivation invocations after setup.
    pub recomputes: u64,
    /// Dependency discovery episodes (construction and rewire).
    pub setups: u64,
    /// Subscriptions skipped or removed because another dependency covers them.
    pub prunes: u64,
}

impl EngineStats {
    const ZERO: Self = Self {
        writes: 0,
        suppressed_writes: 0,
        notifications: 0,
        recomputes: 0,
        setups: 0,
        prunes: 0,
    };
}

pub(crate) fn bump(f: impl FnOnce(&mut EngineStats)) {
    STATS.with(|s| {
        let mut v = s.get();
        f(&mut v);
        s.set(v);
    });
}

pub fn stats() -> EngineStats {
    STATS.with(Cell::get)
}

pub fn reset_stats() {
    STATS.with(|s| s.set(EngineStats::ZERO));
}
