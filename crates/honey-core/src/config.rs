//! # Engine configuration
//!
//! Engine parameters live in a thread‑local override stack, the same way
//! composition locals do in a UI runtime. Code that needs a different limit
//! for a region wraps it in `with_config`:
//!
//! ```rust
//! use honey_core::*;
//!
//! let strict = EngineConfig {
//!     max_cascade_depth: 16,
//!     ..EngineConfig::default()
//! };
//!
//! with_config(strict, || {
//!     assert_eq!(config().max_cascade_depth, 16);
//! });
//! assert_eq!(config().max_cascade_depth, EngineConfig::default().max_cascade_depth);
//! ```

use std::cell::RefCell;

thread_local! {
    static CONFIG_STACK: RefCell<Vec<EngineConfig>> = const { RefCell::new(Vec::new()) };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Deepest nesting of notification deliveries before a cascade is aborted
    /// as stack exhaustion. Cycles are detected separately.
    pub max_cascade_depth: usize,
    /// Emit a `debug!` line for every subscription removed by pruning.
    pub log_pruning: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_cascade_depth: 1024,
            log_pruning: false,
        }
    }
}

/// Runs `f` with `cfg` as the innermost configuration.
pub fn with_config<R>(cfg: EngineConfig, f: impl FnOnce() -> R) -> R {
    // pops on unwind too
    struct Guard;
    impl Drop for Guard {
        fn drop(&mut self) {
            CONFIG_STACK.with(|st| {
                st.borrow_mut().pop();
            });
        }
    }
    CONFIG_STACK.with(|st| st.borrow_mut().push(cfg));
    let _guard = Guard;
    f()
}

/// Innermost configuration, or the default when none is installed.
pub fn config() -> EngineConfig {
    CONFIG_STACK.with(|st| st.borrow().last().copied().unwrap_or_default())
}
